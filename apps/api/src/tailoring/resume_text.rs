//! Plain-text extraction from `.docx` resumes.
//!
//! A `.docx` file is a zip archive; the body lives in `word/document.xml`.
//! Each `w:p` paragraph becomes one line. Inside runs, `w:tab` becomes a tab
//! and `w:br`/`w:cr` become line breaks. Formatting is discarded.
//!
//! Text-box paragraphs nested in a run are emitted as their own lines, ahead of
//! the paragraph that anchors them. `mc:Fallback` copies are skipped.

use std::io::{Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{error, info};
use zip::ZipArchive;

use crate::tailoring::job_description::ExtractionError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads the stored upload and extracts its text on a blocking worker.
/// The file handle is closed before parsing starts.
pub async fn extract_resume_text(path: &Path) -> Result<String, ExtractionError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        error!("Error reading docx file {}: {e}", path.display());
        ExtractionError::UnreadableResume {
            reason: format!("could not read stored file: {e}"),
        }
    })?;

    let text = tokio::task::spawn_blocking(move || extract_docx_text(&bytes))
        .await
        .map_err(|e| ExtractionError::UnreadableResume {
            reason: format!("extraction task failed: {e}"),
        })??;

    info!(
        "Successfully extracted {} characters from {}",
        text.chars().count(),
        path.display()
    );
    Ok(text)
}

/// Extracts paragraph text from in-memory `.docx` bytes.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| unreadable(format!("not a docx archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| unreadable(format!("missing {DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| unreadable(format!("unreadable {DOCUMENT_PART}: {e}")))?;

    let text = document_xml_to_text(&xml)?;
    if text.trim().is_empty() {
        return Err(ExtractionError::EmptyResume);
    }
    Ok(text)
}

fn unreadable(reason: String) -> ExtractionError {
    ExtractionError::UnreadableResume { reason }
}

/// Text of one open `w:p`. Paragraphs nest when a run holds a text box.
#[derive(Default)]
struct ParagraphFrame {
    text: String,
    run_depth: usize,
}

impl ParagraphFrame {
    fn in_run(&self) -> bool {
        self.run_depth > 0
    }
}

fn document_xml_to_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    let mut open: Vec<ParagraphFrame> = Vec::new();
    let mut in_text = false;
    // Depth inside `mc:Fallback`, which repeats the `mc:Choice` content.
    let mut skip_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| {
            unreadable(format!(
                "malformed document XML at position {}: {e}",
                reader.buffer_position()
            ))
        })?;

        if skip_depth > 0 {
            match event {
                Event::Start(_) => skip_depth += 1,
                Event::End(_) => skip_depth -= 1,
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"mc:Fallback" => skip_depth = 1,
                b"w:p" => open.push(ParagraphFrame::default()),
                b"w:r" => {
                    if let Some(frame) = open.last_mut() {
                        frame.run_depth += 1;
                    }
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                let frame = open.last_mut();
                match e.name().as_ref() {
                    b"w:p" => paragraphs.push(String::new()),
                    // `w:tab` also appears as a tab-stop definition in paragraph properties.
                    b"w:tab" => {
                        if let Some(frame) = frame.filter(|f| f.in_run()) {
                            frame.text.push('\t');
                        }
                    }
                    b"w:br" | b"w:cr" => {
                        if let Some(frame) = frame.filter(|f| f.in_run()) {
                            frame.text.push('\n');
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(t) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| unreadable(format!("malformed text node: {e}")))?;
                if let Some(frame) = open.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => {
                    if let Some(frame) = open.last_mut() {
                        frame.run_depth = frame.run_depth.saturating_sub(1);
                    }
                }
                b"w:p" => {
                    if let Some(frame) = open.pop() {
                        paragraphs.push(frame.text);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::tailoring::test_support::{docx_bytes, docx_from_document_xml};

    #[test]
    fn test_paragraphs_become_lines() {
        let bytes = docx_bytes(&["Jane Doe", "Data Engineer", "SQL & Python"]);
        let text = extract_docx_text(&bytes).unwrap();
        assert_eq!(text, "Jane Doe\nData Engineer\nSQL & Python");
    }

    #[test]
    fn test_runs_tabs_and_breaks() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body>
            <w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
              <w:r><w:t>Skills:</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve">Rust, </w:t></w:r><w:r><w:t>Go</w:t></w:r>
            </w:p>
            <w:p/>
            <w:p><w:r><w:t>Line one</w:t><w:br/><w:t>Line two</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_docx_text(&docx_from_document_xml(xml)).unwrap();
        assert_eq!(text, "Skills:\tRust, Go\n\nLine one\nLine two");
    }

    #[test]
    fn test_text_box_keeps_anchoring_paragraph() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body>
            <w:p>
              <w:r><w:t>Jane Doe</w:t></w:r>
              <w:r><w:pict><w:txbxContent>
                <w:p><w:r><w:t>Contact box</w:t></w:r></w:p>
              </w:txbxContent></w:pict></w:r>
              <w:r><w:tab/><w:t xml:space="preserve"> - Data Analyst</w:t></w:r>
            </w:p>
        </w:body></w:document>"#;
        let text = extract_docx_text(&docx_from_document_xml(xml)).unwrap();
        assert_eq!(text, "Contact box\nJane Doe\t - Data Analyst");
    }

    #[test]
    fn test_alternate_content_text_box_extracted_once() {
        let xml = r#"<w:document xmlns:w="urn:w" xmlns:mc="urn:mc"><w:body>
            <w:p>
              <w:r><w:t>Jane Doe</w:t></w:r>
              <w:r><mc:AlternateContent>
                <mc:Choice Requires="wps"><w:drawing><w:txbxContent>
                  <w:p><w:r><w:t>jane@example.com</w:t></w:r></w:p>
                </w:txbxContent></w:drawing></mc:Choice>
                <mc:Fallback><w:pict><w:txbxContent>
                  <w:p><w:r><w:t>jane@example.com</w:t></w:r></w:p>
                </w:txbxContent></w:pict></mc:Fallback>
              </mc:AlternateContent></w:r>
            </w:p>
            <w:p><w:r><w:t>SQL, Excel</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_docx_text(&docx_from_document_xml(xml)).unwrap();
        assert_eq!(text, "jane@example.com\nJane Doe\nSQL, Excel");
        assert_eq!(text.matches("jane@example.com").count(), 1);
    }

    #[test]
    fn test_whitespace_only_document_is_empty_resume() {
        let err = extract_docx_text(&docx_bytes(&["   ", ""])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResume);
    }

    #[test]
    fn test_non_zip_bytes_are_unreadable() {
        let err = extract_docx_text(b"%PDF-1.7 definitely not a docx").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnreadableResume);
    }

    #[test]
    fn test_archive_without_document_part_is_unreadable() {
        use std::io::Write;
        use zip::write::FileOptions;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/styles.xml", FileOptions::default())
            .unwrap();
        writer.write_all(b"<w:styles/>").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = extract_docx_text(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnreadableResume);
    }

    #[tokio::test]
    async fn test_extract_from_stored_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("resume.docx");
        std::fs::write(&path, docx_bytes(&["Jane Doe"])).unwrap();

        assert_eq!(extract_resume_text(&path).await.unwrap(), "Jane Doe");
    }

    #[tokio::test]
    async fn test_extract_from_missing_file_is_unreadable() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = extract_resume_text(&dir.path().join("gone.docx"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnreadableResume);
    }
}
