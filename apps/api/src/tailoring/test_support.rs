//! Fixtures shared by the tailoring, LLM client, and route tests.

use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::config::{default_extensions, Config};
use crate::llm_client::{AiError, TextGenerator};

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// A URL on a local port that nothing is listening on.
pub async fn unused_local_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

/// Minimal `.docx` archive with one `w:p` per entry.
pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            format!(
                r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
                quick_xml::escape::escape(*p)
            )
        })
        .collect();
    docx_from_document_xml(&format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    ))
}

pub fn docx_from_document_xml(xml: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", FileOptions::default())
        .unwrap();
    writer.write_all(xml.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

pub fn test_config(storage_root: &Path) -> Config {
    Config {
        ai_credential: Some("test-key".to_string()),
        ai_model: "gemini-test".to_string(),
        ai_base_url: "http://127.0.0.1:9".to_string(),
        ai_service_timeout_ms: 2_000,
        fetch_timeout_ms: 2_000,
        fetch_max_bytes: 64 * 1024,
        storage_root: storage_root.to_path_buf(),
        upload_size_limit_bytes: 1024 * 1024,
        accepted_extensions: default_extensions(),
        port: 0,
        rust_log: "debug".to_string(),
    }
}

/// Number of regular files directly under `dir`.
pub fn stored_file_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

/// What a `StubGenerator` does when invoked.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    Reply(String),
    Fail(AiError),
    /// Sleeps before replying, for cancellation tests.
    Stall(Duration),
}

/// Scripted `TextGenerator` that records the prompts it receives.
#[derive(Debug)]
pub struct StubGenerator {
    behavior: StubBehavior,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubGenerator {
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(StubBehavior::Reply(text.to_string()))
    }

    pub fn failing(error: AiError) -> Self {
        Self::new(StubBehavior::Fail(error))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn invoke(&self, prompt: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        match &self.behavior {
            StubBehavior::Reply(text) => Ok(text.clone()),
            StubBehavior::Fail(error) => Err(error.clone()),
            StubBehavior::Stall(delay) => {
                tokio::time::sleep(*delay).await;
                Ok("too late".to_string())
            }
        }
    }
}
