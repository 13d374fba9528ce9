//! Filename handling for uploaded documents.
//!
//! The declared name of an upload is client-controlled and never used for
//! path construction directly: only a sanitized leaf is joined to the storage root.

const MAX_LEAF_LEN: usize = 100;
const FALLBACK_LEAF: &str = "upload";

/// Reduces a client-declared filename to a safe single path component.
///
/// Directory parts (either separator style) are discarded, whitespace becomes `_`,
/// and anything outside `[A-Za-z0-9._-]` is dropped. Leading dots and underscores
/// are stripped so the result can never be `.`/`..` or a hidden file.
pub fn sanitize_leaf(declared_name: &str) -> String {
    let last_component = declared_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let mut leaf: String = last_component
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() => Some(c),
            '.' | '-' | '_' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    while leaf.contains("..") {
        leaf = leaf.replace("..", ".");
    }

    // Every surviving char is ASCII, so byte offsets are char boundaries.
    if leaf.len() > MAX_LEAF_LEN {
        leaf = leaf.split_off(leaf.len() - MAX_LEAF_LEN);
    }
    let leaf = leaf.trim_start_matches(['.', '_']).to_string();

    if leaf.is_empty() {
        FALLBACK_LEAF.to_string()
    } else {
        leaf
    }
}

/// Lower-cased extension of a declared filename, if it has one.
/// `"Resume.DOCX"` → `Some("docx")`, `"resume"` → `None`, `"resume."` → `None`.
/// Surrounding whitespace is kept, so `"resume.docx "` yields `"docx "`.
pub fn extension_of(declared_name: &str) -> Option<String> {
    let (_, ext) = declared_name.rsplit_once('.')?;
    if ext.is_empty() || ext.contains(['/', '\\']) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_plain_names() {
        assert_eq!(sanitize_leaf("resume.docx"), "resume.docx");
        assert_eq!(sanitize_leaf("My-CV_2024.docx"), "My-CV_2024.docx");
    }

    #[test]
    fn test_sanitize_strips_unix_traversal() {
        let leaf = sanitize_leaf("../../etc/passwd");
        assert_eq!(leaf, "passwd");
    }

    #[test]
    fn test_sanitize_strips_windows_traversal() {
        let leaf = sanitize_leaf("..\\..\\windows\\system32\\evil.docx");
        assert_eq!(leaf, "evil.docx");
    }

    #[test]
    fn test_sanitize_never_returns_dot_components() {
        for name in ["..", ".", "...", "/..", "./.docx"] {
            let leaf = sanitize_leaf(name);
            assert_ne!(leaf, "..");
            assert_ne!(leaf, ".");
            assert!(!leaf.starts_with('.'), "{name} -> {leaf}");
            assert!(!leaf.contains('/'));
        }
    }

    #[test]
    fn test_sanitize_replaces_whitespace_and_drops_symbols() {
        assert_eq!(sanitize_leaf("my resume (final)!.docx"), "my_resume_final.docx");
    }

    #[test]
    fn test_sanitize_falls_back_when_nothing_survives() {
        assert_eq!(sanitize_leaf("???"), "upload");
        assert_eq!(sanitize_leaf(""), "upload");
    }

    #[test]
    fn test_sanitize_truncates_long_names_keeping_extension() {
        let long = format!("{}.docx", "a".repeat(300));
        let leaf = sanitize_leaf(&long);
        assert_eq!(leaf.len(), 100);
        assert!(leaf.ends_with(".docx"));
    }

    #[test]
    fn test_extension_of_lowercases() {
        assert_eq!(extension_of("Resume.DOCX").as_deref(), Some("docx"));
        assert_eq!(extension_of("archive.tar.gz").as_deref(), Some("gz"));
    }

    #[test]
    fn test_extension_of_keeps_whitespace() {
        assert_eq!(extension_of("resume. docx").as_deref(), Some(" docx"));
        assert_eq!(extension_of("resume.docx ").as_deref(), Some("docx "));
    }

    #[test]
    fn test_extension_of_missing() {
        assert_eq!(extension_of("resume"), None);
        assert_eq!(extension_of("resume."), None);
    }
}
