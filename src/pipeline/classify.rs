//! Input classification: decide how a command-line target is converted.
//!
//! The rule is fixed and side-effect free: a scheme prefix makes a URL;
//! otherwise the path must exist and its extension (case-insensitive) selects
//! the office or PDF route.

use crate::error::LmpError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Extensions converted to PDF by the office suite before rendering.
pub const OFFICE_EXTENSIONS: &[&str] = &["ppt", "pptx", "doc", "docx", "xls", "xlsx"];

/// A classified target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// An `http://` or `https://` URL, handled by the web extractor.
    Url(String),
    /// A presentation, word-processing or spreadsheet document.
    Office(PathBuf),
    /// A PDF, rendered directly.
    Pdf(PathBuf),
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Classify a target string.
///
/// # Errors
/// - [`LmpError::FileNotFound`] when a non-URL target does not exist
/// - [`LmpError::UnsupportedFormat`] for any other extension
pub fn classify(target: &str) -> Result<Target, LmpError> {
    if is_url(target) {
        return Ok(Target::Url(target.to_string()));
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(LmpError::FileNotFound { path });
    }

    let ext = lowercase_extension(&path);
    let kind = match ext.as_deref() {
        Some(e) if OFFICE_EXTENSIONS.contains(&e) => Target::Office(path),
        Some("pdf") => Target::Pdf(path),
        _ => {
            let extension = path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy()))
                .unwrap_or_default();
            return Err(LmpError::UnsupportedFormat { path, extension });
        }
    };

    debug!("Classified '{}' as {:?}", target, kind);
    Ok(kind)
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> String {
        let p = dir.path().join(name);
        std::fs::write(&p, b"x").unwrap();
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/page"));
        assert!(is_url("http://example.com"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn url_is_not_checked_on_disk() {
        assert_eq!(
            classify("https://example.com/a.xyz").unwrap(),
            Target::Url("https://example.com/a.xyz".into())
        );
    }

    #[test]
    fn every_office_extension_routes_to_office() {
        let dir = TempDir::new().unwrap();
        for ext in ["ppt", "pptx", "doc", "docx", "xls", "xlsx", "DOCX", "Pptx"] {
            let target = touch(&dir, &format!("file.{ext}"));
            assert!(
                matches!(classify(&target).unwrap(), Target::Office(_)),
                "{ext} should be office"
            );
        }
    }

    #[test]
    fn pdf_routes_directly_in_any_case() {
        let dir = TempDir::new().unwrap();
        for name in ["a.pdf", "b.PDF"] {
            let target = touch(&dir, name);
            assert!(matches!(classify(&target).unwrap(), Target::Pdf(_)));
        }
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let target = touch(&dir, "notes.txt");
        match classify(&target).unwrap_err() {
            LmpError::UnsupportedFormat { extension, .. } => assert_eq!(extension, ".txt"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_extension_is_unsupported() {
        let dir = TempDir::new().unwrap();
        let target = touch(&dir, "README");
        assert!(matches!(
            classify(&target).unwrap_err(),
            LmpError::UnsupportedFormat { .. }
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        assert!(matches!(
            classify("/definitely/not/here.pdf").unwrap_err(),
            LmpError::FileNotFound { .. }
        ));
    }
}
