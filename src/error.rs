//! Error types for the lmp-lite library.
//!
//! Three error types reflect three failure scopes:
//!
//! * [`LmpError`]: **Fatal for one target**: the target cannot be converted
//!   (missing file, unsupported extension, office conversion failed, corrupt
//!   PDF). The batch runner reports it and moves on to the next target.
//!   Configuration errors are also `LmpError`s; the CLI treats those as fatal
//!   for the whole run.
//!
//! * [`PageError`]: **Non-fatal**: a single page failed to render or to
//!   transcribe. Stored inside [`crate::output::PageOutcome::Failed`] and
//!   rendered as a placeholder so the document keeps one entry per page.
//!
//! * [`WebError`]: a URL could not be turned into Markdown. Converted into a
//!   placeholder body by the pipeline rather than aborting the target.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the lmp-lite library.
#[derive(Debug, Error)]
pub enum LmpError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The API credential is absent or blank.
    #[error("API credential is not set.\nExport {var}=<key> before running.")]
    MissingCredential { var: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The file exists but its extension is neither an office format nor PDF.
    #[error("Unsupported file format '{extension}' for '{path}'")]
    UnsupportedFormat { path: PathBuf, extension: String },

    // ── Office conversion errors ──────────────────────────────────────────
    /// The office suite could not be started or exited with a failure status.
    #[error("Office to PDF conversion failed for '{path}': {detail}\nCheck the file and the LibreOffice installation.")]
    OfficeConversionFailed { path: PathBuf, detail: String },

    /// The office suite reported success but the expected PDF is absent.
    #[error("Office conversion produced no PDF at '{expected}'")]
    ConvertedPdfMissing { expected: PathBuf },

    /// The staging directory could not be created.
    #[error("Failed to prepare temp directory '{path}': {source}")]
    TempDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// pdfium could not open the document.
    #[error("PDF '{path}' could not be opened: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install libpdfium system-wide, or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumBindingFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Page rasterisation failed after the document itself opened.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The VLM request failed (transport, HTTP status, or malformed reply).
    #[error("Page {page}: transcription failed: {detail}")]
    TranscriptionFailed { page: usize, detail: String },
}

impl PageError {
    /// The 1-indexed page the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. } | PageError::TranscriptionFailed { page, .. } => {
                *page
            }
        }
    }
}

/// Why a URL target produced no extracted content.
#[derive(Debug, Clone, Error)]
pub enum WebError {
    /// The page could not be downloaded (network error or non-2xx status).
    #[error("download failed for '{url}': {reason}")]
    Unreachable { url: String, reason: String },

    /// The page downloaded but no main text could be extracted.
    #[error("no extractable content at '{url}'")]
    NoContent { url: String },

    /// Any other extraction failure.
    #[error("{0}")]
    Failed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_names_variable() {
        let e = LmpError::MissingCredential {
            var: "ALIYUN_API_KEY".into(),
        };
        assert!(e.to_string().contains("ALIYUN_API_KEY"));
    }

    #[test]
    fn unsupported_format_display() {
        let e = LmpError::UnsupportedFormat {
            path: PathBuf::from("notes.txt"),
            extension: ".txt".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains(".txt"), "got: {msg}");
        assert!(msg.contains("notes.txt"), "got: {msg}");
    }

    #[test]
    fn page_error_reports_its_page() {
        let render = PageError::RenderFailed {
            page: 4,
            detail: "bitmap".into(),
        };
        let llm = PageError::TranscriptionFailed {
            page: 7,
            detail: "HTTP 500".into(),
        };
        assert_eq!(render.page(), 4);
        assert_eq!(llm.page(), 7);
        assert!(llm.to_string().contains("HTTP 500"));
    }
}
