//! Office normalisation: convert PPT/DOC/XLS families to PDF.
//!
//! The conversion is delegated to a headless office suite. The produced PDF
//! lands in the shared staging directory under a name derived from the input
//! stem, and is wrapped in a [`StagedPdf`] guard so it is removed once the
//! target has been processed, whichever way the run ends.

use crate::error::LmpError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Converts an office document into a PDF and returns the PDF's path.
#[async_trait]
pub trait OfficeConverter: Send + Sync {
    async fn to_pdf(&self, input: &Path) -> Result<PathBuf, LmpError>;
}

/// [`OfficeConverter`] backed by `libreoffice --headless --convert-to pdf`.
#[derive(Debug, Clone)]
pub struct LibreOfficeConverter {
    program: String,
    out_dir: PathBuf,
}

impl LibreOfficeConverter {
    pub fn new(program: impl Into<String>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }
}

#[async_trait]
impl OfficeConverter for LibreOfficeConverter {
    async fn to_pdf(&self, input: &Path) -> Result<PathBuf, LmpError> {
        tokio::fs::create_dir_all(&self.out_dir)
            .await
            .map_err(|source| LmpError::TempDir {
                path: self.out_dir.clone(),
                source,
            })?;

        info!("Converting '{}' to PDF with {}", input.display(), self.program);

        let output = Command::new(&self.program)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(&self.out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| LmpError::OfficeConversionFailed {
                path: input.to_path_buf(),
                detail: format!("could not start '{}': {e}", self.program),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LmpError::OfficeConversionFailed {
                path: input.to_path_buf(),
                detail: format!("{} ({})", output.status, stderr.trim()),
            });
        }

        let pdf = converted_pdf_path(&self.out_dir, input);
        if !pdf.exists() {
            return Err(LmpError::ConvertedPdfMissing { expected: pdf });
        }

        debug!("Office conversion wrote {}", pdf.display());
        Ok(pdf)
    }
}

/// Where the office suite writes the PDF for `input`: same stem, `.pdf`
/// extension, inside `out_dir`.
pub fn converted_pdf_path(out_dir: &Path, input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    out_dir.join(format!("{stem}.pdf"))
}

/// A PDF that exists only for the duration of one target's conversion.
///
/// The file is deleted when the guard is dropped. A file that is already
/// gone is not an error.
#[derive(Debug)]
pub struct StagedPdf {
    path: PathBuf,
}

impl StagedPdf {
    /// Take ownership of `path`, unless it is the original input itself.
    pub fn new(path: PathBuf, original: &Path) -> Option<Self> {
        if path == original {
            None
        } else {
            Some(Self { path })
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedPdf {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed staged PDF {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove staged PDF {}: {}", self.path.display(), e),
        }
    }
}
