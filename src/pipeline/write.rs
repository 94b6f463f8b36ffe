//! Output writer: name the `.md` file for a target and write it atomically.
//!
//! The document is written to a temporary file in the destination directory
//! and then renamed over the final path, so a crash never leaves a partially
//! written Markdown file behind.

use crate::error::LmpError;
use crate::pipeline::classify::Target;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Fixed file name for URL targets. A second URL in the same batch
/// overwrites the first.
pub const WEB_EXPORT_FILE: &str = "web_export.md";

/// Destination path for a classified target.
///
/// Files keep their full name and gain a `.md` suffix
/// (`deck.pptx` → `deck.pptx.md`).
pub fn output_path_for(target: &Target, output_dir: &Path) -> PathBuf {
    match target {
        Target::Url(_) => output_dir.join(WEB_EXPORT_FILE),
        Target::Office(path) | Target::Pdf(path) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            output_dir.join(format!("{name}.md"))
        }
    }
}

/// Write `markdown` to `path` as UTF-8, replacing any existing file.
///
/// Returns the absolute, canonical path of the written file.
pub fn write_markdown(path: &Path, markdown: &str) -> Result<PathBuf, LmpError> {
    let write_err = |source: std::io::Error| LmpError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(write_err)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(write_err)?;
    tmp.write_all(markdown.as_bytes()).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;

    let resolved = path.canonicalize().map_err(write_err)?;
    info!("Wrote {} bytes to {}", markdown.len(), resolved.display());
    Ok(resolved)
}
