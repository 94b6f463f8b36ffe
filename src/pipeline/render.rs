//! PDF rasterisation: render every page to a PNG via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which is not safe
//! to call from async contexts. [`rasterize`] moves the work onto Tokio's
//! blocking pool so the runtime never stalls during rendering.
//!
//! ## Scale
//!
//! Pages are rendered at [`RENDER_SCALE`] times their native size in both
//! dimensions (four times the pixel area). Small print stays legible for the
//! model without any per-document tuning.

use crate::error::{LmpError, PageError};
use crate::pipeline::encode;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Linear upscaling factor applied to every page.
pub const RENDER_SCALE: f32 = 2.0;

/// Environment variable pointing at an explicit libpdfium.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// One rasterised page, ready for transcription.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Page count of the source document.
    pub total_pages: usize,
    /// Lossless PNG encoding of the page.
    pub png: Vec<u8>,
}

/// A page slot: the image, or why this single page could not be produced.
pub type RenderedPage = Result<PageImage, PageError>;

/// Produces one [`RenderedPage`] per page of a PDF, in page order.
///
/// Failing to open the document is fatal (`Err`); a single page that fails
/// afterwards occupies its slot as a [`PageError`].
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<RenderedPage>, LmpError>;
}

/// Run a [`Rasterizer`] on the blocking pool.
pub async fn rasterize(
    rasterizer: &Arc<dyn Rasterizer>,
    pdf_path: &Path,
) -> Result<Vec<RenderedPage>, LmpError> {
    let rasterizer = Arc::clone(rasterizer);
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || rasterizer.rasterize(&path))
        .await
        .map_err(|e| LmpError::Internal(format!("Render task panicked: {e}")))?
}

/// [`Rasterizer`] backed by pdfium.
///
/// Binds to the library at `PDFIUM_LIB_PATH` when set, otherwise to the
/// system library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new() -> Self {
        Self {
            library_path: std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from),
        }
    }

    /// Bind to a specific pdfium shared library.
    pub fn with_library(path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: Some(path.into()),
        }
    }

    fn bind(&self) -> Result<Pdfium, LmpError> {
        let bindings = match &self.library_path {
            Some(path) => Pdfium::bind_to_library(path),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| LmpError::PdfiumBindingFailed(format!("{e:?}")))?;
        Ok(Pdfium::new(bindings))
    }

    /// Page sizes in PDF points (1/72 in), in page order.
    pub fn page_sizes(&self, pdf_path: &Path) -> Result<Vec<(f32, f32)>, LmpError> {
        let pdfium = self.bind()?;
        let document = open_document(&pdfium, pdf_path)?;
        let sizes = document
            .pages()
            .iter()
            .map(|page| (page.width().value, page.height().value))
            .collect();
        Ok(sizes)
    }
}

fn open_document<'a>(pdfium: &'a Pdfium, pdf_path: &Path) -> Result<PdfDocument<'a>, LmpError> {
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| LmpError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf_path: &Path) -> Result<Vec<RenderedPage>, LmpError> {
        let pdfium = self.bind()?;

        let document = open_document(&pdfium, pdf_path)?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages ({})", total_pages, pdf_path.display());

        let render_config = PdfRenderConfig::new().scale_page_by_factor(RENDER_SCALE);

        let mut results = Vec::with_capacity(total_pages);
        for (idx, page) in pages.iter().enumerate() {
            let page_num = idx + 1;
            let rendered = page
                .render_with_config(&render_config)
                .map_err(|e| format!("{e:?}"))
                .and_then(|bitmap| {
                    let image = bitmap.as_image();
                    debug!(
                        "Rendered page {} → {}x{} px",
                        page_num,
                        image.width(),
                        image.height()
                    );
                    encode::encode_png(&image).map_err(|e| format!("PNG encoding failed: {e}"))
                });

            results.push(match rendered {
                Ok(png) => Ok(PageImage {
                    page_num,
                    total_pages,
                    png,
                }),
                Err(detail) => {
                    warn!("Page {}: render failed: {}", page_num, detail);
                    Err(PageError::RenderFailed {
                        page: page_num,
                        detail,
                    })
                }
            });
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRasterizer(usize);

    impl Rasterizer for FixedRasterizer {
        fn rasterize(&self, _pdf_path: &Path) -> Result<Vec<RenderedPage>, LmpError> {
            Ok((1..=self.0)
                .map(|n| {
                    Ok(PageImage {
                        page_num: n,
                        total_pages: self.0,
                        png: vec![n as u8],
                    })
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn rasterize_runs_on_blocking_pool_and_keeps_order() {
        let r: Arc<dyn Rasterizer> = Arc::new(FixedRasterizer(3));
        let pages = rasterize(&r, Path::new("doc.pdf")).await.unwrap();
        let nums: Vec<usize> = pages
            .iter()
            .map(|p| p.as_ref().unwrap().page_num)
            .collect();
        assert_eq!(nums, vec![1, 2, 3]);
    }

    #[test]
    fn explicit_library_path_is_kept() {
        let r = PdfiumRasterizer::with_library("/opt/pdfium/libpdfium.so");
        assert_eq!(
            r.library_path.as_deref(),
            Some(Path::new("/opt/pdfium/libpdfium.so"))
        );
    }
}
