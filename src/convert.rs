//! Target and batch conversion entry points.
//!
//! [`Converter`] owns the configuration and the four collaborators the
//! pipeline talks to. Targets are handled one at a time, and pages one at a
//! time in page order. A failing page becomes a placeholder; a failing
//! target is reported and the batch moves on.

use crate::config::{ConversionConfig, API_KEY_ENV};
use crate::error::LmpError;
use crate::output::{
    ConversionStats, PageOutcome, PageResult, TargetOutcome, TargetReport, TargetStatus,
};
use crate::pipeline::assemble::assemble;
use crate::pipeline::classify::{classify, Target};
use crate::pipeline::office::{LibreOfficeConverter, OfficeConverter, StagedPdf};
use crate::pipeline::render::{self, PdfiumRasterizer, Rasterizer};
use crate::pipeline::transcribe::{
    openai_compatible_provider, transcribe_page, ProviderVisionModel, VisionModel,
};
use crate::pipeline::web::{web_document, HttpWebExtractor, WebExtractor};
use crate::pipeline::write::{output_path_for, write_markdown};
use crate::progress::ConversionProgressCallback;
use edgequake_llm::LLMProvider;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Drives targets through the pipeline.
///
/// # Example
///
/// ```rust,no_run
/// use lmp_lite::{ConversionConfig, Converter};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = ConversionConfig::from_env()?;
///     let converter = Converter::new(config)?;
///     let report = converter.convert_target("slides.pptx").await?;
///     println!("{}", report.output_path.display());
///     Ok(())
/// }
/// ```
pub struct Converter {
    config: ConversionConfig,
    vision: Arc<dyn VisionModel>,
    web: Arc<dyn WebExtractor>,
    office: Arc<dyn OfficeConverter>,
    rasterizer: Arc<dyn Rasterizer>,
}

impl Converter {
    /// Create a converter with the production collaborators: the
    /// OpenAI-compatible provider, the HTTP web extractor, LibreOffice and
    /// pdfium.
    ///
    /// # Errors
    /// [`LmpError::MissingCredential`] when the API key is blank. Nothing is
    /// contacted before this check.
    pub fn new(config: ConversionConfig) -> Result<Self, LmpError> {
        if config.api_key.trim().is_empty() {
            return Err(LmpError::MissingCredential {
                var: API_KEY_ENV.to_string(),
            });
        }

        let vision = ProviderVisionModel::new(openai_compatible_provider(&config)?);
        let web = HttpWebExtractor::new(config.api_timeout_secs)
            .map_err(|e| LmpError::Internal(e.to_string()))?;
        let office =
            LibreOfficeConverter::new(config.office_program.clone(), config.temp_dir.clone());

        Ok(Self {
            vision: Arc::new(vision),
            web: Arc::new(web),
            office: Arc::new(office),
            rasterizer: Arc::new(PdfiumRasterizer::new()),
            config,
        })
    }

    pub fn with_vision(mut self, vision: Arc<dyn VisionModel>) -> Self {
        self.vision = vision;
        self
    }

    /// Transcribe pages with a pre-built LLM provider instead of the
    /// configured endpoint.
    pub fn with_provider(self, provider: Arc<dyn LLMProvider>) -> Self {
        self.with_vision(Arc::new(ProviderVisionModel::new(provider)))
    }

    pub fn with_web(mut self, web: Arc<dyn WebExtractor>) -> Self {
        self.web = web;
        self
    }

    pub fn with_office(mut self, office: Arc<dyn OfficeConverter>) -> Self {
        self.office = office;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn callback(&self) -> Option<&dyn ConversionProgressCallback> {
        self.config.progress_callback.as_deref()
    }

    /// Convert one target and write its Markdown file.
    ///
    /// URL targets always produce a file, even when extraction fails (the
    /// body is then a placeholder). Page failures never surface here; they
    /// are counted in [`ConversionStats::failed_pages`].
    ///
    /// # Errors
    /// Fatal for this target only: missing file, unsupported extension,
    /// office conversion failure, unreadable PDF, or an output write error.
    pub async fn convert_target(&self, target: &str) -> Result<TargetReport, LmpError> {
        let start = Instant::now();
        info!("Processing {}", target);

        let classified = classify(target)?;
        let output_path = output_path_for(&classified, &self.config.output_dir);

        let (markdown, stats) = match &classified {
            Target::Url(url) => {
                if let Some(cb) = self.callback() {
                    cb.on_web_fetch(url);
                }
                let extracted = self.web.extract(url).await;
                if let Err(e) = &extracted {
                    warn!("Web extraction failed: {}", e);
                }
                (web_document(url, extracted), None)
            }
            Target::Office(path) => {
                if let Some(cb) = self.callback() {
                    cb.on_office_conversion(path);
                }
                let pdf = self.office.to_pdf(path).await?;
                // Removed on drop, whether or not the PDF converts.
                let _staged = StagedPdf::new(pdf.clone(), path);
                let pages = self.transcribe_pdf(&pdf).await?;
                let stats = page_stats(&pages, start);
                (assemble(&pages), Some(stats))
            }
            Target::Pdf(path) => {
                let pages = self.transcribe_pdf(path).await?;
                let stats = page_stats(&pages, start);
                (assemble(&pages), Some(stats))
            }
        };

        let written = write_markdown(&output_path, &markdown)?;

        if let Some(stats) = &stats {
            info!(
                "{}: {} pages ({} failed) in {}ms",
                target, stats.total_pages, stats.failed_pages, stats.duration_ms
            );
        }

        Ok(TargetReport {
            target: target.to_string(),
            output_path: written,
            stats,
        })
    }

    /// Convert every target in order. Never aborts: each target's result is
    /// reported in its [`TargetOutcome`].
    pub async fn convert_batch<S: AsRef<str>>(&self, targets: &[S]) -> Vec<TargetOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            let target = target.as_ref();
            if let Some(cb) = self.callback() {
                cb.on_target_start(target);
            }

            let result = match self.convert_target(target).await {
                Ok(report) => {
                    info!("Saved {}", report.output_path.display());
                    if let Some(cb) = self.callback() {
                        cb.on_target_complete(target, &report.output_path);
                    }
                    TargetStatus::Written { report }
                }
                Err(e) => {
                    error!("Skipping {}: {}", target, e);
                    let message = e.to_string();
                    if let Some(cb) = self.callback() {
                        cb.on_target_error(target, &message);
                    }
                    TargetStatus::Failed { error: message }
                }
            };

            outcomes.push(TargetOutcome {
                target: target.to_string(),
                result,
            });
        }

        outcomes
    }

    /// Rasterise then transcribe every page, strictly in page order.
    async fn transcribe_pdf(&self, pdf_path: &Path) -> Result<Vec<PageResult>, LmpError> {
        let rendered = render::rasterize(&self.rasterizer, pdf_path).await?;
        let total_pages = rendered.len();

        if let Some(cb) = self.callback() {
            cb.on_document_start(pdf_path, total_pages);
        }

        let mut pages = Vec::with_capacity(total_pages);
        for slot in rendered {
            let result = match slot {
                Ok(image) => {
                    if let Some(cb) = self.callback() {
                        cb.on_page_start(image.page_num, total_pages);
                    }
                    transcribe_page(
                        self.vision.as_ref(),
                        image,
                        &self.config.prompt,
                        self.config.system_prompt.as_deref(),
                    )
                    .await
                }
                Err(page_error) => PageResult::failed(page_error),
            };

            if let Some(cb) = self.callback() {
                match &result.outcome {
                    PageOutcome::Success(markdown) => {
                        cb.on_page_complete(result.page_num, total_pages, markdown.len())
                    }
                    PageOutcome::Failed(e) => {
                        cb.on_page_error(result.page_num, total_pages, &e.to_string())
                    }
                }
            }
            pages.push(result);
        }

        Ok(pages)
    }
}

fn page_stats(pages: &[PageResult], start: Instant) -> ConversionStats {
    ConversionStats {
        total_pages: pages.len(),
        failed_pages: pages.iter().filter(|p| !p.is_success()).count(),
        duration_ms: start.elapsed().as_millis() as u64,
    }
}

/// Convert a single target with the production collaborators.
///
/// Shorthand for `Converter::new(config.clone())?.convert_target(target)`.
pub async fn convert(
    target: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<TargetReport, LmpError> {
    Converter::new(config.clone())?
        .convert_target(target.as_ref())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PageError;

    #[test]
    fn blank_key_is_rejected_before_anything_runs() {
        let config = ConversionConfig {
            api_key: "   ".into(),
            ..ConversionConfig::default()
        };
        let err = Converter::new(config).err().expect("must fail");
        assert!(matches!(err, LmpError::MissingCredential { .. }));
    }

    #[test]
    fn stats_count_failed_pages() {
        let pages = vec![
            PageResult::success(1, "a"),
            PageResult::failed(PageError::RenderFailed {
                page: 2,
                detail: "x".into(),
            }),
            PageResult::success(3, "c"),
        ];
        let stats = page_stats(&pages, Instant::now());
        assert_eq!(stats.total_pages, 3);
        assert_eq!(stats.failed_pages, 1);
    }

    #[tokio::test]
    async fn unsupported_target_is_fatal_for_that_target() {
        let dir = tempfile::TempDir::new().unwrap();
        let notes = dir.path().join("notes.txt");
        std::fs::write(&notes, "x").unwrap();

        let config = ConversionConfig::builder()
            .api_key("k")
            .output_dir(dir.path())
            .build()
            .unwrap();
        let converter = Converter::new(config).unwrap();
        let err = converter
            .convert_target(notes.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, LmpError::UnsupportedFormat { .. }));
        assert!(!dir.path().join("notes.txt.md").exists());
    }
}
