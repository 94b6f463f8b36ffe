//! # lmp-lite
//!
//! Convert PDFs, office documents and web pages to Markdown.
//!
//! Documents are rasterised page by page and each page image is sent to a
//! vision-language model behind an OpenAI-compatible chat-completions API,
//! reached through an `edgequake-llm` provider.
//! Office files (`.ppt[x]`, `.doc[x]`, `.xls[x]`) are first turned into PDF
//! by a headless office suite. URLs skip the model entirely: the page's main
//! content is extracted and converted directly.
//!
//! ## Pipeline Overview
//!
//! ```text
//! target
//!  │
//!  ├─ 1. Classify    URL / office / PDF / unsupported
//!  ├─ 2. Normalise   office → PDF via LibreOffice (staged, removed after use)
//!  ├─ 3. Render      every page at 2x via pdfium (spawn_blocking)
//!  ├─ 4. Transcribe  one VLM call per page, sequential, no retry
//!  ├─ 5. Assemble    "## Page N" per page, placeholders for failures
//!  └─ 6. Write       <name>.md, or web_export.md for URLs
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lmp_lite::{ConversionConfig, Converter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads ALIYUN_*, TEMP_DIR, LIBREOFFICE_BIN and the LMP_* variables
//!     let config = ConversionConfig::from_env()?;
//!     let converter = Converter::new(config)?;
//!     for outcome in converter.convert_batch(&["report.pdf", "https://example.com"][..]).await {
//!         println!("{}: {:?}", outcome.target, outcome.report().map(|r| &r.output_path));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `lmp-lite` and `extract-summary` binaries |
//!
//! ## Log summaries
//!
//! [`summary::extract_executive_summary`] pulls the `executive_summary`
//! field out of a run log; the `extract-summary` binary wraps it.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod summary;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert, Converter};
pub use error::{LmpError, PageError, WebError};
pub use output::{
    ConversionStats, PageOutcome, PageResult, TargetOutcome, TargetReport, TargetStatus,
};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
