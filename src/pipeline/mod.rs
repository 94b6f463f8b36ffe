//! Pipeline stages for document-to-Markdown conversion.
//!
//! Each submodule implements exactly one step. Collaborators that reach
//! outside the process (office suite, pdfium, the model API, the web) sit
//! behind traits so the orchestration in [`crate::convert`] can be tested
//! without any of them.
//!
//! ## Data Flow
//!
//! ```text
//! classify ──▶ office ──▶ render ──▶ encode ──▶ transcribe ──▶ assemble ──▶ write
//!   │          (.docx…)   (pdfium)   (base64)    (VLM)        (## Page N)
//!   └──▶ web (URL targets skip render and transcribe) ─────────────────────▶ write
//! ```
//!
//! 1. [`classify`]   decide URL / office / PDF / unsupported
//! 2. [`office`]     headless office suite → staged PDF, deleted after use
//! 3. [`render`]     rasterise every page at 2x; runs in `spawn_blocking`
//! 4. [`encode`]     PNG bytes and `data:` URLs for the request body
//! 5. [`transcribe`] one chat-completions call per page, failures isolated
//! 6. [`assemble`]   join results under page headings
//! 7. [`write`]      name the output and write it atomically
//!
//! [`web`] replaces steps 2–6 for URL targets.

pub mod assemble;
pub mod classify;
pub mod encode;
pub mod office;
pub mod render;
pub mod transcribe;
pub mod web;
pub mod write;
