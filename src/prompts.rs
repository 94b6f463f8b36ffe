//! Prompts and fixed Markdown fragments.
//!
//! Every string the model sees, and every marker the assembler writes around
//! model output, lives here so tests can assert on the exact text.

/// Default instruction sent with each page image.
///
/// Used when [`crate::config::ConversionConfig::prompt`] is not overridden.
pub const DEFAULT_PAGE_PROMPT: &str = "Convert the content of this image to Markdown. \
Preserve tables, lists and headings. Output only the Markdown, with no commentary or chit-chat.";

/// Heading written above each page entry in the assembled document.
pub fn page_heading(page_num: usize) -> String {
    format!("## Page {page_num}")
}

/// Substitute text for a page that could not be rendered or transcribed.
pub fn page_placeholder(page_num: usize) -> String {
    format!("[Page {page_num} parse error]")
}

/// Header written above successfully extracted webpage content.
pub fn web_source_header(url: &str) -> String {
    format!("# Source: {url}")
}

pub const WEB_UNREACHABLE_PLACEHOLDER: &str =
    "> ⚠️ Web page download failed or the page is unreachable.";

pub const WEB_NO_CONTENT_PLACEHOLDER: &str = "> ⚠️ Web page downloaded, but no main content \
could be extracted (the page may be image-only or rendered by JavaScript).";

/// Placeholder for any other web extraction failure.
pub fn web_error_placeholder(detail: &str) -> String {
    format!("> ❌ Web page parsing error: {detail}")
}
