//! Web extraction: fetch a URL and keep its main content as Markdown.
//!
//! URL targets never touch the rasteriser or the vision model. The page is
//! downloaded, non-content blocks (scripts, styles, forms) are stripped and
//! the most specific content container is selected (`<article>`, then
//! `<main>`). Without one, the `<body>` is used minus its page chrome
//! (navigation, headers, footers, sidebars). The remainder is converted with
//! `html2md`; tables survive as Markdown tables.

use crate::error::WebError;
use crate::prompts::{
    web_error_placeholder, web_source_header, WEB_NO_CONTENT_PLACEHOLDER,
    WEB_UNREACHABLE_PLACEHOLDER,
};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, info};

/// User-Agent sent with page downloads.
pub const USER_AGENT: &str = concat!("lmp-lite/", env!("CARGO_PKG_VERSION"));

/// Turns a URL into Markdown body text (without the source header).
#[async_trait]
pub trait WebExtractor: Send + Sync {
    async fn extract(&self, url: &str) -> Result<String, WebError>;
}

/// [`WebExtractor`] that downloads with reqwest and converts with html2md.
#[derive(Debug, Clone)]
pub struct HttpWebExtractor {
    http: reqwest::Client,
}

impl HttpWebExtractor {
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, WebError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| WebError::Failed(format!("HTTP client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl WebExtractor for HttpWebExtractor {
    async fn extract(&self, url: &str) -> Result<String, WebError> {
        info!("Fetching {}", url);

        let unreachable = |reason: String| WebError::Unreachable {
            url: url.to_string(),
            reason,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unreachable(format!("HTTP {}", response.status())));
        }

        let html = response
            .text()
            .await
            .map_err(|e| WebError::Failed(format!("cannot read page body: {e}")))?;
        debug!("Downloaded {} bytes from {}", html.len(), url);

        // html2md is CPU-bound on large pages.
        tokio::task::spawn_blocking(move || html_to_main_markdown(&html))
            .await
            .map_err(|e| WebError::Failed(format!("extraction aborted: {e}")))?
            .ok_or_else(|| WebError::NoContent {
                url: url.to_string(),
            })
    }
}

/// Render the body written for a URL target.
///
/// Extraction failures still produce a document: the placeholder line that
/// names the failure.
pub fn web_document(url: &str, extracted: Result<String, WebError>) -> String {
    match extracted {
        Ok(markdown) => format!("{}\n\n{}\n", web_source_header(url), markdown),
        Err(WebError::Unreachable { .. }) => format!("{WEB_UNREACHABLE_PLACEHOLDER}\n"),
        Err(WebError::NoContent { .. }) => format!("{WEB_NO_CONTENT_PLACEHOLDER}\n"),
        Err(WebError::Failed(detail)) => format!("{}\n", web_error_placeholder(&detail)),
    }
}

static NON_CONTENT: Lazy<Vec<Regex>> = Lazy::new(|| {
    element_patterns(&["script", "style", "noscript", "template", "svg", "form"])
});

/// Page-level chrome, removed only when no content container exists.
static CHROME: Lazy<Vec<Regex>> =
    Lazy::new(|| element_patterns(&["nav", "header", "footer", "aside"]));

static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("static comment pattern"));

static CONTAINERS: Lazy<Vec<Regex>> =
    Lazy::new(|| ["article", "main"].into_iter().map(container_pattern).collect());

static BODY: Lazy<Regex> = Lazy::new(|| container_pattern("body"));

fn element_patterns(tags: &[&str]) -> Vec<Regex> {
    tags.iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>"))
                .expect("static element pattern")
        })
        .collect()
}

fn container_pattern(tag: &str) -> Regex {
    Regex::new(&format!(r"(?is)<{tag}\b[^>]*>(.*)</{tag}\s*>")).expect("static container pattern")
}

fn strip(html: &str, patterns: &[Regex]) -> String {
    let mut cleaned = html.to_string();
    for re in patterns {
        cleaned = re.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}

fn inner<'h>(re: &Regex, html: &'h str) -> Option<&'h str> {
    re.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Extract the main content of an HTML document as Markdown.
///
/// Returns `None` when nothing but whitespace remains.
pub fn html_to_main_markdown(html: &str) -> Option<String> {
    let cleaned = strip(&COMMENT.replace_all(html, ""), &NON_CONTENT);

    let content = match CONTAINERS.iter().find_map(|re| inner(re, &cleaned)) {
        Some(container) => container.to_string(),
        None => strip(inner(&BODY, &cleaned).unwrap_or(&cleaned), &CHROME),
    };

    let markdown = html2md::parse_html(&content);
    let trimmed = markdown.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
