//! Page transcription: send a page image to a vision model, get Markdown back.
//!
//! [`VisionModel`] is the seam between the pipeline and the remote API.
//! [`ProviderVisionModel`] implements it on top of any edgequake-llm
//! [`LLMProvider`]; [`openai_compatible_provider`] builds the default one for
//! an OpenAI chat-completions endpoint (DashScope, vLLM, LiteLLM, OpenAI).
//!
//! [`transcribe_page`] never propagates an error: a failed request becomes a
//! [`PageOutcome::Failed`] so one bad page cannot abort its siblings. There is
//! no retry.
//!
//! [`PageOutcome::Failed`]: crate::output::PageOutcome::Failed

use crate::config::ConversionConfig;
use crate::error::{LmpError, PageError};
use crate::output::PageResult;
use crate::pipeline::encode::page_image_data;
use crate::pipeline::render::PageImage;
use async_trait::async_trait;
use edgequake_llm::{
    ChatMessage, ConfigProviderType, ImageData, LLMProvider, OpenAICompatibleProvider,
    ProviderConfig,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Request timeout applied to model calls when none is configured.
pub const DEFAULT_MODEL_TIMEOUT_SECS: u64 = 600;

/// Everything the model is asked for one page.
#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub prompt: &'a str,
    pub system_prompt: Option<&'a str>,
    /// Base64 PNG of the rendered page.
    pub image: ImageData,
}

/// A remote model that turns a page image into Markdown.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Return the model's text verbatim, or a human-readable failure reason.
    async fn transcribe(&self, request: PageRequest<'_>) -> Result<String, String>;
}

/// Transcribe one page. The image is consumed; the result is always a
/// [`PageResult`].
pub async fn transcribe_page(
    model: &dyn VisionModel,
    page: PageImage,
    prompt: &str,
    system_prompt: Option<&str>,
) -> PageResult {
    let start = Instant::now();
    let page_num = page.page_num;
    let request = PageRequest {
        prompt,
        system_prompt,
        image: page_image_data(&page.png),
    };
    drop(page);

    match model.transcribe(request).await {
        Ok(markdown) => {
            debug!(
                "Page {}: {} chars in {:?}",
                page_num,
                markdown.len(),
                start.elapsed()
            );
            PageResult::success(page_num, markdown)
        }
        Err(detail) => {
            warn!("Page {}: transcription failed: {}", page_num, detail);
            PageResult::failed(PageError::TranscriptionFailed {
                page: page_num,
                detail,
            })
        }
    }
}

// ── LLM provider adapter ─────────────────────────────────────────────────

/// [`VisionModel`] backed by an edgequake-llm provider.
///
/// ## Message Layout
///
/// 1. **System message** *(optional)*: the configured system prompt
/// 2. **User message**: the page instruction as text, then the page PNG
pub struct ProviderVisionModel {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderVisionModel {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }
}

#[async_trait]
impl VisionModel for ProviderVisionModel {
    async fn transcribe(&self, request: PageRequest<'_>) -> Result<String, String> {
        let messages = page_messages(request);
        self.provider
            .chat(&messages, None)
            .await
            .map(|response| response.content)
            .map_err(|e| e.to_string())
    }
}

fn page_messages(request: PageRequest<'_>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = request.system_prompt {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user_with_images(
        request.prompt,
        vec![request.image],
    ));
    messages
}

/// Build the OpenAI-compatible provider for a validated configuration.
///
/// The endpoint, model and credential all come from `config`; nothing is
/// read from the environment here. The credential is sent as a default
/// `Authorization` header on the provider's HTTP client.
pub fn openai_compatible_provider(
    config: &ConversionConfig,
) -> Result<Arc<dyn LLMProvider>, LmpError> {
    let mut headers = HashMap::new();
    headers.insert(
        "Authorization".to_string(),
        format!("Bearer {}", config.api_key),
    );

    let provider_config = ProviderConfig {
        name: "lmp-lite".to_string(),
        display_name: "OpenAI-compatible vision endpoint".to_string(),
        provider_type: ConfigProviderType::OpenAICompatible,
        base_url: Some(config.base_url.clone()),
        default_llm_model: Some(config.model.clone()),
        headers,
        timeout_seconds: config
            .api_timeout_secs
            .unwrap_or(DEFAULT_MODEL_TIMEOUT_SECS),
        ..ProviderConfig::default()
    };

    let provider = OpenAICompatibleProvider::from_config(provider_config)
        .map_err(|e| LmpError::InvalidConfig(format!("vision provider: {e}")))?;
    debug!(
        "Transcription endpoint: {}/chat/completions ({})",
        config.base_url, config.model
    );
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PageOutcome;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct Echo;

    #[async_trait]
    impl VisionModel for Echo {
        async fn transcribe(&self, request: PageRequest<'_>) -> Result<String, String> {
            Ok(format!("{}|{}", request.prompt, request.image.to_data_uri()))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl VisionModel for AlwaysFails {
        async fn transcribe(&self, _request: PageRequest<'_>) -> Result<String, String> {
            Err("API error (503 Service Unavailable)".into())
        }
    }

    fn page(n: usize) -> PageImage {
        PageImage {
            page_num: n,
            total_pages: 3,
            png: b"abc".to_vec(),
        }
    }

    // ── Canned HTTP endpoint ─────────────────────────────────────────────

    /// A local endpoint answering every request with the same response.
    struct CannedEndpoint {
        base_url: String,
        hits: Arc<AtomicUsize>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    async fn canned_endpoint(status: &'static str, body: &'static str) -> CannedEndpoint {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let (hits_srv, requests_srv) = (hits.clone(), requests.clone());
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let raw = read_request(&mut socket).await;
                hits_srv.fetch_add(1, Ordering::SeqCst);
                requests_srv.lock().unwrap().push(raw);

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        CannedEndpoint {
            base_url: format!("http://{addr}/v1"),
            hits,
            requests,
        }
    }

    /// Read one HTTP/1.1 request (head and `Content-Length` body).
    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf);
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn model_for(endpoint: &CannedEndpoint) -> ProviderVisionModel {
        let config = ConversionConfig::builder()
            .api_key("sk-local")
            .base_url(&endpoint.base_url)
            .model("qwen-vl-max")
            .api_timeout_secs(10)
            .build()
            .unwrap();
        ProviderVisionModel::new(openai_compatible_provider(&config).unwrap())
    }

    // ── Message layout ───────────────────────────────────────────────────

    #[test]
    fn user_message_carries_prompt_and_image() {
        let messages = page_messages(PageRequest {
            prompt: "to markdown",
            system_prompt: None,
            image: page_image_data(b"abc"),
        });
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "to markdown");
        let images = messages[0].images.as_ref().expect("image attached");
        assert_eq!(images[0].to_data_uri(), "data:image/png;base64,YWJj");
    }

    #[test]
    fn system_prompt_comes_first() {
        let messages = page_messages(PageRequest {
            prompt: "p",
            system_prompt: Some("you are a stenographer"),
            image: page_image_data(b""),
        });
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "you are a stenographer");
        assert!(!messages[0].has_images());
        assert!(messages[1].has_images());
    }

    #[test]
    fn provider_uses_configured_model() {
        let config = ConversionConfig::builder()
            .api_key("k")
            .base_url("http://localhost:9/v1")
            .model("qwen-vl-plus")
            .build()
            .unwrap();
        let model = ProviderVisionModel::new(openai_compatible_provider(&config).unwrap());
        assert_eq!(model.model(), "qwen-vl-plus");
    }

    // ── transcribe_page ──────────────────────────────────────────────────

    #[tokio::test]
    async fn success_is_returned_verbatim() {
        let r = transcribe_page(&Echo, page(2), "P", None).await;
        assert_eq!(r.page_num, 2);
        match r.outcome {
            PageOutcome::Success(text) => assert_eq!(text, "P|data:image/png;base64,YWJj"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_becomes_page_error() {
        let r = transcribe_page(&AlwaysFails, page(3), "P", None).await;
        assert_eq!(r.page_num, 3);
        assert!(!r.is_success());
    }

    // ── Against a real HTTP endpoint ─────────────────────────────────────

    #[tokio::test]
    async fn reply_is_sent_with_bearer_and_returned_verbatim() {
        let endpoint = canned_endpoint(
            "200 OK",
            r##"{"choices":[{"index":0,"message":{"role":"assistant","content":"# Title\n\nBody"},"finish_reason":"stop"}]}"##,
        )
        .await;

        let r = transcribe_page(&model_for(&endpoint), page(1), "to markdown", None).await;

        match r.outcome {
            PageOutcome::Success(text) => assert_eq!(text, "# Title\n\nBody"),
            other => panic!("unexpected: {other:?}"),
        }
        let requests = endpoint.requests.lock().unwrap();
        let request = requests[0].to_ascii_lowercase();
        assert!(request.starts_with("post /v1/chat/completions "), "{request}");
        assert!(request.contains("authorization: bearer sk-local"), "{request}");
        assert!(requests[0].contains("\"model\":\"qwen-vl-max\""));
        assert!(requests[0].contains("data:image/png;base64,YWJj"));
    }

    #[tokio::test]
    async fn server_error_fails_the_page_without_retry() {
        let endpoint = canned_endpoint("500 Internal Server Error", "upstream exploded").await;

        let r = transcribe_page(&model_for(&endpoint), page(4), "P", None).await;

        assert_eq!(r.page_num, 4);
        assert!(matches!(r.outcome, PageOutcome::Failed(_)), "{:?}", r.outcome);
        assert_eq!(endpoint.hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let endpoint = canned_endpoint("200 OK", r#"{"choices":[]}"#).await;
        let result = model_for(&endpoint)
            .transcribe(PageRequest {
                prompt: "P",
                system_prompt: None,
                image: page_image_data(b"abc"),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let endpoint = canned_endpoint("200 OK", "<html>gateway</html>").await;
        let r = transcribe_page(&model_for(&endpoint), page(1), "P", None).await;
        assert!(!r.is_success());
    }

    #[tokio::test]
    async fn null_content_is_an_empty_page() {
        let endpoint = canned_endpoint(
            "200 OK",
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        )
        .await;
        let r = transcribe_page(&model_for(&endpoint), page(1), "P", None).await;
        match r.outcome {
            PageOutcome::Success(text) => assert_eq!(text, ""),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
