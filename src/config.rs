//! Configuration types for document-to-Markdown conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. [`ConversionConfig::from_env`] reads
//! the same environment variables the CLI exposes as flags, so library users
//! and shell users configure the tool identically.

use crate::error::LmpError;
use crate::progress::ProgressCallback;
use crate::prompts::DEFAULT_PAGE_PROMPT;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding the API credential (required).
pub const API_KEY_ENV: &str = "ALIYUN_API_KEY";
/// Environment variable overriding the chat-completions base URL.
pub const BASE_URL_ENV: &str = "ALIYUN_BASE_URL";
/// Environment variable selecting the vision model.
pub const MODEL_ENV: &str = "ALIYUN_VISION_MODEL";
/// Environment variable for the office-to-PDF staging directory.
pub const TEMP_DIR_ENV: &str = "TEMP_DIR";
/// Environment variable naming the office suite binary.
pub const OFFICE_BIN_ENV: &str = "LIBREOFFICE_BIN";
/// Environment variable for the directory Markdown files are written to.
pub const OUTPUT_DIR_ENV: &str = "LMP_OUTPUT_DIR";
/// Environment variable for the per-request timeout, in whole seconds.
pub const API_TIMEOUT_ENV: &str = "LMP_API_TIMEOUT";
/// Environment variable naming a file sent as the system message.
pub const SYSTEM_PROMPT_ENV: &str = "LMP_SYSTEM_PROMPT";
/// Environment variable replacing the per-page instruction text.
pub const PROMPT_ENV: &str = "LMP_PROMPT";

/// DashScope OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";
pub const DEFAULT_MODEL: &str = "qwen-vl-max";
pub const DEFAULT_TEMP_DIR: &str = "./temp_conversion";
pub const DEFAULT_OFFICE_BIN: &str = "libreoffice";

/// Configuration for a conversion run.
///
/// Built via [`ConversionConfig::builder()`] or [`ConversionConfig::from_env()`].
///
/// # Example
/// ```rust
/// use lmp_lite::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .api_key("sk-test")
///     .model("qwen-vl-plus")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "qwen-vl-plus");
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Bearer credential passed to the VLM endpoint. Must be non-blank.
    pub api_key: String,

    /// Base URL of the OpenAI-compatible API, without `/chat/completions`.
    pub base_url: String,

    /// Vision model identifier. Default: `qwen-vl-max`.
    pub model: String,

    /// Staging directory for PDFs produced from office documents.
    /// Created on demand. Default: `./temp_conversion`.
    pub temp_dir: PathBuf,

    /// Directory the `.md` outputs are written to. Default: current directory.
    pub output_dir: PathBuf,

    /// Office suite program invoked in headless mode. Default: `libreoffice`.
    pub office_program: String,

    /// Instruction sent alongside every page image.
    pub prompt: String,

    /// Optional system message preceding the page request.
    pub system_prompt: Option<String>,

    /// Per-request timeout in seconds. `None` means 600 s for model calls
    /// and no timeout for web downloads.
    pub api_timeout_secs: Option<u64>,

    /// Optional observer for target and page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temp_dir: PathBuf::from(DEFAULT_TEMP_DIR),
            output_dir: PathBuf::from("."),
            office_program: DEFAULT_OFFICE_BIN.to_string(),
            prompt: DEFAULT_PAGE_PROMPT.to_string(),
            system_prompt: None,
            api_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temp_dir", &self.temp_dir)
            .field("output_dir", &self.output_dir)
            .field("office_program", &self.office_program)
            .field("system_prompt", &self.system_prompt.is_some())
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a validated configuration from the process environment.
    pub fn from_env() -> Result<Self, LmpError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a validated configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset, so defaults apply.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LmpError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut builder = Self::builder();
        if let Some(key) = get(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Some(url) = get(BASE_URL_ENV) {
            builder = builder.base_url(url);
        }
        if let Some(model) = get(MODEL_ENV) {
            builder = builder.model(model);
        }
        if let Some(dir) = get(TEMP_DIR_ENV) {
            builder = builder.temp_dir(dir);
        }
        if let Some(bin) = get(OFFICE_BIN_ENV) {
            builder = builder.office_program(bin);
        }
        if let Some(dir) = get(OUTPUT_DIR_ENV) {
            builder = builder.output_dir(dir);
        }
        if let Some(raw) = get(API_TIMEOUT_ENV) {
            let secs = raw.parse::<u64>().map_err(|_| {
                LmpError::InvalidConfig(format!(
                    "{API_TIMEOUT_ENV} must be a whole number of seconds, got {raw:?}"
                ))
            })?;
            builder = builder.api_timeout_secs(secs);
        }
        if let Some(prompt) = get(PROMPT_ENV) {
            builder = builder.prompt(prompt);
        }
        if let Some(path) = get(SYSTEM_PROMPT_ENV) {
            builder = builder.system_prompt(read_system_prompt(Path::new(&path))?);
        }
        builder.build()
    }
}

/// Read a system-prompt file.
pub fn read_system_prompt(path: &Path) -> Result<String, LmpError> {
    std::fs::read_to_string(path).map_err(|e| {
        LmpError::InvalidConfig(format!(
            "cannot read system prompt {}: {e}",
            path.display()
        ))
    })
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn office_program(mut self, program: impl Into<String>) -> Self {
        self.config.office_program = program.into();
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.prompt = prompt.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    ///
    /// The credential, endpoint and model must all be non-blank so that no
    /// request is ever issued with an incomplete client configuration.
    pub fn build(mut self) -> Result<ConversionConfig, LmpError> {
        let c = &mut self.config;
        c.api_key = c.api_key.trim().to_string();
        c.base_url = c.base_url.trim().trim_end_matches('/').to_string();
        c.model = c.model.trim().to_string();

        if c.api_key.is_empty() {
            return Err(LmpError::MissingCredential {
                var: API_KEY_ENV.to_string(),
            });
        }
        if c.base_url.is_empty() {
            return Err(LmpError::InvalidConfig("base URL must not be empty".into()));
        }
        if c.model.is_empty() {
            return Err(LmpError::InvalidConfig("model must not be empty".into()));
        }
        if c.office_program.trim().is_empty() {
            return Err(LmpError::InvalidConfig(
                "office program must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(LmpError::InvalidConfig("API timeout must be ≥ 1s".into()));
        }
        Ok(self.config)
    }
}
