//! Configuration for a page-by-page analysis run.
//!
//! Two values configure a run, and they are loaded in two explicit steps:
//!
//! * [`Credentials`] — API keys read from the environment by
//!   [`Credentials::from_env`]. This is the only place the library touches
//!   environment variables, and it fails with
//!   [`PageReportError::MissingCredential`] before any component exists.
//! * [`PipelineConfig`] — every behavioural knob, built via
//!   [`PipelineConfigBuilder`] with documented defaults.

use crate::error::PageReportError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Endpoint of the agentic document-analysis service.
pub const DEFAULT_API_URL: &str = "https://api.va.landing.ai/v1/tools/agentic-document-analysis";

/// Environment variable holding the document-analysis API key.
pub const LANDING_AI_API_KEY: &str = "LANDING_AI_API_KEY";
/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// API credentials, validated at load time.
///
/// All three keys are required. Only `landing_ai_api_key` is used by the
/// analysis pipeline; the language-model keys and settings are carried for
/// downstream tools that share the same environment.
#[derive(Clone)]
pub struct Credentials {
    pub landing_ai_api_key: String,
    pub anthropic_api_key: String,
    pub openai_api_key: String,
    /// Token budget for downstream language-model calls. Default: 8000.
    pub max_tokens: usize,
    /// Downstream language-model identifier. Default: `gpt-4-turbo`.
    pub model: String,
}

impl Credentials {
    /// Load credentials from the process environment.
    pub fn from_env() -> Result<Self, PageReportError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load credentials through an arbitrary lookup function.
    ///
    /// Keys are checked in a fixed order and the first missing (or empty)
    /// one is reported.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PageReportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let require = |var: &str| -> Result<String, PageReportError> {
            match lookup(var) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(PageReportError::MissingCredential {
                    var: var.to_string(),
                }),
            }
        };

        Ok(Self {
            landing_ai_api_key: require(LANDING_AI_API_KEY)?,
            anthropic_api_key: require(ANTHROPIC_API_KEY)?,
            openai_api_key: require(OPENAI_API_KEY)?,
            max_tokens: 8000,
            model: "gpt-4-turbo".to_string(),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("landing_ai_api_key", &"<redacted>")
            .field("anthropic_api_key", &"<redacted>")
            .field("openai_api_key", &"<redacted>")
            .field("max_tokens", &self.max_tokens)
            .field("model", &self.model)
            .finish()
    }
}

/// Fixed-delay retry policy for transport failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first. Treated as at least 1.
    pub max_retries: u32,
    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Configuration for one analysis run.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf_page_report::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .output_dir("reports")
///     .max_retries(5)
///     .retry_delay_secs(2)
///     .build()
///     .unwrap();
/// assert_eq!(config.retry_policy().max_retries, 5);
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Analysis endpoint. Default: [`DEFAULT_API_URL`].
    pub api_url: String,

    /// Directory receiving per-page and combined reports. Default: `output`.
    pub output_dir: PathBuf,

    /// Directory for the transient single-page PDFs. Default: the system
    /// temp directory.
    pub scratch_dir: Option<PathBuf>,

    /// Attempts per page on a transport failure. Default: 3.
    pub max_retries: u32,

    /// Fixed delay between attempts, in seconds. Default: 5.
    pub retry_delay_secs: u64,

    /// Ask the service to include marginalia (headers, footers, page
    /// numbers). Default: true.
    pub include_marginalia: bool,

    /// Ask the service to embed chunk metadata in the markdown. Default: true.
    pub include_metadata_in_markdown: bool,

    /// Per-request timeout in seconds. Default: `None`, i.e. whatever the
    /// HTTP client does on its own (no timeout).
    pub request_timeout_secs: Option<u64>,

    /// Optional progress callback for per-page events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            output_dir: PathBuf::from("output"),
            scratch_dir: None,
            max_retries: 3,
            retry_delay_secs: 5,
            include_marginalia: true,
            include_metadata_in_markdown: true,
            request_timeout_secs: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("api_url", &self.api_url)
            .field("output_dir", &self.output_dir)
            .field("scratch_dir", &self.scratch_dir)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("include_marginalia", &self.include_marginalia)
            .field(
                "include_metadata_in_markdown",
                &self.include_metadata_in_markdown,
            )
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }

    /// The retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries.max(1),
            delay: Duration::from_secs(self.retry_delay_secs),
        }
    }

    /// Where page files are written.
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = Some(dir.into());
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_delay_secs(mut self, secs: u64) -> Self {
        self.config.retry_delay_secs = secs;
        self
    }

    pub fn include_marginalia(mut self, v: bool) -> Self {
        self.config.include_marginalia = v;
        self
    }

    pub fn include_metadata_in_markdown(mut self, v: bool) -> Self {
        self.config.include_metadata_in_markdown = v;
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Set a progress callback to receive per-page events.
    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, PageReportError> {
        let c = &self.config;
        if c.max_retries == 0 {
            return Err(PageReportError::InvalidConfig(
                "max_retries must be ≥ 1".into(),
            ));
        }
        if c.api_url.trim().is_empty() {
            return Err(PageReportError::InvalidConfig(
                "api_url must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}
