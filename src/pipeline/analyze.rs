//! Remote analysis: upload one page PDF and parse the structured result.
//!
//! [`DocumentAnalyzer`] is the seam between the orchestrator and the
//! network. [`AnalysisClient`] is the production implementation talking to
//! the agentic document-analysis endpoint; tests substitute their own.
//!
//! ## Status mapping
//!
//! | Status | Error |
//! |--------|-------|
//! | 2xx    | body parsed as [`AnalysisResult`] |
//! | 422    | [`AnalysisError::Http`], raw body logged at `error` |
//! | 429    | [`AnalysisError::RateLimited`] |
//! | other  | [`AnalysisError::Http`] |

use crate::config::PipelineConfig;
use crate::error::{AnalysisError, PageReportError};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, error};

/// Response body of the analysis service.
///
/// Either `data` (success) or `error` (the service declined the page) is
/// expected; nothing else about the shape is guaranteed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub data: Option<AnalysisData>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Structured content of an analysed page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    #[serde(default)]
    pub markdown: Option<String>,
    /// Chunks that could not be read are dropped; a `null` or non-list
    /// value reads as no chunks.
    #[serde(default, deserialize_with = "lenient_chunks")]
    pub chunks: Vec<Chunk>,
}

/// A tagged sub-unit of page content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Empty when absent or not a string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub chunk_type: String,
    /// Everything else the service sends for the chunk (text, grounding, …).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AnalysisResult {
    /// Build a successful result holding `markdown`.
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        Self {
            data: Some(AnalysisData {
                markdown: Some(markdown.into()),
                chunks: Vec::new(),
            }),
            error: None,
        }
    }

    /// The error payload rendered as text, if the service reported one.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| match e {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// The page markdown, if present.
    pub fn markdown(&self) -> Option<&str> {
        self.data.as_ref().and_then(|d| d.markdown.as_deref())
    }

    /// Chunks of the page; empty when there is no data.
    pub fn chunks(&self) -> &[Chunk] {
        self.data.as_ref().map(|d| d.chunks.as_slice()).unwrap_or(&[])
    }

    /// Distinct non-empty chunk types, sorted.
    pub fn chunk_types(&self) -> Vec<String> {
        self.chunks()
            .iter()
            .filter(|c| !c.chunk_type.is_empty())
            .map(|c| c.chunk_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn lenient_chunks<'de, D>(deserializer: D) -> Result<Vec<Chunk>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

/// Something that can analyse a single-page PDF.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    /// Analyse the page stored at `page_path`.
    async fn analyze(&self, page_path: &Path) -> Result<AnalysisResult, AnalysisError>;
}

/// HTTP client for the agentic document-analysis endpoint.
#[derive(Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    include_marginalia: bool,
    include_metadata_in_markdown: bool,
}

impl fmt::Debug for AnalysisClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisClient")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("include_marginalia", &self.include_marginalia)
            .field(
                "include_metadata_in_markdown",
                &self.include_metadata_in_markdown,
            )
            .finish()
    }
}

impl AnalysisClient {
    /// Build a client for `config.api_url`, authenticated with `api_key`.
    pub fn new(api_key: impl Into<String>, config: &PipelineConfig) -> Result<Self, PageReportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| PageReportError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: api_key.into(),
            include_marginalia: config.include_marginalia,
            include_metadata_in_markdown: config.include_metadata_in_markdown,
        })
    }

    fn form(&self, pdf: Vec<u8>) -> Result<Form, AnalysisError> {
        let part = Part::bytes(pdf)
            .file_name("document.pdf")
            .mime_str("application/pdf")
            .map_err(|e| AnalysisError::Network {
                detail: e.to_string(),
            })?;

        Ok(Form::new()
            .part("pdf", part)
            .text("include_marginalia", bool_field(self.include_marginalia))
            .text(
                "include_metadata_in_markdown",
                bool_field(self.include_metadata_in_markdown),
            ))
    }
}

#[async_trait]
impl DocumentAnalyzer for AnalysisClient {
    async fn analyze(&self, page_path: &Path) -> Result<AnalysisResult, AnalysisError> {
        let pdf = tokio::fs::read(page_path)
            .await
            .map_err(|e| AnalysisError::ReadPage {
                path: page_path.to_path_buf(),
                detail: e.to_string(),
            })?;
        debug!("Uploading {} ({} bytes)", page_path.display(), pdf.len());

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header(ACCEPT, "application/json")
            .multipart(self.form(pdf)?)
            .send()
            .await
            .map_err(|e| AnalysisError::Network {
                detail: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AnalysisError::Network {
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            if status == StatusCode::UNPROCESSABLE_ENTITY {
                error!("Analysis service rejected the upload (422): {}", body);
            }
            return Err(classify_status(status, body));
        }

        parse_result(&body)
    }
}

/// Map a non-success status and its body to an [`AnalysisError`].
pub fn classify_status(status: StatusCode, body: String) -> AnalysisError {
    let detail = if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    };
    if status == StatusCode::TOO_MANY_REQUESTS {
        AnalysisError::RateLimited { detail }
    } else {
        AnalysisError::Http {
            status: status.as_u16(),
            detail,
        }
    }
}

/// Parse a 2xx response body.
pub fn parse_result(body: &str) -> Result<AnalysisResult, AnalysisError> {
    serde_json::from_str(body).map_err(|e| AnalysisError::InvalidResponse {
        detail: e.to_string(),
    })
}

fn bool_field(v: bool) -> &'static str {
    if v {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_markdown_and_chunks() {
        let body = r#"{
            "data": {
                "markdown": "Hello",
                "chunks": [
                    {"chunk_type": "text", "text": "Hello"},
                    {"chunk_type": "table"},
                    {"chunk_type": "text"},
                    {"text": "untyped"}
                ]
            }
        }"#;
        let result = parse_result(body).unwrap();
        assert_eq!(result.markdown(), Some("Hello"));
        assert_eq!(result.chunks().len(), 4);
        assert_eq!(result.chunk_types(), vec!["table", "text"]);
        assert_eq!(result.chunks()[0].extra["text"], "Hello");
        assert_eq!(result.error_message(), None);
    }

    #[test]
    fn odd_chunk_shapes_keep_the_markdown() {
        let null_type = parse_result(
            r#"{"data": {"markdown": "ok", "chunks": [{"chunk_type": null}, {"chunk_type": 3}]}}"#,
        )
        .unwrap();
        assert_eq!(null_type.markdown(), Some("ok"));
        assert_eq!(null_type.chunks().len(), 2);
        assert!(null_type.chunk_types().is_empty());

        for chunks in ["null", r#""text""#, r#"{"chunk_type": "text"}"#] {
            let body = format!(r#"{{"data": {{"markdown": "ok", "chunks": {chunks}}}}}"#);
            let result = parse_result(&body).unwrap();
            assert_eq!(result.markdown(), Some("ok"), "chunks = {chunks}");
            assert!(result.chunks().is_empty());
        }

        let mixed = parse_result(
            r#"{"data": {"markdown": "ok", "chunks": ["stray", 7, {"chunk_type": "figure"}]}}"#,
        )
        .unwrap();
        assert_eq!(mixed.chunk_types(), vec!["figure"]);
    }

    #[test]
    fn parses_error_payload() {
        let result = parse_result(r#"{"error": "document too large"}"#).unwrap();
        assert_eq!(result.error_message().as_deref(), Some("document too large"));
        assert_eq!(result.markdown(), None);
        assert!(result.chunks().is_empty());
    }

    #[test]
    fn structured_error_payload_is_rendered() {
        let result = parse_result(r#"{"error": {"code": 7}}"#).unwrap();
        assert_eq!(result.error_message().as_deref(), Some(r#"{"code":7}"#));
    }

    #[test]
    fn non_json_body_is_invalid_response() {
        let err = parse_result("<html>oops</html>").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidResponse { .. }));
        assert!(!err.is_transport());
    }

    #[test]
    fn status_mapping() {
        let e = classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down".into());
        assert!(e.is_rate_limited());
        assert!(e.is_transport());

        match classify_status(StatusCode::UNPROCESSABLE_ENTITY, r#"{"detail":"bad pdf"}"#.into()) {
            AnalysisError::Http { status, detail } => {
                assert_eq!(status, 422);
                assert!(detail.contains("bad pdf"));
            }
            other => panic!("unexpected: {other}"),
        }

        match classify_status(StatusCode::BAD_GATEWAY, String::new()) {
            AnalysisError::Http { status, detail } => {
                assert_eq!(status, 502);
                assert!(detail.contains("502"));
            }
            other => panic!("unexpected: {other}"),
        }
    }

    #[test]
    fn client_builds_from_config() {
        let config = PipelineConfig::builder()
            .api_url("http://127.0.0.1:9/analyze")
            .include_marginalia(false)
            .request_timeout_secs(3)
            .build()
            .unwrap();
        let client = AnalysisClient::new("key", &config).unwrap();
        assert_eq!(client.api_url, "http://127.0.0.1:9/analyze");
        assert!(!client.include_marginalia);
        assert!(client.include_metadata_in_markdown);
    }

    #[test]
    fn debug_redacts_api_key() {
        let client = AnalysisClient::new("sk-secret-123", &PipelineConfig::default()).unwrap();
        let shown = format!("{client:?}");
        assert!(!shown.contains("sk-secret-123"), "got: {shown}");
        assert!(shown.contains("<redacted>"));
        assert!(shown.contains(&client.api_url));
    }

    #[tokio::test]
    async fn unreadable_page_is_not_transport() {
        let client = AnalysisClient::new("key", &PipelineConfig::default()).unwrap();
        let err = client
            .analyze(Path::new("/definitely/not/a/page.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::ReadPage { .. }));
        assert!(!err.is_transport());
    }
}
