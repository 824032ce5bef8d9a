//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ServiceError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// A text generation service: one prompt in, one block of text out.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;
}

#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    /// Without trailing slash, e.g. `https://generativelanguage.googleapis.com`.
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(config.api_key.trim())
            .map_err(|_| ServiceError::InvalidApiKey)?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );
        Ok(Self {
            client,
            endpoint,
            model: config.model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl Summarizer for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "calling generateContent");
        let resp = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        parse_response(status, &text)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<u16>,
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<Value>,
}

impl ApiError {
    /// `retryDelay` of a `google.rpc.RetryInfo` detail, e.g. `"38s"`.
    fn retry_delay(&self) -> Option<Duration> {
        self.details
            .iter()
            .filter_map(|d| d.get("retryDelay")?.as_str())
            .find_map(parse_delay)
    }

    fn into_service_error(self, http_status: u16) -> ServiceError {
        let status = self.code.unwrap_or(http_status);
        let throttled = status == 429 || self.status.as_deref() == Some("RESOURCE_EXHAUSTED");
        if throttled {
            let retry_after = self.retry_delay();
            ServiceError::RateLimited {
                message: self.message,
                retry_after,
            }
        } else {
            ServiceError::Status {
                status,
                message: self.message,
            }
        }
    }
}

fn parse_delay(raw: &str) -> Option<Duration> {
    let secs: f64 = raw.trim().strip_suffix('s')?.parse().ok()?;
    Duration::try_from_secs_f64(secs).ok()
}

/// Turn a status code and body into generated text or a classified error.
/// An error object in the body counts even under a success status.
fn parse_response(status: u16, body: &str) -> Result<String, ServiceError> {
    if !(200..300).contains(&status) {
        return Err(match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => envelope.error.into_service_error(status),
            Err(_) if status == 429 => ServiceError::RateLimited {
                message: body.to_string(),
                retry_after: None,
            },
            Err(_) => ServiceError::Status {
                status,
                message: body.to_string(),
            },
        });
    }

    let parsed: GenerateResponse = serde_json::from_str(body)?;
    if let Some(error) = parsed.error {
        return Err(error.into_service_error(status));
    }
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .ok_or(ServiceError::NoCandidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_candidate_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"[{\"point\":\"a\",\"refs\":[0]}]"}],"role":"model"},"finishReason":"STOP"}]}"#;
        assert_eq!(
            parse_response(200, body).unwrap(),
            r#"[{"point":"a","refs":[0]}]"#
        );
    }

    #[test]
    fn no_candidates() {
        assert!(matches!(
            parse_response(200, r#"{"candidates":[]}"#),
            Err(ServiceError::NoCandidates)
        ));
        assert!(matches!(
            parse_response(200, r#"{"candidates":[{"finishReason":"SAFETY"}]}"#),
            Err(ServiceError::NoCandidates)
        ));
    }

    #[test]
    fn quota_error_is_rate_limited_with_hint() {
        let body = r#"{"error":{"code":429,"message":"You exceeded your current quota. Please retry in 38.402350949s.","status":"RESOURCE_EXHAUSTED","details":[{"@type":"type.googleapis.com/google.rpc.RetryInfo","retryDelay":"38s"}]}}"#;
        match parse_response(429, body) {
            Err(ServiceError::RateLimited {
                message,
                retry_after,
            }) => {
                assert!(message.contains("Please retry in 38.402350949s"));
                assert_eq!(retry_after, Some(Duration::from_secs(38)));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resource_exhausted_under_other_code_is_rate_limited() {
        let body = r#"{"error":{"code":503,"message":"busy","status":"RESOURCE_EXHAUSTED"}}"#;
        assert!(parse_response(503, body).unwrap_err().is_transient());
    }

    #[test]
    fn plain_429_body_is_rate_limited() {
        assert!(parse_response(429, "Too Many Requests").unwrap_err().is_transient());
    }

    #[test]
    fn other_status_is_permanent() {
        let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
        match parse_response(400, body) {
            Err(ServiceError::Status { status, message }) => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid.");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            parse_response(502, "<html>bad gateway</html>"),
            Err(ServiceError::Status { status: 502, .. })
        ));
    }

    #[test]
    fn error_object_under_success_status() {
        let body = r#"{"error":{"code":429,"message":"Please retry in 1s"}}"#;
        assert!(parse_response(200, body).unwrap_err().is_transient());
    }

    #[test]
    fn delay_strings() {
        assert_eq!(parse_delay("38s"), Some(Duration::from_secs(38)));
        assert_eq!(parse_delay("1.5s"), Some(Duration::from_millis(1_500)));
        assert_eq!(parse_delay("soon"), None);
        assert_eq!(parse_delay("99999999999999999999999s"), None);
        assert_eq!(parse_delay("-1s"), None);
    }

    #[test]
    fn endpoint_and_redacted_debug() {
        let mut config = GeminiConfig::new("secret-key");
        config.base_url = "http://localhost:9000/".into();
        let client = GeminiClient::new(config.clone()).unwrap();
        assert_eq!(
            client.endpoint,
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(!format!("{config:?}").contains("secret-key"));
    }
}
