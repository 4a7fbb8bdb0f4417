//! Completion Client Adapter
//!
//! Thin boundary around an external text-completion service. The only module
//! that performs network I/O: one external call per `complete` invocation, no
//! internal retry, no state retained between calls. Retry policy belongs to
//! the caller, which can lean on the coordinator's idempotent caching.

use crate::error::QuillError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model configuration passed with every completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend model identifier (e.g. "llama3-70b-8192")
    pub model_name: String,
    /// Sampling randomness in [0, 1]
    pub temperature: f32,
    /// Token budget for the completion
    pub max_context: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_name: "llama3-70b-8192".to_string(),
            temperature: 0.7,
            max_context: 4096,
        }
    }
}

/// Completion service client trait.
///
/// Implementations make at most one external call per invocation and map
/// every underlying failure to `QuillError::Service`.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Send one rendered prompt and return the completion text.
    async fn complete(&self, prompt: &str, config: &ModelConfig) -> Result<String, QuillError>;

    /// Get the provider name for logging.
    fn provider_name(&self) -> &str;
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the service's error message out of an error-response body, falling
/// back to the raw body when it is not the expected JSON shape.
fn extract_error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.message)
        .unwrap_or_else(|| body.to_string())
}

fn with_detail(err: QuillError, detail: String) -> QuillError {
    if detail.trim().is_empty() {
        return err;
    }
    match err {
        QuillError::Service { kind, message } => QuillError::Service {
            kind,
            message: format!("{}: {}", message, detail),
        },
        other => other,
    }
}

/// Classify an HTTP status into the retry taxonomy: rate limits and server
/// errors are transient; auth, unknown-model, and other client errors are
/// fatal to the invocation.
pub(crate) fn classify_status(status: u16) -> QuillError {
    match status {
        429 => QuillError::transient(format!("Rate limit exceeded (status {})", status)),
        500..=599 => QuillError::transient(format!("Service unavailable (status {})", status)),
        401 | 403 => QuillError::fatal(format!("Authentication failed (status {})", status)),
        404 => QuillError::fatal(format!("Model not found (status {})", status)),
        _ => QuillError::fatal(format!("Request rejected (status {})", status)),
    }
}

fn map_http_error(error: reqwest::Error) -> QuillError {
    if let Some(status) = error.status() {
        return classify_status(status.as_u16());
    }
    if error.is_timeout() {
        QuillError::transient(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        QuillError::transient(format!("Connection error: {}", error))
    } else {
        QuillError::fatal(format!("HTTP error: {}", error))
    }
}

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Groq completion client (OpenAI-compatible chat completions API).
#[derive(Debug)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: String, base_url: Option<String>) -> Result<Self, QuillError> {
        let client = Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| QuillError::fatal(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| GROQ_BASE_URL.to_string()),
        })
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(&self, prompt: &str, config: &ModelConfig) -> Result<String, QuillError> {
        let request = ChatCompletionRequest {
            model: config.model_name.clone(),
            messages: vec![WireMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: config.temperature,
            max_tokens: config.max_context,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(with_detail(classify_status(status), extract_error_detail(&body)));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| QuillError::fatal(format!("Failed to parse response: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| QuillError::fatal("No choices in response".to_string()))
    }

    fn provider_name(&self) -> &str {
        "groq"
    }
}
