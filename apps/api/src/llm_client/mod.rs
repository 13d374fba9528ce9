//! LLM Client: the single point of entry for all generative-AI calls.
//!
//! No other module calls the AI service directly. Callers depend on the
//! `TextGenerator` trait; `GeminiClient` is the production backend.
//!
//! Failures are classified into `AiError` kinds and returned as-is. This module
//! never retries: re-running a paid generation is the caller's decision.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::errors::ErrorKind;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    /// Credential or configuration problem. Retrying will not help.
    #[error("{0}")]
    AuthFailure(String),

    #[error("{0}")]
    QuotaOrRateLimit(String),

    #[error("{0}")]
    Timeout(String),

    /// The service answered, but not with usable text.
    #[error("{0}")]
    MalformedResponse(String),

    #[error("{0}")]
    Unavailable(String),
}

impl AiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AiError::AuthFailure(_) => ErrorKind::AuthFailure,
            AiError::QuotaOrRateLimit(_) => ErrorKind::QuotaOrRateLimit,
            AiError::Timeout(_) => ErrorKind::Timeout,
            AiError::MalformedResponse(_) => ErrorKind::MalformedResponse,
            AiError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }
}

/// Backend-agnostic text generation. Carried in `AppState` as `Arc<dyn TextGenerator>`.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One outbound call per invocation; returns the generated text.
    async fn invoke(&self, prompt: &str) -> Result<String, AiError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types (Generative Language API, generateContent)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, if any are non-blank.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini backend
// ────────────────────────────────────────────────────────────────────────────

/// Production `TextGenerator` backed by the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: Option<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model: model.into(),
            base_url: base_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.ai_credential.clone(),
            config.ai_model.clone(),
            config.ai_base_url.clone(),
            config.ai_timeout(),
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn invoke(&self, prompt: &str) -> Result<String, AiError> {
        let Some(api_key) = self.api_key.as_deref() else {
            error!("Cannot call AI service: API key was not loaded.");
            return Err(AiError::AuthFailure("API Key not configured.".to_string()));
        };

        let request_body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        info!("Sending request to AI service (model: {})", self.model);
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(classify_transport_error)?;

        if !status.is_success() {
            warn!("AI service returned {}: {}", status, body);
            return Err(classify_status(status.as_u16(), &body));
        }

        info!("Received response from AI service.");
        parse_generation(&body)
    }
}

fn classify_transport_error(e: reqwest::Error) -> AiError {
    if e.is_timeout() {
        error!("AI service call timed out: {e}");
        AiError::Timeout("The AI service did not respond in time. Please try again.".to_string())
    } else {
        error!("AI service call failed: {e}");
        AiError::Unavailable(format!("The AI service could not be reached: {e}"))
    }
}

/// Maps a non-success HTTP status (plus the service's error body) onto an `AiError`.
fn classify_status(status: u16, body: &str) -> AiError {
    let api_error = serde_json::from_str::<ApiErrorEnvelope>(body)
        .map(|e| e.error)
        .unwrap_or_default();
    let message = if api_error.message.is_empty() {
        format!("HTTP {status}")
    } else {
        api_error.message.clone()
    };
    let lower = message.to_lowercase();

    match status {
        401 | 403 => AiError::AuthFailure(format!("Permission Error: {message}")),
        404 => AiError::AuthFailure(format!("Model Error: {message}")),
        429 => AiError::QuotaOrRateLimit(format!(
            "The AI service quota or rate limit was reached. Please try again later. ({message})"
        )),
        _ if lower.contains("api key") => {
            AiError::AuthFailure("Authentication Error: Invalid API key.".to_string())
        }
        _ if lower.contains("billing") => AiError::AuthFailure(
            "Billing Error: Check the AI service project's billing status.".to_string(),
        ),
        _ if api_error.status == "RESOURCE_EXHAUSTED" => AiError::QuotaOrRateLimit(format!(
            "The AI service quota or rate limit was reached. Please try again later. ({message})"
        )),
        504 => AiError::Timeout(format!("The AI service timed out: {message}")),
        _ if api_error.status == "DEADLINE_EXCEEDED" => {
            AiError::Timeout(format!("The AI service timed out: {message}"))
        }
        _ => AiError::Unavailable(format!(
            "The AI service is temporarily unavailable: {message}"
        )),
    }
}

fn parse_generation(body: &str) -> Result<String, AiError> {
    let response: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        warn!("AI response could not be parsed: {e}");
        AiError::MalformedResponse("AI response format was unexpected or empty.".to_string())
    })?;

    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        warn!("AI request blocked. Reason: {reason}");
        return Err(AiError::MalformedResponse(format!(
            "AI request blocked: {reason}. Review inputs."
        )));
    }

    if let Some(usage) = &response.usage_metadata {
        debug!(
            "AI call succeeded: prompt_tokens={}, output_tokens={}",
            usage.prompt_token_count, usage.candidates_token_count
        );
    }

    response.text().ok_or_else(|| {
        let finish_reason = response
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
            .unwrap_or("none");
        warn!("AI response received, but no text content found (finish_reason={finish_reason}).");
        AiError::MalformedResponse("AI response format was unexpected or empty.".to_string())
    })
}
