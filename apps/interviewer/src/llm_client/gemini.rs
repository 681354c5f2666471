//! Google Gemini `generateContent` backend.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{LlmError, TextGenerator};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for every call.
/// This is intentionally hardcoded to prevent accidental drift.
pub const MODEL: &str = "gemini-2.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub prompt_feedback: Option<PromptFeedback>,
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
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }

    fn empty_reason(&self) -> String {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return format!("prompt blocked: {reason}");
        }
        match self.candidates.first() {
            None => "no candidates returned".to_string(),
            Some(c) => format!(
                "candidate finished with {}",
                c.finish_reason.as_deref().unwrap_or("no reason")
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

/// Wraps the Gemini REST API. Holds no retry logic; `ModelClient` owns that.
#[derive(Clone)]
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(api_key: String) -> Result<Self, reqwest::Error> {
        Self::with_base_url(api_key, GEMINI_API_BASE.to_string())
    }

    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, reqwest::Error> {
        Ok(Self {
            // Per-attempt timeouts are applied by ModelClient.
            client: Client::builder().build()?,
            api_key,
            base_url,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, MODEL)
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let request_body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![RequestPart { text: system }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: MAX_OUTPUT_TOKENS,
                response_mime_type: "text/plain",
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| LlmError::Transient(format!("HTTP error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(classify_status(status, message));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::EmptyResponse(format!("undecodable response body: {e}")))?;

        if let Some(usage) = &body.usage_metadata {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        body.text()
            .ok_or_else(|| LlmError::EmptyResponse(body.empty_reason()))
    }

    fn model(&self) -> &str {
        MODEL
    }
}

/// Maps a non-success status onto the client's failure taxonomy.
fn classify_status(status: StatusCode, message: String) -> LlmError {
    let code = status.as_u16();
    match code {
        401 | 403 | 429 => LlmError::Quota {
            status: code,
            message,
        },
        408 => LlmError::Transient(format!("status {code}: {message}")),
        _ if status.is_server_error() => LlmError::Transient(format!("status {code}: {message}")),
        _ => LlmError::Rejected {
            status: code,
            message,
        },
    }
}
