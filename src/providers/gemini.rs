use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::credentials::Credential;
use crate::errors::ProviderError;

use super::{Completion, CompletionClient, CompletionRequest, status_error, transport_error};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Google Gemini generative API
#[derive(Debug)]
pub struct GeminiClient {
    /// HTTP client for API requests
    client: Client,
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateRequest<'a> {
    pub(crate) system_instruction: ContentPart<'a>,
    pub(crate) contents: Vec<RoleContent<'a>>,
    pub(crate) generation_config: GenerationConfig,
    pub(crate) safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ContentPart<'a> {
    pub(crate) parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextPart<'a> {
    pub(crate) text: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RoleContent<'a> {
    pub(crate) role: &'a str,
    pub(crate) parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationConfig {
    pub(crate) temperature: f32,
    pub(crate) max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ThinkingConfig {
    pub(crate) thinking_budget: u32,
}

/// Safety setting; all categories are turned off for translation work
#[derive(Debug, Serialize)]
pub(crate) struct SafetySetting {
    pub(crate) category: &'static str,
    pub(crate) threshold: &'static str,
}

/// generateContent response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) prompt_feedback: Option<PromptFeedback>,
    pub(crate) usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    pub(crate) content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidatePart {
    #[serde(default)]
    pub(crate) text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PromptFeedback {
    pub(crate) block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UsageMetadata {
    pub(crate) prompt_token_count: Option<u64>,
    pub(crate) candidates_token_count: Option<u64>,
    pub(crate) thoughts_token_count: Option<u64>,
}

/// Whether a model supports a thinking phase (Gemini 2.5 series)
pub(crate) fn supports_thinking(model: &str) -> bool {
    let lower = model.to_lowercase();
    lower.contains("2.5") || lower.contains("2-5")
}

/// Safety settings with every harm category disabled
pub(crate) fn safety_off() -> Vec<SafetySetting> {
    [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ]
    .into_iter()
    .map(|category| SafetySetting { category, threshold: "OFF" })
    .collect()
}

/// Build the shared generative request body from the uniform request
pub(crate) fn build_request(request: &CompletionRequest) -> GenerateRequest<'_> {
    let thinking_config = match request.thinking_budget {
        Some(budget) if supports_thinking(&request.model) => {
            Some(ThinkingConfig { thinking_budget: budget })
        }
        _ => None,
    };

    GenerateRequest {
        system_instruction: ContentPart {
            parts: vec![TextPart { text: &request.system_prompt }],
        },
        contents: vec![RoleContent {
            role: "user",
            parts: vec![TextPart { text: &request.user_prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            max_output_tokens: request.max_tokens,
            thinking_config,
        },
        safety_settings: safety_off(),
    }
}

/// Turn the shared generative response into a uniform completion
pub(crate) fn parse_response(response: GenerateResponse) -> Result<Completion, ProviderError> {
    if response.candidates.is_empty() {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "unknown block reason".to_string());
        return Err(ProviderError::ContentBlocked(reason));
    }

    let text: String = response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content.parts.iter().map(|p| p.text.as_str()).collect::<Vec<_>>().join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ProviderError::EmptyCompletion);
    }

    let (prompt_tokens, completion_tokens, thinking_tokens) = match &response.usage_metadata {
        Some(usage) => (
            usage.prompt_token_count,
            usage.candidates_token_count,
            usage.thoughts_token_count,
        ),
        None => (None, None, None),
    };

    Ok(Completion { text, prompt_tokens, completion_tokens, thinking_tokens })
}

impl GeminiClient {
    /// Create a new client with the given request timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .pool_idle_timeout(Duration::from_secs(90))
                .build()
                .unwrap_or_default(),
        }
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Completion, ProviderError> {
        let url = format!("{}/models/{}:generateContent", API_BASE, request.model);
        let body = build_request(request);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &credential.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            return Err(status_error(status, error_text));
        }

        let parsed = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        parse_response(parsed)
    }
}
