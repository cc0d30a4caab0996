/*!
 * Provider implementations for different translation backends.
 *
 * This module contains client implementations for the supported AI
 * text-completion provider families:
 * - OpenAI: OpenAI-compatible chat-completion APIs (OpenAI, DeepSeek, ...)
 * - Gemini: Google Gemini generative API
 * - Vertex: Google Vertex AI (cloud-hosted Gemini)
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::credentials::Credential;
use crate::errors::ProviderError;

/// Uniform completion request handed to every provider variant.
///
/// Variants differ only in wire-level request construction and response
/// parsing; callers never see the difference.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Model identifier
    pub model: String,
    /// System prompt guiding the translation
    pub system_prompt: String,
    /// User prompt (the text to translate, with instructions)
    pub user_prompt: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum completion tokens
    pub max_tokens: u32,
    /// Thinking-token budget for models that support it; Some(0) disables
    pub thinking_budget: Option<u32>,
}

/// Uniform completion response
#[derive(Debug, Clone)]
pub struct Completion {
    /// The generated text
    pub text: String,
    /// Prompt token count, when the provider reports it
    pub prompt_tokens: Option<u64>,
    /// Completion token count, when the provider reports it
    pub completion_tokens: Option<u64>,
    /// Thinking/reasoning token count, when the provider reports it
    pub thinking_tokens: Option<u64>,
}

/// Common trait for all completion providers.
///
/// Implementations hide provider-specific request/response shape and failure
/// codes behind [`ProviderError`]; the scheduler is oblivious to which
/// variant it holds. The credential is passed per call so that every request
/// draws fresh from the rotation pool.
#[async_trait]
pub trait CompletionClient: Send + Sync + Debug {
    /// Complete a request using this provider
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Completion, ProviderError>;
}

/// Map a reqwest transport failure onto the provider error taxonomy
pub(crate) fn transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map a non-success HTTP status onto the provider error taxonomy.
///
/// 401/403 are authentication failures, 429 is an explicit rate-limit
/// signal, 5xx is retryable, anything else client-side is a malformed
/// request.
pub(crate) fn status_error(status: reqwest::StatusCode, body: String) -> ProviderError {
    let code = status.as_u16();
    match code {
        401 | 403 => ProviderError::Authentication(body),
        429 => ProviderError::RateLimited(body),
        _ if status.is_server_error() => ProviderError::ServerError {
            status_code: code,
            message: body,
        },
        _ => ProviderError::InvalidRequest { status_code: code, message: body },
    }
}

pub mod gemini;
pub mod mock;
pub mod openai;
pub mod vertex;
