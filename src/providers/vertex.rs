use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::credentials::Credential;
use crate::errors::ProviderError;

use super::gemini::{GenerateResponse, build_request, parse_response};
use super::{Completion, CompletionClient, CompletionRequest, status_error, transport_error};

const DEFAULT_LOCATION: &str = "us-central1";

/// Client for Google Vertex AI hosted Gemini models.
///
/// Shares the generative wire shapes with [`super::gemini`]; only the
/// endpoint scheme and authentication differ. The credential's `api_key`
/// carries an OAuth access token, `project_id` and `location` select the
/// cloud project.
#[derive(Debug)]
pub struct VertexClient {
    /// HTTP client for API requests
    client: Client,
}

impl VertexClient {
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

    fn model_url(credential: &Credential, model: &str) -> Result<String, ProviderError> {
        // project_id presence is validated at pool construction; this guard
        // keeps the error typed if a hand-built credential slips through
        let project = credential
            .project_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                ProviderError::Credential("vertex credential missing project_id".to_string())
            })?;
        let location = credential.location.as_deref().unwrap_or(DEFAULT_LOCATION);

        Ok(format!(
            "https://{loc}-aiplatform.googleapis.com/v1/projects/{proj}/locations/{loc}/publishers/google/models/{model}:generateContent",
            loc = location,
            proj = project,
            model = model,
        ))
    }
}

#[async_trait]
impl CompletionClient for VertexClient {
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Completion, ProviderError> {
        let url = Self::model_url(credential, &request.model)?;
        let body = build_request(request);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&credential.api_key)
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
