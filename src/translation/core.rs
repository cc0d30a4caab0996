/*!
 * Core translation service.
 *
 * One [`TranslationService`] wraps one provider client plus the task
 * options that shape its requests. The concrete client variant is chosen
 * once at construction; everything above this layer dispatches through
 * the uniform [`CompletionClient`] contract and stays provider-agnostic.
 */

use std::sync::Arc;

use crate::app_config::{Provider, TaskConfig};
use crate::credentials::{Credential, CredentialPool};
use crate::errors::{ConfigError, ProviderError};
use crate::providers::gemini::GeminiClient;
use crate::providers::mock::MockClient;
use crate::providers::openai::OpenAiClient;
use crate::providers::vertex::VertexClient;
use crate::providers::{Completion, CompletionClient, CompletionRequest};

use super::formatting;

/// Concrete client behind a service, selected from the task's provider tag
#[derive(Debug)]
enum ClientImpl {
    OpenAi(OpenAiClient),
    Gemini(GeminiClient),
    Vertex(VertexClient),
    Mock(MockClient),
}

/// Translation service bound to one provider and one set of task options
#[derive(Clone)]
pub struct TranslationService {
    /// Underlying provider client
    client: Arc<ClientImpl>,

    /// Task options shaping every request
    task: TaskConfig,

    /// Credential pool drawn from on each request
    pool: Arc<CredentialPool>,

    /// System prompt sent with every request
    system_prompt: String,
}

impl TranslationService {
    /// Create a service for the task's configured provider.
    ///
    /// The pool must already hold credentials for that provider.
    pub fn new(
        task: TaskConfig,
        pool: Arc<CredentialPool>,
        system_prompt: String,
    ) -> Result<Self, ConfigError> {
        let client = match task.provider {
            Provider::OpenAi => ClientImpl::OpenAi(OpenAiClient::new(task.timeout_secs)),
            Provider::Gemini => ClientImpl::Gemini(GeminiClient::new(task.timeout_secs)),
            Provider::Vertex => ClientImpl::Vertex(VertexClient::new(task.timeout_secs)),
        };

        if pool.credential_count(task.provider) == 0 {
            return Err(ConfigError::MissingCredentials(
                task.provider.to_lowercase_string(),
            ));
        }

        Ok(Self { client: Arc::new(client), task, pool, system_prompt })
    }

    /// Create a service backed by a mock client. Test support.
    pub fn with_mock(mock: MockClient, task: TaskConfig, system_prompt: String) -> Self {
        Self {
            client: Arc::new(ClientImpl::Mock(mock)),
            task,
            pool: Arc::new(CredentialPool::empty()),
            system_prompt,
        }
    }

    /// Task options this service was built with
    pub fn task(&self) -> &TaskConfig {
        &self.task
    }

    /// Translate one segment body.
    ///
    /// Draws the next credential from the pool, issues a single request,
    /// and cleans the completion text for storage. Errors are returned
    /// classified; retry policy lives with the caller.
    pub async fn translate_content(&self, text: &str) -> Result<Completion, ProviderError> {
        let mut completion = self.request(text).await?;
        completion.text = formatting::clean_content(&completion.text);
        if completion.text.is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(completion)
    }

    /// Translate one chapter title, flattening the result to a single line
    pub async fn translate_title(&self, title: &str) -> Result<Completion, ProviderError> {
        let mut completion = self.request(title).await?;
        completion.text = formatting::clean_title(&completion.text);
        if completion.text.is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }
        Ok(completion)
    }

    async fn request(&self, text: &str) -> Result<Completion, ProviderError> {
        let request = CompletionRequest {
            model: self.task.model_name(),
            system_prompt: self.system_prompt.clone(),
            user_prompt: text.to_string(),
            temperature: self.task.temperature,
            max_tokens: self.task.max_tokens,
            thinking_budget: self.task.thinking_budget,
        };

        match self.client.as_ref() {
            ClientImpl::OpenAi(client) => {
                let credential = self.pool.acquire(self.task.provider)?;
                client.complete(credential, &request).await
            }
            ClientImpl::Gemini(client) => {
                let credential = self.pool.acquire(self.task.provider)?;
                client.complete(credential, &request).await
            }
            ClientImpl::Vertex(client) => {
                let credential = self.pool.acquire(self.task.provider)?;
                client.complete(credential, &request).await
            }
            // Mock clients authenticate nothing, so the pool stays untouched
            ClientImpl::Mock(client) => client.complete(&Credential::default(), &request).await,
        }
    }
}
