/*!
 * Mock provider implementations for testing.
 *
 * This module provides mock clients that simulate different behaviors:
 * - `MockClient::working()` - Always succeeds with translated text
 * - `MockClient::transient()` - Always fails with a retryable error
 * - `MockClient::fatal()` - Always fails with a non-retryable error
 * - `MockClient::fail_once_for(..)` - Fails the first attempt for chosen units
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::credentials::Credential;
use crate::errors::ProviderError;

use super::{Completion, CompletionClient, CompletionRequest};

/// Behavior mode for the mock client
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Always succeeds with a proper translation
    Working,
    /// Always fails with a retryable error (503)
    Transient,
    /// Always fails with a non-retryable authentication error
    Fatal,
    /// Always fails with a content-safety rejection
    Blocked,
    /// Fails the first attempt for prompts containing one of the needles,
    /// succeeds afterwards
    FailOnce,
    /// Succeeds after a fixed delay (for timeout/ordering testing)
    Slow {
        /// Delay before responding, milliseconds
        delay_ms: u64,
    },
    /// Succeeds after a pseudo-random delay up to the bound
    Jitter {
        /// Upper bound for the delay, milliseconds
        max_delay_ms: u64,
    },
}

/// Mock client for testing orchestration behavior
#[derive(Debug)]
pub struct MockClient {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter, shared between clones
    request_count: Arc<AtomicUsize>,
    /// Outstanding first-attempt failures for `FailOnce`
    pending_failures: Arc<Mutex<HashSet<String>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&CompletionRequest) -> String>,
}

impl MockClient {
    /// Create a new mock client with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            pending_failures: Arc::new(Mutex::new(HashSet::new())),
            custom_response: None,
        }
    }

    /// Create a working mock client that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create a mock client that always fails with a retryable error
    pub fn transient() -> Self {
        Self::new(MockBehavior::Transient)
    }

    /// Create a mock client that always fails with a fatal error
    pub fn fatal() -> Self {
        Self::new(MockBehavior::Fatal)
    }

    /// Create a mock client that always reports a content-safety rejection
    pub fn blocked() -> Self {
        Self::new(MockBehavior::Blocked)
    }

    /// Create a mock client that fails the first attempt for any prompt
    /// containing one of the given needles, then succeeds
    pub fn fail_once_for(needles: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let client = Self::new(MockBehavior::FailOnce);
        {
            let mut pending = client.pending_failures.lock();
            pending.extend(needles.into_iter().map(Into::into));
        }
        client
    }

    /// Create a mock client that responds after a fixed delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Create a mock client with pseudo-random response delays
    pub fn jitter(max_delay_ms: u64) -> Self {
        Self::new(MockBehavior::Jitter { max_delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&CompletionRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Total number of completed `complete` calls across clones
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    fn success(&self, request: &CompletionRequest) -> Completion {
        let text = if let Some(generator) = self.custom_response {
            generator(request)
        } else {
            format!("[translated] {}", request.user_prompt)
        };
        Completion {
            text,
            prompt_tokens: Some(request.user_prompt.len() as u64),
            completion_tokens: Some((request.user_prompt.len() / 2) as u64),
            thinking_tokens: None,
        }
    }
}

impl Clone for MockClient {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior.clone(),
            request_count: Arc::clone(&self.request_count),
            pending_failures: Arc::clone(&self.pending_failures),
            custom_response: self.custom_response,
        }
    }
}

#[async_trait]
impl CompletionClient for MockClient {
    async fn complete(
        &self,
        _credential: &Credential,
        request: &CompletionRequest,
    ) -> Result<Completion, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);

        match self.behavior {
            MockBehavior::Working => Ok(self.success(request)),

            MockBehavior::Transient => Err(ProviderError::ServerError {
                status_code: 503,
                message: format!("simulated transient failure (request #{})", count + 1),
            }),

            MockBehavior::Fatal => Err(ProviderError::Authentication(
                "simulated invalid API key".to_string(),
            )),

            MockBehavior::Blocked => Err(ProviderError::ContentBlocked(
                "simulated safety rejection".to_string(),
            )),

            MockBehavior::FailOnce => {
                let failed = {
                    let mut pending = self.pending_failures.lock();
                    let hit = pending
                        .iter()
                        .find(|needle| request.user_prompt.contains(needle.as_str()))
                        .cloned();
                    if let Some(needle) = &hit {
                        pending.remove(needle);
                    }
                    hit.is_some()
                };
                if failed {
                    Err(ProviderError::RateLimited(
                        "simulated first-attempt rate limit".to_string(),
                    ))
                } else {
                    Ok(self.success(request))
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.success(request))
            }

            MockBehavior::Jitter { max_delay_ms } => {
                // Knuth multiplicative hash of the counter; deterministic but scrambled
                let delay = if max_delay_ms == 0 {
                    0
                } else {
                    (count as u64).wrapping_mul(2654435761) % max_delay_ms
                };
                tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
                Ok(self.success(request))
            }
        }
    }
}
