/*!
 * Credential store and rotation pool.
 *
 * Secrets are loaded once at process start from a JSON key-value store keyed
 * by provider name, each entry holding one or more credential records. The
 * [`CredentialPool`] issues credentials round-robin with one atomic cursor per
 * provider, so any number of concurrent dispatches can draw credentials
 * without lost updates.
 */

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Deserialize;

use crate::app_config::Provider;
use crate::errors::ConfigError;

/// Opaque authentication material plus connection parameters for one provider.
///
/// Loaded at startup, held for the process lifetime, never mutated.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Credential {
    /// API key or bearer access token
    #[serde(default)]
    pub api_key: String,

    /// Base URL override (OpenAI-compatible endpoints)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Cloud project identifier (Vertex)
    #[serde(default)]
    pub project_id: Option<String>,

    /// Cloud region (Vertex)
    #[serde(default)]
    pub location: Option<String>,
}

impl Credential {
    /// Masked form of the key for log output, never the full material
    pub fn masked_key(&self) -> String {
        let key = &self.api_key;
        if key.chars().count() > 14 {
            let head: String = key.chars().take(10).collect();
            let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            format!("{}...{}", head, tail)
        } else {
            key.clone()
        }
    }
}

/// Raw secret store: provider name -> ordered credential list
pub type CredentialStore = HashMap<String, Vec<Credential>>;

/// Load the secret store from a JSON file.
///
/// Absence of the store is a startup-time fatal configuration error.
pub fn load_store(path: impl AsRef<Path>) -> Result<CredentialStore, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Load(format!("secret store {} unreadable: {}", path.display(), e))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        ConfigError::Load(format!("secret store {} malformed: {}", path.display(), e))
    })
}

struct ProviderSlot {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

/// Round-robin credential pool, safe for concurrent issuance.
///
/// The cursor advances on every acquisition regardless of call outcome and
/// wraps modulo the credential list length. Concurrent requests may receive
/// the same credential when the pool is smaller than the in-flight count;
/// that is expected, rotation stays strictly sequential.
pub struct CredentialPool {
    slots: HashMap<Provider, ProviderSlot>,
}

impl CredentialPool {
    /// Build a pool from the secret store for the given providers.
    ///
    /// Fails fast when a required provider has zero credentials or a
    /// credential lacks material its provider variant needs.
    pub fn from_store(
        store: &CredentialStore,
        required: &[Provider],
    ) -> Result<Self, ConfigError> {
        let mut slots = HashMap::new();

        for &provider in required {
            let name = provider.to_lowercase_string();
            let credentials = store.get(&name).cloned().unwrap_or_default();
            if credentials.is_empty() {
                return Err(ConfigError::MissingCredentials(name));
            }

            for credential in &credentials {
                validate_credential(provider, credential)?;
            }

            log::info!(
                "Loaded {} {} credential(s) (round-robin)",
                credentials.len(),
                provider.display_name()
            );
            for (i, credential) in credentials.iter().enumerate() {
                log::debug!("  {} key {}: {}", name, i + 1, credential.masked_key());
            }

            slots.insert(
                provider,
                ProviderSlot { credentials, cursor: AtomicUsize::new(0) },
            );
        }

        Ok(Self { slots })
    }

    /// Pool holding no credentials at all.
    ///
    /// Mock-backed services never draw from the pool, so they share this.
    pub fn empty() -> Self {
        Self { slots: HashMap::new() }
    }

    /// Issue the next credential for a provider, round-robin.
    ///
    /// The increment-and-read is a single atomic step; this never blocks.
    pub fn acquire(&self, provider: Provider) -> Result<&Credential, ConfigError> {
        let slot = self
            .slots
            .get(&provider)
            .ok_or_else(|| ConfigError::MissingCredentials(provider.to_lowercase_string()))?;
        let index = slot.cursor.fetch_add(1, Ordering::Relaxed) % slot.credentials.len();
        Ok(&slot.credentials[index])
    }

    /// Number of credentials held for a provider
    pub fn credential_count(&self, provider: Provider) -> usize {
        self.slots.get(&provider).map_or(0, |s| s.credentials.len())
    }
}

fn validate_credential(provider: Provider, credential: &Credential) -> Result<(), ConfigError> {
    match provider {
        Provider::OpenAi | Provider::Gemini => {
            if credential.api_key.is_empty() {
                return Err(ConfigError::InvalidCredential {
                    provider: provider.to_lowercase_string(),
                    reason: "api_key is empty".to_string(),
                });
            }
        }
        Provider::Vertex => {
            if credential.api_key.is_empty() {
                return Err(ConfigError::InvalidCredential {
                    provider: provider.to_lowercase_string(),
                    reason: "access token (api_key) is empty".to_string(),
                });
            }
            if credential.project_id.as_deref().unwrap_or("").is_empty() {
                return Err(ConfigError::InvalidCredential {
                    provider: provider.to_lowercase_string(),
                    reason: "project_id is required".to_string(),
                });
            }
        }
    }
    Ok(())
}
