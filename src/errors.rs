/*!
 * Error types for the yantwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 *
 * The retryable/fatal boundary for provider errors lives in one place,
 * [`ProviderError::is_retryable`], so the scheduler and retry controller never
 * have to reason about provider-specific failure codes.
 */

use thiserror::Error;

/// Errors that can occur when calling provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when sending an API request fails (DNS, connect, broken pipe)
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Request exceeded the configured hard timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Explicit rate-limit signal from the provider (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Server-side error (HTTP 5xx)
    #[error("API responded with server error: {status_code} - {message}")]
    ServerError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Malformed or rejected request (HTTP 400 and friends)
    #[error("API rejected the request: {status_code} - {message}")]
    InvalidRequest {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error with authentication (HTTP 401/403)
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Content-safety rejection from the provider
    #[error("Content blocked by provider: {0}")]
    ContentBlocked(String),

    /// Error when parsing a successful API response fails
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// The model returned an empty completion
    #[error("Provider returned an empty completion")]
    EmptyCompletion,

    /// Credential pool refused to issue a credential
    #[error("Credential error: {0}")]
    Credential(String),
}

impl ProviderError {
    /// Whether a dispatch that failed with this error may be retried.
    ///
    /// Timeouts, connection failures, 5xx responses, rate-limit signals and
    /// empty completions are transient. Authentication failures, malformed
    /// requests, safety rejections and unparseable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RequestFailed(_)
            | Self::Timeout(_)
            | Self::RateLimited(_)
            | Self::ServerError { .. }
            | Self::EmptyCompletion => true,
            Self::InvalidRequest { .. }
            | Self::Authentication(_)
            | Self::ContentBlocked(_)
            | Self::Parse(_)
            | Self::Credential(_) => false,
        }
    }
}

/// Startup configuration errors; these abort the run before any dispatch
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configured provider has no credentials in the secret store
    #[error("No credentials configured for provider '{0}'")]
    MissingCredentials(String),

    /// A credential record lacks material the provider variant requires
    #[error("Invalid credential for provider '{provider}': {reason}")]
    InvalidCredential {
        /// Provider name
        provider: String,
        /// What is missing or malformed
        reason: String,
    },

    /// A task configuration failed validation
    #[error("Invalid task configuration for '{task}': {reason}")]
    InvalidTask {
        /// Logical task name (content, title, retry)
        task: String,
        /// What failed validation
        reason: String,
    },

    /// The secret store or config file could not be read
    #[error("Failed to load configuration: {0}")]
    Load(String),
}

impl From<ConfigError> for ProviderError {
    fn from(error: ConfigError) -> Self {
        Self::Credential(error.to_string())
    }
}

/// Unit count mismatch between scheduler input and output.
///
/// This indicates a scheduler defect and is treated as fatal to avoid
/// silently corrupting document order.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Output outcome count differs from the input unit count
    #[error("Reconciliation mismatch: expected {expected} outcomes, got {actual}")]
    LengthMismatch {
        /// Number of input units
        expected: usize,
        /// Number of outcomes produced
        actual: usize,
    },

    /// An outcome references an ordinal outside the input range
    #[error("Reconciliation mismatch: outcome ordinal {0} has no input unit")]
    UnknownOrdinal(usize),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from reconciliation
    #[error("Reconciliation error: {0}")]
    Reconcile(#[from] ReconcileError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
