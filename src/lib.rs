/*!
 * # YANTwAI - Yet Another Novel Translation with AI
 *
 * A Rust library for translating segmented novel documents with AI.
 *
 * ## Features
 *
 * - Translate YAML segment documents chapter by chapter
 * - Multiple AI providers behind one dispatch contract:
 *   - OpenAI-compatible chat APIs (OpenAI, DeepSeek, ...)
 *   - Google Gemini API
 *   - Google Vertex AI
 * - Round-robin rotation over multiple credentials per provider
 * - Bounded concurrency with paced dispatch starts
 * - Automatic retry rounds with a separate retry task configuration
 * - Ordered reconciliation: output always matches input length and order
 * - Machine-readable failure reports consumed by standalone retry runs
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `credentials`: Secret store and round-robin credential pool
 * - `segment_processor`: Segment document handling and unit derivation
 * - `translation`: AI-powered translation orchestration:
 *   - `translation::core`: Provider-bound translation service
 *   - `translation::governor`: Concurrency ceiling and pacing
 *   - `translation::scheduler`: Concurrent dispatch rounds
 *   - `translation::retry`: Multi-round retry orchestration
 *   - `translation::reconcile`: Folding outcomes into records
 *   - `translation::report`: Progress sinks and run logs
 * - `app_controller`: Main application controller
 * - `providers`: Client implementations for the supported providers:
 *   - `providers::openai`: OpenAI-compatible chat client
 *   - `providers::gemini`: Gemini API client
 *   - `providers::vertex`: Vertex AI client
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod credentials;
pub mod errors;
pub mod providers;
pub mod segment_processor;
pub mod translation;

// Re-export main types for easier usage
pub use app_config::{Config, Provider, TaskConfig};
pub use app_controller::Controller;
pub use credentials::{Credential, CredentialPool, CredentialStore};
pub use errors::{AppError, ProviderError};
pub use segment_processor::SegmentRecord;
pub use translation::{CancelFlag, RetryController, TranslationService};
