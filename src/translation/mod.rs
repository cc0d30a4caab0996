/*!
 * Translation orchestration.
 *
 * This module contains the machinery that turns a batch of segment
 * units into settled translations:
 *
 * - `core`: provider-bound translation service
 * - `formatting`: cleanup of raw model output
 * - `governor`: concurrency ceiling and dispatch pacing
 * - `scheduler`: one concurrent round over pending units
 * - `retry`: multi-round retry orchestration
 * - `reconcile`: folding outcomes back into segment records
 * - `report`: progress sinks and per-run log files
 */

pub mod core;
pub mod formatting;
pub mod governor;
pub mod reconcile;
pub mod report;
pub mod retry;
pub mod scheduler;

pub use self::core::TranslationService;
pub use governor::Governor;
pub use reconcile::{FailureEntry, FailureReport};
pub use report::{NullSink, ProgressSink, RunLogger};
pub use retry::{BatchResult, FinalState, RetryController, TaskRunner, UnitOutcome};
pub use scheduler::{AttemptState, CancelFlag, Unit, UnitKind};
