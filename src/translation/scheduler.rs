/*!
 * Concurrent round scheduler.
 *
 * A round dispatches every pending unit through the governor, collects
 * per-unit outcomes as they land in completion order, and restores
 * submission order before handing the round back. The scheduler knows
 * nothing about providers; it sees only the service contract.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::providers::Completion;

use super::core::TranslationService;
use super::governor::Governor;
use super::report::ProgressSink;

/// What a unit is, which shapes the cleanup applied to its completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Segment body text
    Content,
    /// Chapter title
    Title,
}

/// One schedulable piece of work
#[derive(Debug, Clone)]
pub struct Unit {
    /// Stable identifier, unique within a run
    pub id: String,

    /// Position in the source document; outcomes are returned in this order
    pub ordinal: usize,

    /// Source text to translate
    pub text: String,

    /// Content or title
    pub kind: UnitKind,
}

/// Cooperative cancellation flag shared across a run.
///
/// Checked before each dispatch; in-flight requests are left to finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Units not yet dispatched resolve as retryable.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Result of one attempt at one unit
#[derive(Debug, Clone)]
pub enum AttemptState {
    /// Cleaned completion
    Success(Completion),
    /// Failed in a way worth another attempt
    Retryable(String),
    /// Failed in a way no retry can fix
    Fatal(String),
}

/// Per-unit outcome of a round
#[derive(Debug)]
pub struct RoundOutcome {
    /// Index into the slice the round was given
    pub index: usize,

    /// State the attempt ended in
    pub state: AttemptState,

    /// Wall time of the attempt, dispatch to completion
    pub elapsed: Duration,
}

/// Dispatch one round over the given units.
///
/// All units are dispatched concurrently under the governor's ceiling
/// and pacing. Outcomes come back sorted by unit index regardless of
/// completion order. Units reached after cancellation resolve as
/// retryable without touching the network.
pub async fn run_round(
    units: &[Unit],
    service: &TranslationService,
    governor: &Governor,
    cancel: &CancelFlag,
    sink: &Arc<dyn ProgressSink>,
    attempt: u32,
) -> Vec<RoundOutcome> {
    let concurrency = governor_width(governor, units.len());

    let mut outcomes: Vec<RoundOutcome> = stream::iter(units.iter().enumerate())
        .map(|(index, unit)| {
            let service = service.clone();
            let governor = governor.clone();
            let cancel = cancel.clone();
            let sink = Arc::clone(sink);

            async move {
                governor
                    .run(async {
                        if cancel.is_cancelled() {
                            return RoundOutcome {
                                index,
                                state: AttemptState::Retryable("run cancelled".to_string()),
                                elapsed: Duration::ZERO,
                            };
                        }

                        sink.unit_started(unit, attempt);
                        let started = Instant::now();
                        let result = match unit.kind {
                            UnitKind::Content => service.translate_content(&unit.text).await,
                            UnitKind::Title => service.translate_title(&unit.text).await,
                        };
                        let elapsed = started.elapsed();

                        let state = match result {
                            Ok(completion) => {
                                sink.unit_succeeded(unit, &completion, elapsed);
                                AttemptState::Success(completion)
                            }
                            Err(error) if error.is_retryable() => {
                                sink.unit_failed(unit, &error.to_string(), true);
                                AttemptState::Retryable(error.to_string())
                            }
                            Err(error) => {
                                sink.unit_failed(unit, &error.to_string(), false);
                                AttemptState::Fatal(error.to_string())
                            }
                        };

                        RoundOutcome { index, state, elapsed }
                    })
                    .await
            }
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    // Completion order is arbitrary; callers rely on submission order
    outcomes.sort_by_key(|outcome| outcome.index);
    outcomes
}

fn governor_width(governor: &Governor, unit_count: usize) -> usize {
    governor.max_concurrent().max(1).min(unit_count.max(1))
}
