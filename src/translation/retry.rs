/*!
 * Multi-round retry orchestration.
 *
 * The first round goes out under the primary task's service and governor;
 * units that fail with a retryable class are re-dispatched in follow-up
 * rounds under the retry task, which typically runs narrower concurrency
 * and wider pacing. Fatal failures short-circuit: they are settled after
 * their first attempt and never re-dispatched.
 */

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use super::core::TranslationService;
use super::governor::Governor;
use super::report::ProgressSink;
use super::scheduler::{self, AttemptState, CancelFlag, Unit, UnitKind};

/// A service paired with the governor that paces it
#[derive(Clone)]
pub struct TaskRunner {
    pub service: TranslationService,
    pub governor: Governor,
}

impl TaskRunner {
    /// Build a runner whose governor follows the service's task options
    pub fn new(service: TranslationService) -> Self {
        let task = service.task();
        let governor = Governor::new(task.concurrent_requests, task.request_delay_ms);
        Self { service, governor }
    }
}

/// Terminal state of a unit after all rounds
#[derive(Debug, Clone)]
pub enum FinalState {
    /// Cleaned translated text
    Translated(String),
    /// All attempts exhausted or a fatal error hit
    Failed {
        reason: String,
        /// Whether the last failure was retryable (attempts ran out)
        retryable: bool,
    },
}

/// Settled outcome for one unit
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    pub id: String,
    pub ordinal: usize,
    pub kind: UnitKind,
    pub state: FinalState,
    /// Attempts actually made, including the first
    pub attempts: u32,
    /// Total wall time spent on this unit across attempts
    pub elapsed: Duration,
}

impl UnitOutcome {
    pub fn is_translated(&self) -> bool {
        matches!(self.state, FinalState::Translated(_))
    }
}

/// Aggregate result of a full run over one unit batch
#[derive(Debug)]
pub struct BatchResult {
    /// One settled outcome per input unit, in input order
    pub outcomes: Vec<UnitOutcome>,
    /// Units translated on the first attempt
    pub first_try: usize,
    /// Units translated on a retry round
    pub recovered: usize,
    /// Units that never produced a translation
    pub failed: usize,
}

/// Drives a batch of units to settled outcomes across retry rounds
pub struct RetryController {
    first_pass: TaskRunner,
    retry_pass: TaskRunner,
    /// Extra rounds after the first attempt
    max_retries: u32,
}

impl RetryController {
    pub fn new(first_pass: TaskRunner, retry_pass: TaskRunner, max_retries: u32) -> Self {
        Self { first_pass, retry_pass, max_retries }
    }

    /// Single-task controller: retries run under the same runner
    pub fn uniform(runner: TaskRunner, max_retries: u32) -> Self {
        Self { first_pass: runner.clone(), retry_pass: runner, max_retries }
    }

    /// Run every unit to a settled outcome.
    ///
    /// Outcomes are returned in input order. Cancellation settles
    /// undispatched units as retryable failures so a later standalone
    /// retry can pick them up.
    pub async fn run(
        &self,
        units: &[Unit],
        cancel: &CancelFlag,
        sink: &Arc<dyn ProgressSink>,
    ) -> BatchResult {
        let mut settled: Vec<Option<UnitOutcome>> = (0..units.len()).map(|_| None).collect();
        let mut attempts: Vec<u32> = vec![0; units.len()];
        let mut spent: Vec<Duration> = vec![Duration::ZERO; units.len()];

        // Pending units carry their index into the input slice
        let mut pending: Vec<(usize, Unit)> =
            units.iter().cloned().enumerate().collect();
        let mut first_try = 0usize;
        let mut recovered = 0usize;

        let total_rounds = 1 + self.max_retries;
        for round in 1..=total_rounds {
            if pending.is_empty() {
                break;
            }
            let runner = if round == 1 { &self.first_pass } else { &self.retry_pass };
            if round > 1 {
                info!("Retry round {}/{}: {} unit(s)", round - 1, self.max_retries, pending.len());
            }

            let batch: Vec<Unit> = pending.iter().map(|(_, unit)| unit.clone()).collect();
            let outcomes = scheduler::run_round(
                &batch,
                &runner.service,
                &runner.governor,
                cancel,
                sink,
                round,
            )
            .await;

            let mut still_pending = Vec::new();
            for outcome in outcomes {
                let (input_index, unit) = &pending[outcome.index];
                let input_index = *input_index;
                attempts[input_index] += 1;
                spent[input_index] += outcome.elapsed;

                match outcome.state {
                    AttemptState::Success(completion) => {
                        if round == 1 {
                            first_try += 1;
                        } else {
                            recovered += 1;
                        }
                        settled[input_index] = Some(UnitOutcome {
                            id: unit.id.clone(),
                            ordinal: unit.ordinal,
                            kind: unit.kind,
                            state: FinalState::Translated(completion.text),
                            attempts: attempts[input_index],
                            elapsed: spent[input_index],
                        });
                    }
                    AttemptState::Retryable(reason) => {
                        if round == total_rounds {
                            settled[input_index] = Some(UnitOutcome {
                                id: unit.id.clone(),
                                ordinal: unit.ordinal,
                                kind: unit.kind,
                                state: FinalState::Failed { reason, retryable: true },
                                attempts: attempts[input_index],
                                elapsed: spent[input_index],
                            });
                        } else {
                            still_pending.push((input_index, unit.clone()));
                        }
                    }
                    AttemptState::Fatal(reason) => {
                        warn!("{}: fatal failure, not retried: {}", unit.id, reason);
                        settled[input_index] = Some(UnitOutcome {
                            id: unit.id.clone(),
                            ordinal: unit.ordinal,
                            kind: unit.kind,
                            state: FinalState::Failed { reason, retryable: false },
                            attempts: attempts[input_index],
                            elapsed: spent[input_index],
                        });
                    }
                }
            }

            sink.round_finished(round, still_pending.len());
            pending = still_pending;
        }

        let outcomes: Vec<UnitOutcome> = settled
            .into_iter()
            .map(|outcome| outcome.expect("every unit settles within the round bound"))
            .collect();
        let failed = outcomes.iter().filter(|o| !o.is_translated()).count();

        BatchResult { outcomes, first_try, recovered, failed }
    }
}
