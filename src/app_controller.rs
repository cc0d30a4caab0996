use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::app_config::{Config, Provider, TaskConfig};
use crate::credentials::{CredentialPool, CredentialStore};
use crate::segment_processor::{self, SegmentRecord};
use crate::translation::reconcile::{self, FailureReport};
use crate::translation::report::{ProgressSink, RunLogger};
use crate::translation::retry::{RetryController, TaskRunner};
use crate::translation::scheduler::{CancelFlag, Unit, UnitKind};
use crate::providers::Completion;
use crate::translation::TranslationService;

// @module: Application controller for document translation runs

/// Main application controller driving full and retry runs
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Shared credential pool for every task in the run
    pool: Arc<CredentialPool>,
}

/// Console progress sink: a progress bar for the terminal plus the
/// per-run log file behind it
struct ConsoleSink {
    bar: ProgressBar,
    logger: RunLogger,
}

impl ConsoleSink {
    fn new(total_units: usize, logger: RunLogger) -> Self {
        let bar = ProgressBar::new(total_units as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar, logger }
    }
}

impl ProgressSink for ConsoleSink {
    fn unit_started(&self, unit: &Unit, attempt: u32) {
        self.logger.unit_started(unit, attempt);
    }

    fn unit_succeeded(&self, unit: &Unit, completion: &Completion, elapsed: Duration) {
        self.logger.unit_succeeded(unit, completion, elapsed);
        self.bar.inc(1);
        self.bar.set_message(unit.id.clone());
    }

    fn unit_failed(&self, unit: &Unit, error: &str, retryable: bool) {
        self.logger.unit_failed(unit, error, retryable);
        self.bar.println(format!("  {} failed: {}", unit.id, error));
    }

    fn round_finished(&self, attempt: u32, pending: usize) {
        self.logger.round_finished(attempt, pending);
        if pending > 0 {
            self.bar.set_message(format!("{} unit(s) queued for retry", pending));
        }
    }
}

impl Controller {
    // @method: Create a controller with the given configuration and secrets
    pub fn new(config: Config, store: &CredentialStore) -> Result<Self> {
        config.validate()?;
        let pool = CredentialPool::from_store(store, &config.required_providers())?;
        Ok(Self { config, pool: Arc::new(pool) })
    }

    /// Run a full translation over one source document.
    ///
    /// Writes `{base}_{sdk}.yaml` and, when anything failed,
    /// `{base}_{sdk}_report.yaml` into the output directory.
    pub async fn run_translation(&self, input: &Path, cancel: &CancelFlag) -> Result<()> {
        let base = document_base(input)?;
        let sdk = self.config.content.provider.sdk_code();

        let records = segment_processor::load_records(input)?;
        let total_before_filter = records.len();
        let records = segment_processor::filter_records(records, &self.config.filtering);
        if records.is_empty() {
            return Err(anyhow!(
                "No segments to translate ({} in document, 0 after filtering)",
                total_before_filter
            ));
        }
        info!(
            "Translating {} segment(s) from {} ({} -> {})",
            records.len(),
            input.display(),
            self.config.source_language,
            self.config.target_language,
        );

        let logger = RunLogger::create(&self.config.log_dir, sdk, &base, false)?;
        let log_path = logger.path().to_path_buf();
        let total_units = records.len();
        let console = Arc::new(ConsoleSink::new(total_units, logger));
        let sink: Arc<dyn ProgressSink> = Arc::clone(&console) as Arc<dyn ProgressSink>;

        // Content pass: first round on the content task, retries on the retry task
        let controller = RetryController::new(
            self.runner(&self.config.content)?,
            self.runner(&self.config.retry)?,
            self.config.content.max_retries,
        );
        let units = segment_processor::content_units(&records);
        let result = controller.run(&units, cancel, &sink).await;
        info!(
            "Content pass done: {} first try, {} recovered, {} failed",
            result.first_try, result.recovered, result.failed
        );

        let (mut merged, mut report) = reconcile::merge(&records, &result)?;

        // Title pass, independent task and governor
        if self.config.title.enabled {
            let title_units = segment_processor::title_units(&records);
            if !title_units.is_empty() {
                info!("Translating {} chapter title(s)", title_units.len());
                let title_task = &self.config.title.task;
                let title_controller =
                    RetryController::uniform(self.runner(title_task)?, title_task.max_retries);
                let title_result = title_controller.run(&title_units, cancel, &sink).await;

                segment_processor::merge_titles(&mut merged, &title_result.outcomes);
                for outcome in &title_result.outcomes {
                    if let crate::translation::FinalState::Failed { reason, retryable } =
                        &outcome.state
                    {
                        // Failed titles keep the source title; still worth a report entry
                        warn!("Title for {} not translated: {}", outcome.id, reason);
                        report.failures.push(crate::translation::FailureEntry {
                            id: format!("{}:title", outcome.id),
                            reason: reason.clone(),
                            attempts: outcome.attempts,
                            retryable: *retryable,
                        });
                    }
                }
            }
        }

        self.write_outputs(&base, sdk, &merged, &report)?;
        console.bar.finish_and_clear();
        console.logger.finish(total_units);
        info!("Run log: {}", log_path.display());

        if report.is_empty() {
            info!("All {} segment(s) translated", merged.len());
        } else {
            warn!(
                "{} unit(s) failed; rerun with the retry command to recover them",
                report.failures.len()
            );
        }
        Ok(())
    }

    /// Re-run only the failures recorded by an earlier translation run.
    ///
    /// Patches the translated output in place and rewrites the report
    /// with whatever still fails.
    pub async fn run_retry(&self, input: &Path, cancel: &CancelFlag) -> Result<()> {
        let base = document_base(input)?;
        let sdk = self.config.content.provider.sdk_code();
        let output_path = self.output_path(&base, sdk);
        let report_path = self.report_path(&base, sdk);

        let report = FailureReport::load(&report_path)?;
        let retryable: Vec<_> = report.failures.iter().filter(|f| f.retryable).collect();
        if retryable.is_empty() {
            info!("Nothing to retry in {}", report_path.display());
            return Ok(());
        }

        let sources = segment_processor::load_records(input)?;
        let mut outputs = segment_processor::load_records(&output_path)?;
        let units = retry_units(&retryable, &sources, &outputs)?;
        if units.is_empty() {
            info!("No content units to retry in {}", report_path.display());
            return Ok(());
        }
        info!("Retrying {} unit(s) from {}", units.len(), report_path.display());

        let logger = RunLogger::create(&self.config.log_dir, sdk, &base, true)?;
        let total_units = units.len();
        let console = Arc::new(ConsoleSink::new(total_units, logger));
        let sink: Arc<dyn ProgressSink> = Arc::clone(&console) as Arc<dyn ProgressSink>;

        let runner = self.runner(&self.config.retry)?;
        let controller = RetryController::uniform(runner, self.config.retry.max_retries);
        let result = controller.run(&units, cancel, &sink).await;

        let mut remaining = reconcile::patch(&mut outputs, &result)?;
        // Entries this retry never dispatched stay on the report: fatal
        // failures and title entries (titles are not retried standalone)
        remaining.failures.extend(
            report
                .failures
                .iter()
                .filter(|f| !f.retryable || f.id.ends_with(":title"))
                .cloned(),
        );

        segment_processor::save_records(&output_path, &outputs)?;
        if remaining.is_empty() {
            std::fs::remove_file(&report_path).with_context(|| {
                format!("Failed to remove settled report: {}", report_path.display())
            })?;
            info!("All retried units recovered; report removed");
        } else {
            remaining.save(&report_path)?;
            warn!("{} unit(s) still failing", remaining.failures.len());
        }

        console.bar.finish_and_clear();
        console.logger.finish(total_units);
        Ok(())
    }

    fn runner(&self, task: &TaskConfig) -> Result<TaskRunner> {
        let service = TranslationService::new(
            task.clone(),
            Arc::clone(&self.pool),
            self.system_prompt(task.provider),
        )?;
        Ok(TaskRunner::new(service))
    }

    fn system_prompt(&self, _provider: Provider) -> String {
        format!(
            "You are a professional literary translator. Translate the given {source} text \
             into {target}. Preserve paragraph breaks, names and formatting. Output only the \
             translation, with no notes or commentary.",
            source = self.config.source_language,
            target = self.config.target_language,
        )
    }

    fn output_path(&self, base: &str, sdk: &str) -> PathBuf {
        Path::new(&self.config.output_dir).join(format!("{}_{}.yaml", base, sdk))
    }

    fn report_path(&self, base: &str, sdk: &str) -> PathBuf {
        Path::new(&self.config.output_dir).join(format!("{}_{}_report.yaml", base, sdk))
    }

    fn write_outputs(
        &self,
        base: &str,
        sdk: &str,
        records: &[SegmentRecord],
        report: &FailureReport,
    ) -> Result<()> {
        let output_path = self.output_path(base, sdk);
        segment_processor::save_records(&output_path, records)?;
        info!("Translated document written to {}", output_path.display());

        let report_path = self.report_path(base, sdk);
        if report.is_empty() {
            if report_path.exists() {
                std::fs::remove_file(&report_path).with_context(|| {
                    format!("Failed to remove stale report: {}", report_path.display())
                })?;
            }
        } else {
            report.save(&report_path)?;
            info!("Failure report written to {}", report_path.display());
        }
        Ok(())
    }
}

/// Build retry units from report entries.
///
/// Text comes from the source document, ordinal from the unit's position
/// in the translated output so the patch lands in the right slot.
fn retry_units(
    failures: &[&crate::translation::FailureEntry],
    sources: &[SegmentRecord],
    outputs: &[SegmentRecord],
) -> Result<Vec<Unit>> {
    let mut units = Vec::with_capacity(failures.len());
    for failure in failures {
        // Title entries are suffixed; those are not retried standalone
        if failure.id.ends_with(":title") {
            continue;
        }
        let source = sources
            .iter()
            .find(|r| r.id == failure.id)
            .ok_or_else(|| anyhow!("Report entry {} not found in source document", failure.id))?;
        let ordinal = outputs
            .iter()
            .position(|r| r.id == failure.id)
            .ok_or_else(|| anyhow!("Report entry {} not found in output document", failure.id))?;
        units.push(Unit {
            id: failure.id.clone(),
            ordinal,
            text: source.content.clone(),
            kind: UnitKind::Content,
        });
    }
    Ok(units)
}

fn document_base(input: &Path) -> Result<String> {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| anyhow!("Input path has no file name: {}", input.display()))
}
