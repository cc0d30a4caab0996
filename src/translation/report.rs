/*!
 * Progress reporting and per-run log files.
 *
 * The scheduler emits unit-level events through [`ProgressSink`]; the
 * orchestration layer decides where they go. [`RunLogger`] appends them
 * to a timestamped log file alongside token accounting, one file per
 * run, so a failed run leaves a full audit trail on disk.
 */

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use chrono::Local;
use parking_lot::Mutex;

use crate::providers::Completion;

use super::scheduler::Unit;

/// Receives unit-level progress events during a run.
///
/// Implementations must tolerate concurrent calls; the scheduler fires
/// events from every in-flight dispatch.
pub trait ProgressSink: Send + Sync {
    /// A unit is about to be dispatched
    fn unit_started(&self, _unit: &Unit, _attempt: u32) {}

    /// A unit's completion came back clean
    fn unit_succeeded(&self, _unit: &Unit, _completion: &Completion, _elapsed: Duration) {}

    /// A unit's attempt failed; `retryable` reflects the error class
    fn unit_failed(&self, _unit: &Unit, _error: &str, _retryable: bool) {}

    /// A full round finished with `pending` units left to retry
    fn round_finished(&self, _attempt: u32, _pending: usize) {}
}

/// Sink that discards everything. Used by tests and quiet paths.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {}

/// File-backed sink writing one timestamped log per run.
///
/// Log files are named `{ddmmyy}_{HHMM}_{sdk}_{base}.log`, with a
/// `_retry` suffix for standalone retry runs, matching the output files
/// they describe.
pub struct RunLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    started: Instant,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    thinking_tokens: AtomicU64,
}

impl RunLogger {
    /// Create the log file and write its header.
    ///
    /// `sdk` is the short provider code (`oai`, `gmn`, `vtx`), `base`
    /// the stem of the document being translated.
    pub fn create(
        log_dir: impl AsRef<Path>,
        sdk: &str,
        base: &str,
        retry: bool,
    ) -> std::io::Result<Self> {
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let stamp = Local::now().format("%d%m%y_%H%M");
        let suffix = if retry { "_retry" } else { "" };
        let path = log_dir.join(format!("{}_{}_{}{}.log", stamp, sdk, base, suffix));

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "=== Translation run log ===")?;
        writeln!(writer, "document: {}", base)?;
        writeln!(writer, "provider: {}", sdk)?;
        writeln!(writer, "started:  {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            path,
            started: Instant::now(),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            prompt_tokens: AtomicU64::new(0),
            completion_tokens: AtomicU64::new(0),
            thinking_tokens: AtomicU64::new(0),
        })
    }

    /// Path of the log file on disk
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn line(&self, message: &str) {
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "[{}] {}", Local::now().format("%H:%M:%S"), message);
    }

    /// Write the run summary footer and flush
    pub fn finish(&self, total_units: usize) {
        let succeeded = self.succeeded.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let elapsed = self.started.elapsed();

        let mut writer = self.writer.lock();
        let _ = writeln!(writer);
        let _ = writeln!(writer, "=== Summary ===");
        let _ = writeln!(writer, "units:       {} total, {} ok, {} failed", total_units, succeeded, failed);
        let _ = writeln!(
            writer,
            "tokens:      {} prompt, {} completion, {} thinking",
            self.prompt_tokens.load(Ordering::Relaxed),
            self.completion_tokens.load(Ordering::Relaxed),
            self.thinking_tokens.load(Ordering::Relaxed),
        );
        let _ = writeln!(writer, "elapsed:     {:.1}s", elapsed.as_secs_f64());
        let _ = writer.flush();
    }
}

impl ProgressSink for RunLogger {
    fn unit_started(&self, unit: &Unit, attempt: u32) {
        self.line(&format!("-> {} (attempt {})", unit.id, attempt));
    }

    fn unit_succeeded(&self, unit: &Unit, completion: &Completion, elapsed: Duration) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        if let Some(n) = completion.prompt_tokens {
            self.prompt_tokens.fetch_add(n, Ordering::Relaxed);
        }
        if let Some(n) = completion.completion_tokens {
            self.completion_tokens.fetch_add(n, Ordering::Relaxed);
        }
        if let Some(n) = completion.thinking_tokens {
            self.thinking_tokens.fetch_add(n, Ordering::Relaxed);
        }
        self.line(&format!("ok {} ({:.1}s)", unit.id, elapsed.as_secs_f64()));
    }

    fn unit_failed(&self, unit: &Unit, error: &str, retryable: bool) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        let class = if retryable { "retryable" } else { "fatal" };
        self.line(&format!("FAIL {} ({}): {}", unit.id, class, error));
    }

    fn round_finished(&self, attempt: u32, pending: usize) {
        self.line(&format!("round {} done, {} unit(s) pending", attempt, pending));
    }
}
