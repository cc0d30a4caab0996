/*!
 * Dispatch governor: concurrency ceiling plus inter-dispatch pacing.
 *
 * Every outbound request passes through one [`Governor`]. A semaphore
 * caps the number of requests in flight, and a shared last-dispatch
 * instant spaces consecutive dispatch starts by a fixed delay so burst
 * traffic never hits provider rate limits all at once.
 */

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore};
use tokio::time::Instant;

/// Governs concurrency and pacing for one task run
#[derive(Debug, Clone)]
pub struct Governor {
    /// Permits bounding requests in flight
    semaphore: Arc<Semaphore>,

    /// Minimum spacing between dispatch starts
    delay: Duration,

    /// Start instant of the most recent dispatch.
    ///
    /// Held across the pacing sleep so concurrent waiters queue up and
    /// leave strictly spaced, in permit-acquisition order.
    last_dispatch: Arc<Mutex<Option<Instant>>>,
}

impl Governor {
    /// Create a governor with the given ceiling and dispatch spacing
    pub fn new(max_concurrent: usize, delay_ms: u64) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            delay: Duration::from_millis(delay_ms),
            last_dispatch: Arc::new(Mutex::new(None)),
        }
    }

    /// Run one dispatch under the governor.
    ///
    /// Acquires a permit, waits out the pacing delay relative to the
    /// previous dispatch, then drives the future to completion. The
    /// permit is released when the future finishes, success or not.
    pub async fn run<F, T>(&self, dispatch: F) -> T
    where
        F: Future<Output = T>,
    {
        // The semaphore is never closed, acquire cannot fail
        let _permit = self.semaphore.acquire().await.unwrap();

        if self.delay > Duration::ZERO {
            let mut last = self.last_dispatch.lock().await;
            if let Some(previous) = *last {
                tokio::time::sleep_until(previous + self.delay).await;
            }
            *last = Some(Instant::now());
        }

        dispatch.await
    }

    /// Ceiling this governor was built with
    pub fn max_concurrent(&self) -> usize {
        // Permits outstanding never outlive `run`, so at rest this is the ceiling
        self.semaphore.available_permits()
    }
}
