//! Per-domain write pacing.
//!
//! The store penalises writers that start out bursty, so every domain begins at a low
//! request rate and is eased up to the full rate over the ramp period. The ramp follows the
//! time elapsed since the job started, shared by every domain: a domain first written late
//! in the run starts at the higher rate straight away.
//!
//! The throttle is owned by the single task that submits writes, so it needs no locking.
//! Waiting here stalls that task, which is the backpressure that keeps the producer from
//! outrunning the store.
use std::time::Duration;

use metrics::histogram;
use tokio::time::{sleep, Instant};
use tracing::trace;

/// Linear schedule from `min_rps` at job start to `max_rps` once `duration` has passed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ramp {
    min_rps: f64,
    max_rps: f64,
    duration: Duration,
}

impl Ramp {
    /// Rates must be positive; `LoaderConfig::ramp` checks that before building one.
    pub fn new(min_rps: f64, max_rps: f64, duration: Duration) -> Self {
        Ramp {
            min_rps,
            max_rps,
            duration,
        }
    }

    /// Allowed requests per second, per domain, at `elapsed` into the job.
    pub fn rate_at(&self, elapsed: Duration) -> f64 {
        if elapsed >= self.duration {
            return self.max_rps;
        }

        let progress = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.min_rps + progress * (self.max_rps - self.min_rps)
    }

    /// Minimum gap between two writes to the same domain at `elapsed` into the job.
    pub fn delay_at(&self, elapsed: Duration) -> Duration {
        Duration::from_secs_f64(1.0 / self.rate_at(elapsed))
    }
}

pub struct Throttle {
    ramp: Ramp,
    started: Instant,
    /// Time of the last accepted write, relative to `started`, indexed by domain.
    last_write: Vec<Duration>,
}

impl Throttle {
    /// Starts the job clock now.
    pub fn new(ramp: Ramp, domain_count: usize) -> Self {
        Throttle {
            ramp,
            started: Instant::now(),
            last_write: vec![Duration::ZERO; domain_count],
        }
    }

    pub fn started(&self) -> Instant {
        self.started
    }

    /// Waits until `partition` may be written to again, then records the write.
    ///
    /// Returns how long the caller was held back.
    pub async fn acquire(&mut self, partition: usize) -> Duration {
        let elapsed = self.started.elapsed();
        let desired = self.ramp.delay_at(elapsed);
        let since_last = elapsed.saturating_sub(self.last_write[partition]);

        let mut waited = Duration::ZERO;
        if since_last < desired {
            waited = desired - since_last;
            trace!(partition, ?waited, "throttling write");
            sleep(waited).await;
            histogram!("bulkload_throttle_wait_seconds", waited.as_secs_f64());
        }

        self.last_write[partition] = self.started.elapsed();
        waited
    }
}
