use std::sync::Arc;

use metrics::{counter, histogram};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::api::{BatchFailure, WriteFailure};
use crate::partition::Domains;
use crate::record::Record;
use crate::sink::BatchSink;
use crate::throttle::Throttle;

struct BatchOutcome {
    domain: String,
    records: usize,
    result: Result<(), WriteFailure>,
}

/// What came back from every write submitted during a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DrainReport {
    pub batches: usize,
    pub records_written: u64,
    pub failures: Vec<BatchFailure>,
}

/// Sends batches off to the sink on a bounded pool of tasks and collects the results.
///
/// Submission goes through the throttle first, so a domain that was written to recently
/// holds up the caller rather than a worker.
pub struct Dispatcher {
    sink: Arc<dyn BatchSink + Send + Sync>,
    domains: Domains,
    throttle: Throttle,
    workers: Arc<Semaphore>,
    pending: JoinSet<BatchOutcome>,
}

impl Dispatcher {
    pub fn new(
        sink: Arc<dyn BatchSink + Send + Sync>,
        domains: Domains,
        throttle: Throttle,
        thread_count: usize,
    ) -> Self {
        Dispatcher {
            sink,
            domains,
            throttle,
            workers: Arc::new(Semaphore::new(thread_count)),
            pending: JoinSet::new(),
        }
    }

    /// Writes still outstanding.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }

    /// Queues a write of `records` to the domain at `partition`. Never fails: once the pool
    /// is saturated the write waits for a free worker inside its own task.
    pub async fn submit(&mut self, partition: usize, records: Vec<Record>) {
        self.throttle.acquire(partition).await;

        let domain = self.domains.name(partition);
        let batch_size = records.len();
        debug!(%domain, batch_size, "submitting batch");
        histogram!("bulkload_batch_size", batch_size as f64);

        let sink = self.sink.clone();
        let workers = self.workers.clone();
        self.pending.spawn(async move {
            let result = match workers.acquire_owned().await {
                Ok(_permit) => sink.put_batch(&domain, records).await,
                Err(e) => Err(WriteFailure::new(format!("worker pool closed: {e}"))),
            };

            BatchOutcome {
                domain,
                records: batch_size,
                result,
            }
        });
    }

    /// Waits for every submitted write. Failures are logged and collected, never retried.
    pub async fn drain(mut self) -> DrainReport {
        let mut report = DrainReport::default();

        while let Some(joined) = self.pending.join_next().await {
            report.batches += 1;

            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    counter!("bulkload_batch_failures_total", 1);
                    error!("batch write task failed: {}", e);
                    report.failures.push(BatchFailure {
                        domain: None,
                        records: 0,
                        failure: WriteFailure::new(format!("write task failed: {e}")),
                    });
                    continue;
                }
            };

            match outcome.result {
                Ok(()) => {
                    counter!("bulkload_records_written_total", outcome.records as u64);
                    report.records_written += outcome.records as u64;
                }
                Err(failure) => {
                    counter!("bulkload_batch_failures_total", 1);
                    error!(
                        domain = %outcome.domain,
                        records = outcome.records,
                        status_code = ?failure.status_code,
                        error_code = ?failure.error_code,
                        error_type = ?failure.error_type,
                        request_id = ?failure.request_id,
                        body = ?failure.body,
                        "failed to write batch: {}",
                        failure.message
                    );
                    report.failures.push(BatchFailure {
                        domain: Some(outcome.domain),
                        records: outcome.records,
                        failure,
                    });
                }
            }
        }

        report
    }
}
