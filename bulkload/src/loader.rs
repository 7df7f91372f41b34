use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::api::{BatchFailure, ConfigError};
use crate::buffer::BatchBuffers;
use crate::config::LoaderConfig;
use crate::dispatch::Dispatcher;
use crate::partition::PartitionAssigner;
use crate::sink::BatchSink;
use crate::source::RecordSource;
use crate::throttle::Throttle;

/// Result of a load run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    pub records_read: u64,
    pub batches: usize,
    pub records_written: u64,
    pub failures: Vec<BatchFailure>,
    pub elapsed: Duration,
}

impl LoadSummary {
    /// Records read per second of wall time.
    pub fn throughput(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.records_read as f64 / seconds
        } else {
            0.0
        }
    }
}

impl fmt::Display for LoadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Took {:.3} seconds for {} items ({:.1} items per second)",
            self.elapsed.as_secs_f64(),
            self.records_read,
            self.throughput()
        )
    }
}

/// Reads `source` to the end, writing its records to `sink` in per-domain batches.
///
/// Only a bad configuration stops a load; failed writes are reported in the summary.
pub async fn load<S>(
    config: &LoaderConfig,
    sink: Arc<dyn BatchSink + Send + Sync>,
    source: &mut S,
) -> Result<LoadSummary, ConfigError>
where
    S: RecordSource + ?Sized,
{
    config.validate()?;
    let assigner = config.assigner()?;
    let domains = config.domains()?;
    let domain_count = domains.count();

    info!(
        domains = domain_count,
        batch_count = config.batch_count,
        threads = config.thread_count,
        "loading records"
    );
    let started = Instant::now();

    let throttle = Throttle::new(config.ramp()?, domain_count);
    let mut loader = Loader {
        assigner,
        buffers: BatchBuffers::new(domain_count, config.batch_count),
        dispatcher: Dispatcher::new(sink, domains, throttle, config.thread_count),
    };

    let records_read = loader.consume(source).await;
    loader.flush_remaining().await;
    let report = loader.dispatcher.drain().await;

    let summary = LoadSummary {
        records_read,
        batches: report.batches,
        records_written: report.records_written,
        failures: report.failures,
        elapsed: started.elapsed(),
    };
    info!(
        records = summary.records_read,
        written = summary.records_written,
        batches = summary.batches,
        failed_batches = summary.failures.len(),
        "{}",
        summary
    );

    Ok(summary)
}

struct Loader {
    assigner: PartitionAssigner,
    buffers: BatchBuffers,
    dispatcher: Dispatcher,
}

impl Loader {
    async fn consume<S: RecordSource + ?Sized>(&mut self, source: &mut S) -> u64 {
        let mut records_read = 0;

        while let Some(sourced) = source.next_record() {
            records_read += 1;

            let mut partition = sourced.partition;
            if partition >= self.assigner.domain_count() {
                warn!(
                    id = %sourced.record.id,
                    partition,
                    "source picked a partition out of range, rehashing key"
                );
                partition = self.assigner.for_key(&sourced.record.id);
            }

            self.buffers.append(partition, sourced.record);
            if self.buffers.should_flush(partition) {
                self.flush(partition).await;
            }
        }

        records_read
    }

    async fn flush_remaining(&mut self) {
        for partition in self.buffers.non_empty() {
            self.flush(partition).await;
        }
    }

    async fn flush(&mut self, partition: usize) {
        let records = self.buffers.take_and_reset(partition);
        self.dispatcher.submit(partition, records).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::sink::MemorySink;
    use crate::source::SourcedRecord;

    /// Replays a fixed list of records.
    struct Fixed(std::vec::IntoIter<SourcedRecord>);

    impl RecordSource for Fixed {
        fn next_record(&mut self) -> Option<SourcedRecord> {
            self.0.next()
        }
    }

    fn fixed(partitions: &[usize]) -> Fixed {
        let records: Vec<SourcedRecord> = partitions
            .iter()
            .enumerate()
            .map(|(i, &partition)| SourcedRecord {
                record: Record::new(format!("item-{i}")),
                partition,
            })
            .collect();
        Fixed(records.into_iter())
    }

    fn config(domain_count: u32, batch_count: usize) -> LoaderConfig {
        LoaderConfig {
            domain_count,
            domain_prefix: String::from("t"),
            batch_count,
            thread_count: 4,
            ..Default::default()
        }
    }

    async fn created(config: &LoaderConfig) -> MemorySink {
        let sink = MemorySink::new();
        for name in config.domains().unwrap().names() {
            sink.create_domain(&name).await.unwrap();
        }
        sink
    }

    #[tokio::test(start_paused = true)]
    async fn exact_batch_count_waits_for_the_final_flush() {
        let config = config(2, 3);
        let sink = created(&config).await;

        let mut source = fixed(&[0, 0, 0, 1]);
        let summary = load(&config, Arc::new(sink.clone()), &mut source).await.unwrap();

        assert_eq!(summary.records_read, 4);
        assert_eq!(summary.batches, 2);
        assert_eq!(sink.batch_sizes("t00").await, vec![3]);
        assert_eq!(sink.batch_sizes("t01").await, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn one_past_batch_count_flushes_immediately() {
        let config = config(1, 3);
        let sink = created(&config).await;

        let mut source = fixed(&[0; 9]);
        let summary = load(&config, Arc::new(sink.clone()), &mut source).await.unwrap();

        assert_eq!(summary.records_written, 9);
        assert_eq!(sink.batch_sizes("t00").await, vec![4, 4, 1]);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_partition_is_rehashed() {
        let config = config(3, 20);
        let sink = created(&config).await;

        let mut source = fixed(&[7]);
        let summary = load(&config, Arc::new(sink.clone()), &mut source).await.unwrap();

        let expected = config.domains().unwrap().name(config.assigner().unwrap().for_key("item-0"));
        assert_eq!(summary.records_written, 1);
        assert_eq!(sink.batch_sizes(&expected).await, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_stops_before_reading() {
        let config = config(0, 20);

        let mut source = fixed(&[0]);
        let result = load(&config, Arc::new(MemorySink::new()), &mut source).await;

        assert_eq!(result.unwrap_err(), ConfigError::NoDomains);
        assert!(source.next_record().is_some());
    }

    #[test]
    fn summary_line_reports_throughput() {
        let summary = LoadSummary {
            records_read: 10_000,
            batches: 500,
            records_written: 10_000,
            failures: vec![],
            elapsed: Duration::from_secs(4),
        };

        assert_eq!(summary.throughput(), 2_500.0);
        assert_eq!(
            summary.to_string(),
            "Took 4.000 seconds for 10000 items (2500.0 items per second)"
        );
    }
}
