use std::num::NonZeroU32;
use std::time::Duration;

use crate::api::ConfigError;
use crate::partition::{Domains, PartitionAssigner};
use crate::throttle::Ramp;

/// Settings for a single load run.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    pub domain_count: u32,
    pub domain_prefix: String,
    /// A domain's buffer is written out once it holds more than this many records.
    pub batch_count: usize,
    /// Upper bound on writes in flight at once.
    pub thread_count: usize,
    pub min_rps: f64,
    pub max_rps: f64,
    pub ramp_time: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            domain_count: 25,
            domain_prefix: String::from("test_domain"),
            batch_count: 20,
            thread_count: 100,
            min_rps: 1.0,
            max_rps: 5.0,
            ramp_time: Duration::from_secs(120),
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.domain_count()?;
        if self.batch_count == 0 {
            return Err(ConfigError::EmptyBatch);
        }
        if self.thread_count == 0 {
            return Err(ConfigError::NoWorkers);
        }
        self.ramp()?;

        Ok(())
    }

    pub fn assigner(&self) -> Result<PartitionAssigner, ConfigError> {
        Ok(PartitionAssigner::new(self.domain_count()?))
    }

    pub fn domains(&self) -> Result<Domains, ConfigError> {
        Ok(Domains::new(self.domain_prefix.clone(), self.domain_count()?))
    }

    pub fn ramp(&self) -> Result<Ramp, ConfigError> {
        let (min_rps, max_rps) = (self.min_rps, self.max_rps);
        // the slowest rate still has to give a representable gap between writes
        let valid = |rate: f64| {
            rate.is_finite() && rate > 0.0 && Duration::try_from_secs_f64(1.0 / rate).is_ok()
        };
        if !valid(min_rps) || !valid(max_rps) {
            return Err(ConfigError::InvalidRate { min_rps, max_rps });
        }
        if max_rps < min_rps {
            return Err(ConfigError::InvertedRamp { min_rps, max_rps });
        }

        Ok(Ramp::new(min_rps, max_rps, self.ramp_time))
    }

    fn domain_count(&self) -> Result<NonZeroU32, ConfigError> {
        NonZeroU32::new(self.domain_count).ok_or(ConfigError::NoDomains)
    }
}
