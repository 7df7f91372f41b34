use std::str::FromStr;
use std::time::Duration;

use envconfig::Envconfig;

use bulkload::config::LoaderConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SinkKind {
    /// Log every record instead of storing it.
    Print,
    /// Keep everything in this process; useful to check a load end to end.
    Memory,
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "print" => Ok(SinkKind::Print),
            "memory" => Ok(SinkKind::Memory),
            other => Err(format!("unknown sink {other:?}, expected print or memory")),
        }
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    #[envconfig(default = "print")]
    pub sink: SinkKind,

    #[envconfig(default = "25")]
    pub domain_count: u32,
    #[envconfig(default = "test_domain")]
    pub domain_prefix: String,
    #[envconfig(default = "20")]
    pub batch_count: usize,

    #[envconfig(default = "1.0")]
    pub min_rps: f64,
    #[envconfig(default = "5.0")]
    pub max_rps: f64,
    #[envconfig(default = "120")]
    pub ramp_time_secs: u64,
}

impl Config {
    pub fn loader_config(&self, thread_count: usize) -> LoaderConfig {
        LoaderConfig {
            domain_count: self.domain_count,
            domain_prefix: self.domain_prefix.clone(),
            batch_count: self.batch_count,
            thread_count,
            min_rps: self.min_rps,
            max_rps: self.max_rps,
            ramp_time: Duration::from_secs(self.ramp_time_secs),
        }
    }
}
