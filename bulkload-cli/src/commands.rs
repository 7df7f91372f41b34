use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;

use bulkload::admin::{create_domains, delete_domains};
use bulkload::config::LoaderConfig;
use bulkload::loader::{load, LoadSummary};
use bulkload::sink::{BatchSink, MemorySink, PrintSink};
use bulkload::source::{DelimitedSource, RecordSource, SyntheticSource};

use crate::config::{Config, SinkKind};

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create every domain used by the loader
    Setup,
    /// Delete every domain used by the loader
    Cleanup,
    /// Load generated test items and report how fast it went
    Test {
        /// Number of items to generate
        #[arg(default_value_t = 10_000)]
        item_count: u32,
        /// Maximum number of writes in flight
        #[arg(default_value_t = 100)]
        thread_count: usize,
    },
    /// Load a file of `key<TAB>{json}` lines
    Load {
        file: PathBuf,
        /// Maximum number of writes in flight
        #[arg(default_value_t = 100)]
        thread_count: usize,
    },
}

impl Command {
    fn thread_count(&self) -> usize {
        match self {
            Command::Test { thread_count, .. } | Command::Load { thread_count, .. } => {
                *thread_count
            }
            // domain requests are all fired at once
            Command::Setup | Command::Cleanup => 1,
        }
    }
}

/// What a command did.
#[derive(Debug)]
pub enum Outcome {
    Domains { failed: usize },
    Loaded {
        summary: LoadSummary,
        /// Items held by the in-process store afterwards, when that is the sink.
        stored: Option<usize>,
    },
}

/// Builds the loader settings for `command`; fails on anything a run can't start with.
pub fn loader_config(config: &Config, command: &Command) -> Result<LoaderConfig> {
    let loader = config.loader_config(command.thread_count());
    loader.validate()?;
    Ok(loader)
}

pub async fn run(config: &Config, loader: &LoaderConfig, command: Command) -> Result<Outcome> {
    let domains = loader.domains()?;
    let memory = MemorySink::new();
    let sink: Arc<dyn BatchSink + Send + Sync> = match config.sink {
        SinkKind::Print => Arc::new(PrintSink {}),
        SinkKind::Memory => Arc::new(memory.clone()),
    };

    match command {
        Command::Setup => {
            let failed = create_domains(sink, &domains).await.len();
            Ok(Outcome::Domains { failed })
        }
        Command::Cleanup => {
            let failed = delete_domains(sink, &domains).await.len();
            Ok(Outcome::Domains { failed })
        }
        Command::Test { item_count, .. } => {
            let mut source = SyntheticSource::new(item_count, loader.assigner()?);
            load_into(config, loader, sink, &memory, &mut source).await
        }
        Command::Load { file, .. } => {
            let mut source = DelimitedSource::open(&file, loader.assigner()?)
                .with_context(|| format!("failed to open {}", file.display()))?;
            load_into(config, loader, sink, &memory, &mut source).await
        }
    }
}

async fn load_into(
    config: &Config,
    loader: &LoaderConfig,
    sink: Arc<dyn BatchSink + Send + Sync>,
    memory: &MemorySink,
    source: &mut dyn RecordSource,
) -> Result<Outcome> {
    // the in-process store starts out empty every run
    if config.sink == SinkKind::Memory {
        create_domains(sink.clone(), &loader.domains()?).await;
    }

    let summary = load(loader, sink, source).await?;
    let stored = match config.sink {
        SinkKind::Memory => Some(memory.item_count().await),
        SinkKind::Print => None,
    };

    Ok(Outcome::Loaded { summary, stored })
}
