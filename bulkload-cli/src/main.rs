use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use envconfig::Envconfig;

use bulkload_cli::cli::Cli;
use bulkload_cli::commands::{self, Outcome};
use bulkload_cli::config::Config;

fn usage_error(message: impl std::fmt::Display) -> ExitCode {
    eprintln!("{message}");
    eprintln!();
    Cli::command().print_help().ok();
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match Config::init_from_env() {
        Ok(config) => config,
        Err(e) => return usage_error(format!("invalid environment configuration: {e}")),
    };
    let loader = match commands::loader_config(&config, &cli.command) {
        Ok(loader) => loader,
        Err(e) => return usage_error(format!("invalid configuration: {e}")),
    };

    match commands::run(&config, &loader, cli.command).await {
        Ok(Outcome::Domains { failed: 0 }) => ExitCode::SUCCESS,
        Ok(Outcome::Domains { failed }) => {
            eprintln!("{failed} domain requests failed");
            ExitCode::FAILURE
        }
        Ok(Outcome::Loaded { summary, stored }) => {
            println!("{summary}");
            if !summary.failures.is_empty() {
                let lost: usize = summary.failures.iter().map(|f| f.records).sum();
                println!("{} batches failed ({} items not written)", summary.failures.len(), lost);
            }
            if let Some(stored) = stored {
                println!("{stored} items in the in-memory store");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("load failed: {:#}", e);
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
