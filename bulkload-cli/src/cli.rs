use clap::Parser;

use crate::commands::Command;

/// Bulk-load records into a sharded key/attribute store, easing the request rate up over
/// the first minutes of a run.
///
/// Store settings come from the environment: DOMAIN_COUNT, DOMAIN_PREFIX, BATCH_COUNT,
/// MIN_RPS, MAX_RPS, RAMP_TIME_SECS and SINK (print or memory).
#[derive(Parser, Debug)]
#[command(name = "bulkload", version, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}
