use std::collections::HashMap;
use std::io::Write;

use anyhow::Result;
use clap::Parser;
use envconfig::Envconfig;

use bulkload_cli::cli::Cli;
use bulkload_cli::commands::{loader_config, run, Command, Outcome};
use bulkload_cli::config::{Config, SinkKind};

fn config(vars: &[(&str, &str)]) -> Config {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::init_from_hashmap(&env).expect("config should parse")
}

#[test]
fn it_parses_commands_with_defaults() {
    let cli = Cli::try_parse_from(["bulkload", "test"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Test {
            item_count: 10_000,
            thread_count: 100
        }
    );

    let cli = Cli::try_parse_from(["bulkload", "test", "500", "8"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Test {
            item_count: 500,
            thread_count: 8
        }
    );

    let cli = Cli::try_parse_from(["bulkload", "setup"]).unwrap();
    assert_eq!(cli.command, Command::Setup);
}

#[test]
fn it_rejects_non_numeric_counts() {
    assert!(Cli::try_parse_from(["bulkload", "test", "lots"]).is_err());
    assert!(Cli::try_parse_from(["bulkload", "load"]).is_err());
    assert!(Cli::try_parse_from(["bulkload"]).is_err());
}

#[test]
fn it_reads_the_environment_with_defaults() {
    let defaults = config(&[]);
    assert_eq!(defaults.sink, SinkKind::Print);
    assert_eq!(defaults.domain_count, 25);
    assert_eq!(defaults.domain_prefix, "test_domain");
    assert_eq!(defaults.batch_count, 20);

    let custom = config(&[("SINK", "memory"), ("DOMAIN_COUNT", "4"), ("MAX_RPS", "9.5")]);
    assert_eq!(custom.sink, SinkKind::Memory);
    assert_eq!(custom.domain_count, 4);
    assert_eq!(custom.max_rps, 9.5);

    let env = HashMap::from([("DOMAIN_COUNT".to_string(), "many".to_string())]);
    assert!(Config::init_from_hashmap(&env).is_err());
}

#[test]
fn it_refuses_zero_domains_before_running() {
    let config = config(&[("DOMAIN_COUNT", "0")]);
    let command = Command::Test {
        item_count: 10,
        thread_count: 4,
    };

    assert!(loader_config(&config, &command).is_err());
}

#[tokio::test(start_paused = true)]
async fn it_runs_a_test_load_against_memory() -> Result<()> {
    let config = config(&[("SINK", "memory"), ("DOMAIN_COUNT", "5")]);
    let command = Command::Test {
        item_count: 300,
        thread_count: 10,
    };
    let loader = loader_config(&config, &command)?;

    match run(&config, &loader, command).await? {
        Outcome::Loaded { summary, stored } => {
            assert_eq!(summary.records_read, 300);
            assert_eq!(summary.records_written, 300);
            assert_eq!(stored, Some(300));
            assert!(summary.to_string().contains("for 300 items"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn it_loads_a_file_from_disk() -> Result<()> {
    let path = std::env::temp_dir().join(format!("bulkload-{}.tsv", std::process::id()));
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "one\t{{\"n\":1}}")?;
    writeln!(file, "two\t{{\"n\":2}}")?;
    drop(file);

    let config = config(&[("SINK", "memory"), ("DOMAIN_COUNT", "2")]);
    let command = Command::Load {
        file: path.clone(),
        thread_count: 2,
    };
    let loader = loader_config(&config, &command)?;
    let outcome = run(&config, &loader, command).await;
    std::fs::remove_file(&path)?;

    match outcome? {
        Outcome::Loaded { summary, stored } => {
            assert_eq!(summary.records_written, 2);
            assert_eq!(stored, Some(2));
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn it_reports_a_missing_file() {
    let config = config(&[("SINK", "memory")]);
    let command = Command::Load {
        file: "/definitely/not/here.tsv".into(),
        thread_count: 2,
    };
    let loader = loader_config(&config, &command).unwrap();

    let err = run(&config, &loader, command).await.unwrap_err();
    assert!(err.to_string().contains("failed to open"));
}

#[tokio::test]
async fn it_sets_up_and_cleans_up_domains() -> Result<()> {
    let config = config(&[("DOMAIN_COUNT", "3")]);
    for command in [Command::Setup, Command::Cleanup] {
        let loader = loader_config(&config, &command)?;
        match run(&config, &loader, command).await? {
            Outcome::Domains { failed } => assert_eq!(failed, 0),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    Ok(())
}
