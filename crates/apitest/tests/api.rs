//! API test harness entry point
//!
//! This file is the test binary that drives the live API suites.
//! Run with: cargo test --package thesistrack-apitest --test api

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use thesistrack_apitest::report::SuiteKind;
use thesistrack_apitest::HarnessRunner;
use thesistrack_common::{config::env_keys, HarnessConfig, Result};

#[derive(Parser, Debug)]
#[command(name = "thesistrack-apitest")]
#[command(about = "Integration test harness for the ThesisTrack API")]
struct Args {
    /// Base URL of the API under test
    #[arg(long, env = env_keys::BASE_URL)]
    base_url: Option<String>,

    /// Directory for the persisted run report
    #[arg(long, env = env_keys::REPORT_DIR)]
    report_dir: Option<PathBuf>,

    /// Directory for ephemeral harness state
    #[arg(long, env = env_keys::STATE_DIR)]
    state_dir: Option<PathBuf>,

    /// Accept self-signed TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Run only one suite (auth, submissions, tribunals, defenses,
    /// users, notifications)
    #[arg(short, long)]
    suite: Option<SuiteKind>,

    /// Leave created resources in place after the run
    #[arg(long)]
    skip_cleanup: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(success) => {
            if success {
                std::process::exit(0);
            } else {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> Result<bool> {
    let mut config = HarnessConfig::from_env()?;
    if let Some(url) = args.base_url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(dir) = args.report_dir {
        config.report_dir = dir;
    }
    if let Some(dir) = args.state_dir {
        config.state_dir = dir;
    }
    if args.insecure {
        config.accept_invalid_certs = true;
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs.max(1));
    }

    let runner = HarnessRunner::new(config)?.with_skip_cleanup(args.skip_cleanup);

    // A SIGINT mid-run still removes the ephemeral token file; created
    // resources may be left behind and are reported as such.
    let report = tokio::select! {
        report = run(&runner, args.suite) => report?,
        _ = tokio::signal::ctrl_c() => {
            runner.emergency_cleanup();
            return Err(thesistrack_common::Error::Interrupted);
        }
    };

    Ok(report.success())
}

async fn run(
    runner: &HarnessRunner,
    suite: Option<SuiteKind>,
) -> Result<thesistrack_apitest::RunReport> {
    match suite {
        Some(kind) => runner.run_single(kind).await,
        None => runner.run().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suite_flag_parses_known_names() {
        let args = Args::parse_from(["apitest", "--suite", "defenses", "--insecure"]);
        assert_eq!(args.suite, Some(SuiteKind::Defenses));
        assert!(args.insecure);
        assert!(!args.skip_cleanup);
    }

    #[test]
    fn test_suite_flag_rejects_unknown_names() {
        assert!(Args::try_parse_from(["apitest", "--suite", "grades"]).is_err());
    }
}
