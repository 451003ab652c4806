//! Command-line entry point for the trust harness.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use trust_harness::logging::{init_logging, LogFormat};
use trust_harness::scenario::{self, Scenario};
use trust_harness::{HarnessConfig, TrustClient};

#[derive(Parser, Debug)]
#[command(name = "trust-harness", version, about = "Drive trust bond scenarios against a sandbox ledger")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "TRUST_HARNESS_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "human", env = "TRUST_HARNESS_LOG_FORMAT")]
    log_format: LogFormat,

    /// Filter directive, overridden by `RUST_LOG`.
    #[arg(long, default_value = "info", env = "TRUST_HARNESS_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a scenario and print its report as JSON.
    Run {
        #[arg(value_enum, default_value = "all")]
        scenario: Scenario,

        /// Fail steps with unmet preconditions instead of skipping them.
        #[arg(long)]
        strict: bool,
    },
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<HarnessConfig> {
    let config = match path {
        Some(path) => HarnessConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HarnessConfig::default(),
    };
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_format, &cli.log_level)?;
    let mut config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Config => {
            print!("{}", config.to_toml_string()?);
        }
        Command::Run { scenario, strict } => {
            if strict {
                config.safe_mode = false;
            }
            let mut client = TrustClient::new(config).context("setting up sandbox ledger")?;
            info!(?scenario, "running");
            match scenario::run(&mut client, scenario) {
                Ok(reports) => {
                    println!("{}", serde_json::to_string_pretty(&reports)?);
                }
                Err(err) => {
                    error!(kind = ?err.kind(), %err, "scenario failed");
                    return Err(err).context("scenario failed");
                }
            }
        }
    }
    Ok(())
}
