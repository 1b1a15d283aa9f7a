use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use escrowvest_types::{SettlementConfig, constants};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod script;

use script::{Caller, Script, Simulation};

#[derive(Parser)]
#[command(name = "escrowvest")]
#[command(about = "Three-party vesting escrow tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, env = "ESCROWVEST_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a settlement configuration file
    Validate {
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
    },
    /// Run a scripted scenario against a fresh settlement
    Simulate {
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        script: PathBuf,

        /// Settlement creation time (RFC 3339). Defaults to now.
        #[arg(long)]
        start: Option<DateTime<Utc>>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_tracing(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Validate { config } => validate_config(&config),
        Commands::Simulate {
            config,
            script,
            start,
        } => simulate(&config, &script, start.unwrap_or_else(Utc::now)),
    }
}

fn validate_config(path: &Path) -> Result<()> {
    info!("Validating configuration file: {:?}", path);
    let config = SettlementConfig::from_file(path).context("Failed to load configuration")?;

    info!("Configuration is valid");
    info!(
        asset = %config.asset,
        amount = %config.amount,
        sender = %config.sender,
        receiver = %config.receiver,
        arbiter = %config.arbiter,
        "Settlement parameters"
    );
    Ok(())
}

fn simulate(config_path: &Path, script_path: &Path, start: DateTime<Utc>) -> Result<()> {
    info!(
        engine = constants::ENGINE_NAME,
        version = constants::VERSION,
        "Starting simulation"
    );
    let config =
        SettlementConfig::from_file(config_path).context("Failed to load configuration")?;
    let raw = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script {}", script_path.display()))?;
    let script = Script::from_json_str(&raw)?;

    let mut sim = Simulation::new(config, start).context("Failed to create settlement")?;
    let outcomes = sim.run(&script)?;
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }

    let summary = serde_json::json!({
        "status": sim.status(),
        "journal_head": sim.state().journal().head_hex(),
        "events": sim.state().journal().len(),
        "balances": {
            "sender": sim.balance(Caller::Sender),
            "receiver": sim.balance(Caller::Receiver),
            "arbiter": sim.balance(Caller::Arbiter),
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    sim.check_conservation()
        .context("Settlement conservation check failed")?;
    info!(steps = outcomes.len(), "Simulation complete");
    Ok(())
}

fn setup_tracing(log_level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
