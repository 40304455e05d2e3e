//! surged — the Surge daemon.
//!
//! Single binary that assembles the admission pipeline:
//! - Capacity history store (redb)
//! - Capacity controller tick loop
//! - Ops API + Prometheus metrics
//!
//! It also carries a handful of one-shot admin commands that evaluate the
//! policy offline.
//!
//! # Usage
//!
//! ```text
//! surged run --config surge.toml --port 8480 --connections-file /run/surge/connections
//! surged status --connections 205
//! surged savings --days 15
//! ```

mod commands;
mod daemon;
mod source;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "surged", about = "Surge capacity-aware admission daemon")]
struct Cli {
    /// Path to the Surge config file. Missing file means built-in defaults.
    #[arg(long, global = true, default_value = "surge.toml")]
    config: PathBuf,

    /// Tier to enforce. Overrides SURGE_TIER and the config file.
    #[arg(long, global = true)]
    tier: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the capacity controller loop and the ops API.
    Run {
        /// Port to listen on.
        #[arg(long, default_value = "8480")]
        port: u16,

        /// Data directory for the capacity history.
        #[arg(long, default_value = "/var/lib/surge")]
        data_dir: PathBuf,

        /// File holding the live connection count, rewritten by the
        /// connection tracker.
        #[arg(long, conflicts_with = "connections")]
        connections_file: Option<PathBuf>,

        /// Fixed connection count, for dry runs.
        #[arg(long)]
        connections: Option<u32>,
    },
    /// Evaluate the policy for a connection count and print the report.
    Status {
        #[arg(long)]
        connections: u32,
    },
    /// Decide what to do with a client arriving at a given load.
    Admit {
        #[arg(long)]
        client: String,

        #[arg(long)]
        connections: u32,

        /// Membership tier label (bronze..diamond).
        #[arg(long)]
        membership: Option<String>,

        #[arg(long)]
        vip: bool,
    },
    /// List the tier catalog.
    Tiers,
    /// Money saved by deferring the next tier upgrade.
    Savings {
        #[arg(long)]
        days: u32,
    },
    /// Print recorded capacity samples, oldest first.
    ///
    /// Offline only: `surged run` locks the history file, so query
    /// GET /api/v1/history on a running daemon instead.
    History {
        #[arg(long, default_value = "/var/lib/surge")]
        data_dir: PathBuf,

        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let config = surge_core::SurgeConfig::load_or_default(&cli.config)?;
    let env_tier = std::env::var(surge_core::config::TIER_ENV_VAR).ok();
    let tier_override = cli.tier.or(env_tier);

    match cli.command {
        Command::Run {
            port,
            data_dir,
            connections_file,
            connections,
        } => {
            let opts = daemon::DaemonOptions {
                port,
                data_dir,
                connections_file,
                connections,
            };
            daemon::run_daemon(&config, tier_override.as_deref(), opts).await
        }
        Command::Status { connections } => {
            commands::status(&config, tier_override.as_deref(), connections)
        }
        Command::Admit {
            client,
            connections,
            membership,
            vip,
        } => commands::admit(
            &config,
            tier_override.as_deref(),
            &client,
            connections,
            membership,
            vip,
        ),
        Command::Tiers => commands::tiers(&config, tier_override.as_deref()),
        Command::Savings { days } => commands::savings(&config, tier_override.as_deref(), days),
        Command::History { data_dir, limit } => commands::history(&config, &data_dir, limit),
        Command::Config => commands::config(&config, tier_override.as_deref()),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,surged=debug,surge=debug"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
