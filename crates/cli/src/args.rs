//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// feed-relay: republish Atom/RSS feed entries to social networks
#[derive(Parser, Debug)]
#[command(name = "feed-relay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read every feed once and post new entries to every destination
    Run(RunArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),

    /// Inspect the delivery ledger
    Ledger(LedgerArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Render and log posts without publishing or touching the ledger
    #[arg(long)]
    pub dry_run: bool,

    /// Write rendered posts to this JSONL file instead of publishing
    #[arg(long)]
    pub outbox: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./feed-relay.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct LedgerArgs {
    #[command(subcommand)]
    pub command: LedgerCommands,
}

#[derive(Subcommand, Debug)]
pub enum LedgerCommands {
    /// Tell whether an entry was delivered to a destination
    Check {
        /// Entry identifier: the link, followed by " <date>" when the feed dates entries
        #[arg(long)]
        entry_id: String,

        /// Destination name
        #[arg(long)]
        destination: String,
    },

    /// Count delivered entries per destination
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
