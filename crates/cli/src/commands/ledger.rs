//! Ledger command - inspect delivered entries

use anyhow::{Context, Result};
use feed_relay_adapters::ledger::SqliteLedger;
use feed_relay_domain::Ledger;
use serde::Serialize;
use std::path::PathBuf;

use crate::args::{LedgerArgs, LedgerCommands};
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DestinationCount {
    destination: String,
    entries: u64,
}

pub async fn execute(args: LedgerArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let ledger = SqliteLedger::new(&config.general.ledger_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open ledger {}",
                config.general.ledger_path.display()
            )
        })?;

    match args.command {
        LedgerCommands::Check {
            entry_id,
            destination,
        } => {
            let published = ledger.is_published(&entry_id, &destination).await?;
            if published {
                println!("published: {} -> {}", entry_id, destination);
            } else {
                println!("not published: {} -> {}", entry_id, destination);
            }
        }
        LedgerCommands::Stats { json } => {
            let counts: Vec<DestinationCount> = ledger
                .counts_by_destination()
                .await?
                .into_iter()
                .map(|(destination, entries)| DestinationCount {
                    destination,
                    entries,
                })
                .collect();

            if json {
                println!("{}", serde_json::to_string_pretty(&counts)?);
            } else if counts.is_empty() {
                println!("Ledger is empty");
            } else {
                for count in &counts {
                    println!("{}\t{}", count.destination, count.entries);
                }
            }
        }
    }

    Ok(())
}
