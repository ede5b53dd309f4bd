//! Run command - one pass over every feed

use anyhow::{Context, Result, bail};
use feed_relay_adapters::{
    feed::XmlFeedSource,
    ledger::SqliteLedger,
    outbox::{OutboxDestination, OutboxWriter},
    shortener::SimpleShortener,
};
use feed_relay_domain::{
    Destination, FeedSource, Outcome,
    usecases::{ConnectedDestination, ConnectedFeed, RunLoop, RunLoopConfig},
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::args::RunArgs;
use crate::config::{AppConfig, DestinationConfig};
use crate::registry::{BuildContext, DestinationRegistry, max_chars_for};

pub async fn execute(args: RunArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    config.validate()?;

    let dry_run = args.dry_run || config.general.dry_run;
    let enabled: Vec<&DestinationConfig> = config.enabled_destinations().collect();
    if enabled.is_empty() {
        bail!("No enabled destinations configured");
    }

    let registry = DestinationRegistry::default();
    registry.check_kinds(enabled.iter().copied())?;

    tracing::info!(
        dry_run = dry_run,
        outbox = ?args.outbox,
        feeds = config.feeds.len(),
        destinations = enabled.len(),
        "Starting feed-relay run"
    );

    let destinations = match &args.outbox {
        Some(path) => build_review_destinations(&enabled, path).await?,
        None => build_destinations(&config, &enabled, &registry, dry_run).await?,
    };

    let ledger = Arc::new(
        SqliteLedger::new(&config.general.ledger_path)
            .await
            .context("Failed to open ledger")?,
    );

    let feeds = config
        .feeds
        .iter()
        .map(|feed| {
            let source: Arc<dyn FeedSource> = Arc::new(XmlFeedSource::new(&feed.url));
            Ok(ConnectedFeed {
                settings: feed.to_settings()?,
                source,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut run_loop = RunLoop::new(feeds, destinations, ledger, RunLoopConfig { dry_run });
    for name in shortener_names(&config) {
        match SimpleShortener::by_name(&name) {
            Some(shortener) => run_loop = run_loop.with_shortener(Arc::new(shortener)),
            None => tracing::warn!(
                shortener = %name,
                "Unknown URL shortener, links will be posted as-is"
            ),
        }
    }

    let report = run_loop.run_once().await?;

    for record in &report.outcomes {
        match &record.outcome {
            Outcome::Delivered { post_id, recorded } => {
                tracing::debug!(
                    feed = %record.feed,
                    entry_id = %record.entry_id,
                    destination = %record.destination,
                    post_id = ?post_id,
                    recorded = recorded,
                    "Delivered"
                );
            }
            Outcome::Failed { error } => {
                tracing::warn!(
                    feed = %record.feed,
                    entry_id = %record.entry_id,
                    destination = %record.destination,
                    error = %error,
                    "Will retry on next run"
                );
            }
            _ => {}
        }
    }

    tracing::info!("feed-relay run completed");
    Ok(())
}

async fn build_destinations(
    config: &AppConfig,
    enabled: &[&DestinationConfig],
    registry: &DestinationRegistry,
    dry_run: bool,
) -> Result<Vec<ConnectedDestination>> {
    let outbox = if enabled
        .iter()
        .any(|d| d.kind.trim().eq_ignore_ascii_case("outbox"))
    {
        Some(open_outbox(config.general.outbox_path.clone()).await?)
    } else {
        None
    };
    let ctx = BuildContext { dry_run, outbox };

    enabled
        .iter()
        .map(|destination| {
            Ok(ConnectedDestination {
                settings: destination.to_settings()?,
                adapter: registry.build(destination, &ctx)?,
            })
        })
        .collect()
}

/// Every destination keeps its name and length limit but writes to the outbox
async fn build_review_destinations(
    enabled: &[&DestinationConfig],
    path: &Path,
) -> Result<Vec<ConnectedDestination>> {
    let writer = open_outbox(path.to_path_buf()).await?;
    tracing::info!(outbox = %path.display(), "Writing posts to outbox for review");

    enabled
        .iter()
        .map(|destination| {
            let adapter: Arc<dyn Destination> = Arc::new(
                OutboxDestination::new(writer.clone(), &destination.name)
                    .with_max_chars(max_chars_for(destination)),
            );
            Ok(ConnectedDestination {
                settings: destination.to_settings()?,
                adapter,
            })
        })
        .collect()
}

async fn open_outbox(path: PathBuf) -> Result<OutboxWriter> {
    let display = path.display().to_string();
    OutboxWriter::new(path)
        .await
        .with_context(|| format!("Failed to open outbox {}", display))
}

/// Shortener names referenced by any feed or destination
fn shortener_names(config: &AppConfig) -> BTreeSet<String> {
    config
        .feeds
        .iter()
        .map(|f| &f.options)
        .chain(config.enabled_destinations().map(|d| &d.options))
        .filter_map(|options| options.url_shortener.as_deref())
        .map(|name| name.trim().to_lowercase())
        .filter(|name| !name.is_empty() && name != "none")
        .collect()
}
