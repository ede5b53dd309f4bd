//! Run loop use case - walks feeds, entries and destinations once

use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    model::{Entry, Outcome, OutcomeRecord, RunReport, SkipReason},
    policy::{DestinationSettings, EffectiveOptions, FeedSettings},
    ports::{Destination, FeedSource, Ledger, UrlShortener},
    usecases::{
        compose::ContractViolation,
        render::Renderer,
        tags::select_tags,
        tracker::{PostAttempt, PublicationTracker},
    },
};

/// Configuration for the run loop
#[derive(Debug, Clone, Default)]
pub struct RunLoopConfig {
    /// Render and log, but never call adapters or write the ledger
    pub dry_run: bool,
}

/// A feed together with its settings
#[derive(Clone)]
pub struct ConnectedFeed {
    pub settings: FeedSettings,
    pub source: Arc<dyn FeedSource>,
}

/// A destination adapter together with its settings
#[derive(Clone)]
pub struct ConnectedDestination {
    pub settings: DestinationSettings,
    pub adapter: Arc<dyn Destination>,
}

/// Run loop orchestrator
pub struct RunLoop<L>
where
    L: Ledger + ?Sized,
{
    feeds: Vec<ConnectedFeed>,
    destinations: Vec<ConnectedDestination>,
    ledger: Arc<L>,
    shorteners: HashMap<String, Arc<dyn UrlShortener>>,
    renderer: Renderer,
    config: RunLoopConfig,
}

impl<L> RunLoop<L>
where
    L: Ledger + ?Sized,
{
    pub fn new(
        feeds: Vec<ConnectedFeed>,
        destinations: Vec<ConnectedDestination>,
        ledger: Arc<L>,
        config: RunLoopConfig,
    ) -> Self {
        Self {
            feeds,
            destinations,
            ledger,
            shorteners: HashMap::new(),
            renderer: Renderer::default(),
            config,
        }
    }

    /// Register a URL shortener under its lower-cased name
    pub fn with_shortener(mut self, shortener: Arc<dyn UrlShortener>) -> Self {
        self.shorteners
            .insert(shortener.name().to_lowercase(), shortener);
        self
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Process every feed once.
    ///
    /// Delivery and ledger failures are logged and reported per pair; only a
    /// composer contract violation aborts the run.
    pub async fn run_once(&self) -> Result<RunReport, RunLoopError> {
        if self.destinations.is_empty() {
            return Err(RunLoopError::NoDestinations);
        }

        let mut tracker = PublicationTracker::new(Arc::clone(&self.ledger));
        let mut report = RunReport::default();

        for feed in &self.feeds {
            self.process_feed(feed, &mut tracker, &mut report).await?;
        }

        let summary = &report.summary;
        tracing::info!(
            attempted = summary.attempted,
            delivered = summary.delivered,
            seeded = summary.seeded,
            skipped = summary.skipped,
            failed = summary.failed,
            unrecorded = summary.unrecorded,
            dry_run = self.config.dry_run,
            "Run complete"
        );

        Ok(report)
    }

    async fn process_feed(
        &self,
        feed: &ConnectedFeed,
        tracker: &mut PublicationTracker<L>,
        report: &mut RunReport,
    ) -> Result<(), RunLoopError> {
        let name = &feed.settings.name;
        tracing::info!(feed = %name, location = %feed.source.location(), "Fetching feed");

        let entries = match feed.source.fetch_entries().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(feed = %name, error = %e, "Failed to fetch feed");
                // Continue with other feeds
                return Ok(());
            }
        };

        tracing::info!(feed = %name, count = entries.len(), "Fetched entries");

        let mut seed_only = false;
        for (index, entry) in entries.iter().enumerate() {
            let item_index = index + 1;

            // Once nothing can be posted, keep walking only for pending seeds
            if !seed_only {
                if tracker.feed_budget_reached(&feed.settings) {
                    tracing::info!(feed = %name, budget = %feed.settings.budget, "Feed post budget reached");
                    seed_only = true;
                } else if self
                    .destinations
                    .iter()
                    .all(|d| tracker.destination_budget_reached(&d.settings))
                {
                    tracing::info!(feed = %name, "Every destination reached its post budget");
                    seed_only = true;
                }
            }

            // Seed windows cover leading ordinals only
            if seed_only
                && !self
                    .destinations
                    .iter()
                    .any(|d| tracker.should_seed(item_index, &feed.settings, &d.settings))
            {
                break;
            }

            let entry_id = entry.identifier();
            let mut delivered = false;

            for destination in &self.destinations {
                if seed_only
                    && !tracker.should_seed(item_index, &feed.settings, &destination.settings)
                {
                    continue;
                }
                let outcome = self
                    .process_pair(feed, item_index, entry, &entry_id, destination, tracker)
                    .await?;
                delivered |= matches!(outcome, Outcome::Delivered { .. });
                report.push(OutcomeRecord {
                    feed: name.clone(),
                    entry_id: entry_id.clone(),
                    destination: destination.settings.name.clone(),
                    outcome,
                });
            }

            if delivered {
                tracker.record_feed_delivery(&feed.settings);
            }
        }

        Ok(())
    }

    /// Process one (entry, destination) pair
    async fn process_pair(
        &self,
        feed: &ConnectedFeed,
        item_index: usize,
        entry: &Entry,
        entry_id: &str,
        destination: &ConnectedDestination,
        tracker: &mut PublicationTracker<L>,
    ) -> Result<Outcome, RunLoopError> {
        let name = destination.settings.name.as_str();

        // Check idempotency
        match tracker.is_published(entry_id, name).await {
            Ok(true) => {
                tracing::debug!(entry_id = %entry_id, destination = %name, "Already published");
                return Ok(Outcome::Skipped(SkipReason::AlreadyPublished));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to check ledger, continuing");
            }
            Ok(false) => {}
        }

        if tracker.should_seed(item_index, &feed.settings, &destination.settings) {
            if self.config.dry_run {
                tracing::info!(entry_id = %entry_id, destination = %name, "[DRY RUN] Would seed");
                return Ok(Outcome::Skipped(SkipReason::DryRun));
            }
            tracing::info!(entry_id = %entry_id, destination = %name, item_index, "Seeding entry");
            let recorded = self.record(tracker, entry_id, name).await;
            return Ok(Outcome::Seeded { recorded });
        }

        if tracker.destination_budget_reached(&destination.settings) {
            return Ok(Outcome::Skipped(SkipReason::BudgetReached));
        }

        let options = EffectiveOptions::resolve(&feed.settings.options, &destination.settings.options);
        let tags = select_tags(entry, &options);
        let link = self.shorten(&options, &entry.link).await;
        let post = self.renderer.render(
            entry,
            &tags,
            &options,
            &destination.adapter.profile(),
            &link,
        )?;

        if self.config.dry_run {
            tracing::info!(
                entry_id = %entry_id,
                destination = %name,
                rendered_text = %post.text,
                "[DRY RUN] Would publish"
            );
            return Ok(Outcome::Skipped(SkipReason::DryRun));
        }

        let attempt = tracker
            .post_within_limits(&destination.settings, destination.adapter.as_ref(), &post)
            .await;

        let outcome = match attempt {
            Ok(PostAttempt::Delivered { id, url }) => {
                tracing::info!(
                    entry_id = %entry_id,
                    destination = %name,
                    post_id = ?id,
                    url = ?url,
                    "Published"
                );
                let recorded = self.record(tracker, entry_id, name).await;
                Outcome::Delivered {
                    post_id: id,
                    recorded,
                }
            }
            Ok(PostAttempt::Declined(reason)) => {
                tracing::info!(entry_id = %entry_id, destination = %name, reason = %reason, "Declined");
                Outcome::Skipped(SkipReason::Declined(reason))
            }
            Ok(PostAttempt::BudgetReached) => Outcome::Skipped(SkipReason::BudgetReached),
            Err(e) => {
                tracing::error!(
                    entry_id = %entry_id,
                    destination = %name,
                    kind = destination.adapter.kind(),
                    error = %e,
                    "Failed to publish"
                );
                Outcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        Ok(outcome)
    }

    /// Write the ledger row, reporting whether it stuck
    async fn record(&self, tracker: &PublicationTracker<L>, entry_id: &str, destination: &str) -> bool {
        match tracker.record_published(entry_id, destination).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    entry_id = %entry_id,
                    destination = %destination,
                    error = %e,
                    "Failed to record published state"
                );
                false
            }
        }
    }

    /// Shortened link when a shortener is selected and its result is no longer
    async fn shorten(&self, options: &EffectiveOptions, link: &str) -> String {
        let Some(name) = options.url_shortener.as_deref() else {
            return link.to_string();
        };
        let Some(shortener) = self.shorteners.get(name) else {
            tracing::warn!(shortener = %name, "Unknown URL shortener, using original link");
            return link.to_string();
        };

        match shortener.shorten(link).await {
            Ok(short) if short.chars().count() <= link.chars().count() => short,
            Ok(short) => {
                tracing::debug!(link = %link, short = %short, "Shortened link is longer than the original");
                link.to_string()
            }
            Err(e) => {
                tracing::error!(shortener = %name, link = %link, error = %e, "Failed to shorten link");
                link.to_string()
            }
        }
    }
}

/// Errors from the run loop
#[derive(Debug, thiserror::Error)]
pub enum RunLoopError {
    #[error("No destination connected, aborting publication")]
    NoDestinations,
    #[error(transparent)]
    Contract(#[from] ContractViolation),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PreparedPost, PublishRecord};
    use crate::policy::{PostBudget, PostOptions};
    use crate::ports::{
        Delivery, DeliveryError, FeedError, LedgerError, RenderProfile, ShortenError,
    };
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    // Fake implementations for testing
    struct FakeFeed {
        entries: Vec<Entry>,
    }

    #[async_trait]
    impl FeedSource for FakeFeed {
        fn location(&self) -> &str {
            "fake://feed"
        }

        async fn fetch_entries(&self) -> Result<Vec<Entry>, FeedError> {
            Ok(self.entries.clone())
        }
    }

    struct BrokenFeed;

    #[async_trait]
    impl FeedSource for BrokenFeed {
        fn location(&self) -> &str {
            "fake://broken"
        }

        async fn fetch_entries(&self) -> Result<Vec<Entry>, FeedError> {
            Err(FeedError::Network("connection refused".to_string()))
        }
    }

    #[derive(Default)]
    struct FakeDestination {
        posted: Mutex<Vec<PreparedPost>>,
        calls: Mutex<usize>,
        fail: bool,
        decline: bool,
        max_chars: Option<usize>,
    }

    impl FakeDestination {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn declining() -> Self {
            Self {
                decline: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }

        fn posted_ids(&self) -> Vec<String> {
            self.posted
                .lock()
                .unwrap()
                .iter()
                .map(|p| p.entry_id.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Destination for FakeDestination {
        fn kind(&self) -> &'static str {
            "fake"
        }

        fn profile(&self) -> RenderProfile {
            RenderProfile {
                max_chars: self.max_chars,
                ..Default::default()
            }
        }

        async fn deliver(&self, post: &PreparedPost) -> Result<Delivery, DeliveryError> {
            *self.calls.lock().unwrap() += 1;
            if self.decline {
                return Ok(Delivery::Declined("not today".to_string()));
            }
            if self.fail {
                return Err(DeliveryError::Api("boom".to_string()));
            }
            self.posted.lock().unwrap().push(post.clone());
            Ok(Delivery::Posted {
                id: Some("fake_id".to_string()),
                url: None,
            })
        }
    }

    #[derive(Default)]
    struct FakeLedger {
        rows: Mutex<HashSet<(String, String)>>,
        fail_writes: bool,
    }

    impl FakeLedger {
        fn contains(&self, entry_id: &str, destination: &str) -> bool {
            self.rows
                .lock()
                .unwrap()
                .contains(&(entry_id.to_string(), destination.to_string()))
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Ledger for FakeLedger {
        async fn is_published(&self, entry_id: &str, destination: &str) -> Result<bool, LedgerError> {
            Ok(self.contains(entry_id, destination))
        }

        async fn record_published(&self, record: &PublishRecord) -> Result<(), LedgerError> {
            if self.fail_writes {
                return Err(LedgerError::Database("disk full".to_string()));
            }
            self.rows
                .lock()
                .unwrap()
                .insert((record.entry_id.clone(), record.destination.clone()));
            Ok(())
        }

        async fn counts_by_destination(&self) -> Result<Vec<(String, u64)>, LedgerError> {
            Ok(vec![])
        }
    }

    struct FakeShortener {
        result: Result<String, ()>,
    }

    #[async_trait]
    impl UrlShortener for FakeShortener {
        fn name(&self) -> &str {
            "fake"
        }

        async fn shorten(&self, _url: &str) -> Result<String, ShortenError> {
            self.result
                .clone()
                .map_err(|_| ShortenError::Api("unavailable".to_string()))
        }
    }

    fn feed(count: usize) -> ConnectedFeed {
        named_feed("feed", "https://example.org", count, PostBudget::Unlimited)
    }

    fn named_feed(name: &str, base: &str, count: usize, budget: PostBudget) -> ConnectedFeed {
        let entries = (1..=count)
            .map(|i| Entry {
                title: format!("Entry number {}", i),
                link: format!("{}/{}", base, i),
                ..Default::default()
            })
            .collect();
        ConnectedFeed {
            settings: FeedSettings {
                budget,
                ..FeedSettings::new(name)
            },
            source: Arc::new(FakeFeed { entries }),
        }
    }

    fn destination(
        name: &str,
        budget: PostBudget,
        adapter: Arc<FakeDestination>,
    ) -> ConnectedDestination {
        ConnectedDestination {
            settings: DestinationSettings {
                budget,
                ..DestinationSettings::new(name)
            },
            adapter,
        }
    }

    #[tokio::test]
    async fn test_capped_destination_leaves_rest_unpublished() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![feed(3)],
            vec![destination("dest", PostBudget::Capped(1), Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();

        assert_eq!(adapter.posted_ids(), vec!["https://example.org/1"]);
        assert_eq!(report.summary.delivered, 1);
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.contains("https://example.org/2", "dest"));
        assert!(!ledger.contains("https://example.org/3", "dest"));
    }

    #[tokio::test]
    async fn test_seeding_marks_leading_entries_without_posting() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![feed(5)],
            vec![destination("dest", PostBudget::Seed(2), Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();

        assert_eq!(
            adapter.posted_ids(),
            vec![
                "https://example.org/3",
                "https://example.org/4",
                "https://example.org/5"
            ]
        );
        assert_eq!(report.summary.seeded, 2);
        assert_eq!(report.summary.delivered, 3);
        assert_eq!(ledger.len(), 5);
    }

    #[tokio::test]
    async fn test_failure_is_isolated_per_destination() {
        let ledger = Arc::new(FakeLedger::default());
        let broken = Arc::new(FakeDestination::failing());
        let healthy = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![feed(2)],
            vec![
                destination("broken", PostBudget::Unlimited, Arc::clone(&broken)),
                destination("healthy", PostBudget::Unlimited, Arc::clone(&healthy)),
            ],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();

        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.summary.delivered, 2);
        assert_eq!(report.summary.attempted, 4);
        assert_eq!(healthy.posted_ids().len(), 2);
        assert!(!ledger.contains("https://example.org/1", "broken"));
        assert!(ledger.contains("https://example.org/1", "healthy"));
    }

    #[tokio::test]
    async fn test_second_run_never_redelivers() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![feed(3)],
            vec![destination("dest", PostBudget::Unlimited, Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        run_loop.run_once().await.unwrap();
        let second = run_loop.run_once().await.unwrap();

        assert_eq!(adapter.posted_ids().len(), 3);
        assert_eq!(second.summary.delivered, 0);
        assert_eq!(second.summary.skipped, 3);
        assert!(
            second
                .outcomes
                .iter()
                .all(|o| o.outcome == Outcome::Skipped(SkipReason::AlreadyPublished))
        );
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![feed(2)],
            vec![destination("dest", PostBudget::Seed(1), Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig { dry_run: true },
        );

        let report = run_loop.run_once().await.unwrap();

        assert!(adapter.posted_ids().is_empty());
        assert_eq!(ledger.len(), 0);
        assert_eq!(report.summary.skipped, 2);
    }

    #[tokio::test]
    async fn test_feed_budget_stops_feed() {
        let ledger = Arc::new(FakeLedger::default());
        let first = Arc::new(FakeDestination::default());
        let second = Arc::new(FakeDestination::default());
        let mut capped = feed(4);
        capped.settings.budget = PostBudget::Capped(2);

        let run_loop = RunLoop::new(
            vec![capped],
            vec![
                destination("one", PostBudget::Unlimited, Arc::clone(&first)),
                destination("two", PostBudget::Unlimited, Arc::clone(&second)),
            ],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        run_loop.run_once().await.unwrap();

        // Two entries, each delivered to both destinations
        assert_eq!(first.posted_ids().len(), 2);
        assert_eq!(second.posted_ids().len(), 2);
        assert_eq!(ledger.len(), 4);
    }

    #[tokio::test]
    async fn test_broken_feed_does_not_stop_others() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::default());
        let broken = ConnectedFeed {
            settings: FeedSettings::new("broken"),
            source: Arc::new(BrokenFeed),
        };
        let run_loop = RunLoop::new(
            vec![broken, feed(1)],
            vec![destination("dest", PostBudget::Unlimited, Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();
        assert_eq!(report.summary.delivered, 1);
    }

    #[tokio::test]
    async fn test_ledger_write_failure_is_reported_unrecorded() {
        let ledger = Arc::new(FakeLedger {
            fail_writes: true,
            ..Default::default()
        });
        let adapter = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![feed(1)],
            vec![destination("dest", PostBudget::Unlimited, Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();
        assert_eq!(report.summary.delivered, 1);
        assert_eq!(report.summary.unrecorded, 1);
    }

    #[tokio::test]
    async fn test_no_destinations_is_an_error() {
        let run_loop = RunLoop::new(
            vec![feed(1)],
            vec![],
            Arc::new(FakeLedger::default()),
            RunLoopConfig::default(),
        );
        assert!(matches!(
            run_loop.run_once().await,
            Err(RunLoopError::NoDestinations)
        ));
    }

    #[tokio::test]
    async fn test_too_small_budget_aborts_run() {
        let adapter = Arc::new(FakeDestination {
            max_chars: Some(10),
            ..Default::default()
        });
        let run_loop = RunLoop::new(
            vec![feed(1)],
            vec![destination("dest", PostBudget::Unlimited, adapter)],
            Arc::new(FakeLedger::default()),
            RunLoopConfig::default(),
        );
        assert!(matches!(
            run_loop.run_once().await,
            Err(RunLoopError::Contract(_))
        ));
    }

    #[tokio::test]
    async fn test_shortened_link_used_only_when_shorter() {
        let make = |result: Result<String, ()>| {
            let adapter = Arc::new(FakeDestination::default());
            let mut dest = destination("dest", PostBudget::Unlimited, Arc::clone(&adapter));
            dest.settings.options = PostOptions {
                url_shortener: Some("Fake".to_string()),
                ..Default::default()
            };
            let run_loop = RunLoop::new(
                vec![feed(1)],
                vec![dest],
                Arc::new(FakeLedger::default()),
                RunLoopConfig::default(),
            )
            .with_shortener(Arc::new(FakeShortener { result }));
            (run_loop, adapter)
        };

        let (run_loop, adapter) = make(Ok("https://s.io/1".to_string()));
        run_loop.run_once().await.unwrap();
        assert_eq!(adapter.posted.lock().unwrap()[0].link, "https://s.io/1");

        let (run_loop, adapter) = make(Err(()));
        run_loop.run_once().await.unwrap();
        assert_eq!(adapter.posted.lock().unwrap()[0].link, "https://example.org/1");

        let (run_loop, adapter) = make(Ok("https://a-much-longer-link.example/1".to_string()));
        run_loop.run_once().await.unwrap();
        assert_eq!(adapter.posted.lock().unwrap()[0].link, "https://example.org/1");
    }

    #[tokio::test]
    async fn test_declined_post_leaves_no_ledger_row() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::declining());
        let run_loop = RunLoop::new(
            vec![feed(2)],
            vec![destination("picky", PostBudget::Unlimited, Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();

        assert_eq!(adapter.calls(), 2);
        assert_eq!(ledger.len(), 0);
        assert_eq!(report.summary.attempted, 2);
        assert_eq!(report.summary.skipped, 2);
        assert!(matches!(
            report.outcomes[0].outcome,
            Outcome::Skipped(SkipReason::Declined(_))
        ));

        // Still eligible on the next run
        run_loop.run_once().await.unwrap();
        assert_eq!(adapter.calls(), 4);
    }

    #[tokio::test]
    async fn test_feed_seed_budget_seeds_every_destination() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![named_feed("seeded", "https://example.org", 5, PostBudget::Seed(2))],
            vec![destination("dest", PostBudget::Unlimited, Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();

        assert_eq!(report.summary.seeded, 2);
        assert!(ledger.contains("https://example.org/1", "dest"));
        assert!(ledger.contains("https://example.org/2", "dest"));
        assert_eq!(
            adapter.posted_ids(),
            vec![
                "https://example.org/3",
                "https://example.org/4",
                "https://example.org/5"
            ]
        );
        assert_eq!(adapter.calls(), 3);
    }

    #[tokio::test]
    async fn test_spent_destination_budget_keeps_seeding_later_feeds() {
        let ledger = Arc::new(FakeLedger::default());
        let adapter = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![
                named_feed("a", "https://a", 1, PostBudget::Unlimited),
                named_feed("b", "https://b", 5, PostBudget::Seed(3)),
            ],
            vec![destination("dest", PostBudget::Capped(1), Arc::clone(&adapter))],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();

        assert_eq!(adapter.posted_ids(), vec!["https://a/1"]);
        assert_eq!(report.summary.seeded, 3);
        for seeded in ["https://b/1", "https://b/2", "https://b/3"] {
            assert!(ledger.contains(seeded, "dest"));
        }
        assert!(!ledger.contains("https://b/4", "dest"));
        assert!(!ledger.contains("https://b/5", "dest"));
    }

    #[tokio::test]
    async fn test_feed_cap_keeps_destination_seeding() {
        let ledger = Arc::new(FakeLedger::default());
        let seeder = Arc::new(FakeDestination::default());
        let poster = Arc::new(FakeDestination::default());
        let run_loop = RunLoop::new(
            vec![named_feed("f", "https://f", 5, PostBudget::Capped(2))],
            vec![
                destination("seeder", PostBudget::Seed(3), Arc::clone(&seeder)),
                destination("poster", PostBudget::Unlimited, Arc::clone(&poster)),
            ],
            Arc::clone(&ledger),
            RunLoopConfig::default(),
        );

        let report = run_loop.run_once().await.unwrap();

        assert_eq!(report.summary.seeded, 3);
        assert_eq!(seeder.calls(), 0);
        for seeded in ["https://f/1", "https://f/2", "https://f/3"] {
            assert!(ledger.contains(seeded, "seeder"));
        }
        assert_eq!(poster.posted_ids(), vec!["https://f/1", "https://f/2"]);
        assert!(!ledger.contains("https://f/3", "poster"));
    }
}
