//! Publication tracking - the durable ledger plus per-run post budgets

use std::collections::HashMap;
use std::sync::Arc;

use crate::model::{PreparedPost, PublishRecord};
use crate::policy::{DestinationSettings, FeedSettings};
use crate::ports::{Delivery, Destination, DeliveryError, Ledger, LedgerError};

/// Result of `post_within_limits`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostAttempt {
    /// The adapter delivered the post and the run counter was incremented
    Delivered {
        id: Option<String>,
        url: Option<String>,
    },
    /// The adapter declined; nothing is recorded
    Declined(String),
    /// The destination's positive `max_posts` was already reached
    BudgetReached,
}

/// Transient per-run counters, keyed by destination and feed name
#[derive(Debug, Clone, Default)]
pub struct RunCounters {
    destinations: HashMap<String, u32>,
    feeds: HashMap<String, u32>,
}

impl RunCounters {
    pub fn destination_posts(&self, destination: &str) -> u32 {
        self.destinations.get(destination).copied().unwrap_or(0)
    }

    pub fn feed_posts(&self, feed: &str) -> u32 {
        self.feeds.get(feed).copied().unwrap_or(0)
    }
}

/// Publication tracker for one run.
///
/// Counters start at zero for every tracker, so a fresh tracker per run gives
/// per-invocation limits while the ledger carries dedup across runs.
pub struct PublicationTracker<L: Ledger + ?Sized> {
    ledger: Arc<L>,
    counters: RunCounters,
}

impl<L: Ledger + ?Sized> PublicationTracker<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            counters: RunCounters::default(),
        }
    }

    pub fn counters(&self) -> &RunCounters {
        &self.counters
    }

    pub async fn is_published(&self, entry_id: &str, destination: &str) -> Result<bool, LedgerError> {
        self.ledger.is_published(entry_id, destination).await
    }

    /// Insert the ledger row; callers check `is_published` right before
    pub async fn record_published(&self, entry_id: &str, destination: &str) -> Result<(), LedgerError> {
        self.ledger
            .record_published(&PublishRecord::new(entry_id, destination))
            .await
    }

    /// Whether the entry at 1-based `item_index` is seeded instead of posted.
    ///
    /// Either a negative feed or a negative destination `max_posts` seeds.
    pub fn should_seed(
        &self,
        item_index: usize,
        feed: &FeedSettings,
        destination: &DestinationSettings,
    ) -> bool {
        feed.budget.seeds(item_index) || destination.budget.seeds(item_index)
    }

    pub fn destination_budget_reached(&self, destination: &DestinationSettings) -> bool {
        destination
            .budget
            .is_exhausted(self.counters.destination_posts(&destination.name))
    }

    pub fn feed_budget_reached(&self, feed: &FeedSettings) -> bool {
        feed.budget.is_exhausted(self.counters.feed_posts(&feed.name))
    }

    /// Count an entry delivered to at least one destination against its feed
    pub fn record_feed_delivery(&mut self, feed: &FeedSettings) {
        *self.counters.feeds.entry(feed.name.clone()).or_insert(0) += 1;
    }

    /// Deliver `post` unless the destination's run budget is exhausted.
    ///
    /// The destination's delay is slept before every delivery except while
    /// it has no successful post in this run yet.
    pub async fn post_within_limits(
        &mut self,
        settings: &DestinationSettings,
        adapter: &dyn Destination,
        post: &PreparedPost,
    ) -> Result<PostAttempt, DeliveryError> {
        if self.destination_budget_reached(settings) {
            return Ok(PostAttempt::BudgetReached);
        }

        let done = self.counters.destination_posts(&settings.name);
        if let Some(delay) = settings.delay.filter(|d| done > 0 && !d.is_zero()) {
            tracing::debug!(
                destination = %settings.name,
                delay_ms = delay.as_millis() as u64,
                "Waiting before next post"
            );
            tokio::time::sleep(delay).await;
        }

        match adapter.deliver(post).await? {
            Delivery::Posted { id, url } => {
                *self
                    .counters
                    .destinations
                    .entry(settings.name.clone())
                    .or_insert(0) += 1;
                Ok(PostAttempt::Delivered { id, url })
            }
            Delivery::Declined(reason) => Ok(PostAttempt::Declined(reason)),
        }
    }
}
