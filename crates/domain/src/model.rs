//! Domain models and value objects

use serde::{Deserialize, Serialize};

/// Hashtag candidates extracted by the feed layer, grouped by origin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagSources {
    /// `#word` tokens found in the title
    #[serde(default)]
    pub title: Vec<String>,
    /// Trailing `#word` tokens stripped from the end of the content
    #[serde(default)]
    pub content: Vec<String>,
    /// Feed-format categories
    #[serde(default)]
    pub category: Vec<String>,
}

/// A normalized feed item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Entry title (plain text)
    pub title: String,
    /// Canonical link, used as identity
    pub link: String,
    /// Raw content, possibly HTML, possibly empty
    #[serde(default)]
    pub content: String,
    /// Published/updated timestamp exactly as the feed wrote it
    pub published_date: Option<String>,
    /// Tag candidates by origin
    #[serde(default)]
    pub tag_sources: TagSources,
    /// Image attached to the entry, if any
    pub media_url: Option<String>,
}

impl Entry {
    /// Ledger identity of this entry.
    ///
    /// The link alone, or `link + " " + published_date` when the feed supplies
    /// a date. Existing ledgers depend on this exact concatenation.
    pub fn identifier(&self) -> String {
        match self.published_date.as_deref() {
            Some(date) if !date.is_empty() => format!("{} {}", self.link, date),
            _ => self.link.clone(),
        }
    }
}

/// A ledger row: this entry is done for this destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishRecord {
    /// `Entry::identifier()`
    pub entry_id: String,
    /// Configured destination name
    pub destination: String,
}

impl PublishRecord {
    pub fn new(entry_id: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
            destination: destination.into(),
        }
    }
}

/// Payload handed to a destination adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedPost {
    /// Ledger identity of the source entry
    pub entry_id: String,
    /// Fully composed status text (prefix, body, tags, suffix, link)
    pub text: String,
    /// Entry title
    pub title: String,
    /// Link as it appears in the text (possibly shortened)
    pub link: String,
    /// Resolved tag list, in priority order
    pub tags: Vec<String>,
    /// Plain-text content when content inclusion is enabled
    pub content: Option<String>,
    /// Media to attach when media inclusion is enabled
    pub media_url: Option<String>,
}

/// Why an (entry, destination) pair was not delivered in this run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// A ledger row already exists
    AlreadyPublished,
    /// The destination's run budget is exhausted
    BudgetReached,
    /// The adapter chose not to post
    Declined(String),
    /// Dry-run mode, nothing was sent
    DryRun,
}

/// Result of processing one (entry, destination) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered by the adapter
    Delivered {
        post_id: Option<String>,
        recorded: bool,
    },
    /// Marked as done without posting
    Seeded { recorded: bool },
    /// Left eligible for a later run
    Skipped(SkipReason),
    /// Adapter failure, left eligible for a later run
    Failed { error: String },
}

/// One line of the run report
#[derive(Debug, Clone)]
pub struct OutcomeRecord {
    pub feed: String,
    pub entry_id: String,
    pub destination: String,
    pub outcome: Outcome,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Pairs for which the adapter was called
    pub attempted: usize,
    pub delivered: usize,
    pub seeded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Delivered or seeded pairs whose ledger write failed
    pub unrecorded: usize,
}

impl RunSummary {
    /// Fold one outcome into the counters
    pub fn add(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Delivered { recorded, .. } => {
                self.attempted += 1;
                self.delivered += 1;
                if !recorded {
                    self.unrecorded += 1;
                }
            }
            Outcome::Seeded { recorded } => {
                self.seeded += 1;
                if !recorded {
                    self.unrecorded += 1;
                }
            }
            Outcome::Skipped(SkipReason::Declined(_)) => {
                self.attempted += 1;
                self.skipped += 1;
            }
            Outcome::Skipped(_) => self.skipped += 1,
            Outcome::Failed { .. } => {
                self.attempted += 1;
                self.failed += 1;
            }
        }
    }
}

/// Full report of a run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub summary: RunSummary,
    pub outcomes: Vec<OutcomeRecord>,
}

impl RunReport {
    pub fn push(&mut self, record: OutcomeRecord) {
        self.summary.add(&record.outcome);
        self.outcomes.push(record);
    }
}
