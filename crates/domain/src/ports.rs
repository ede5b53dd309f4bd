//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Entry, PreparedPost, PublishRecord};

/// Error type for feed retrieval and parsing
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("No entry or item found in {0}")]
    UnknownFormat(String),
}

/// Port for reading a feed.
///
/// Entries must be yielded oldest first.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Location of the feed (path or URL), used in logs and reports
    fn location(&self) -> &str;

    /// Fetch and normalize all entries
    async fn fetch_entries(&self) -> Result<Vec<Entry>, FeedError>;
}

/// Recoverable delivery failure; the pair stays eligible for a later run
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("API error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Rate limited")]
    RateLimited,
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("Content too long: {len} > {max}")]
    ContentTooLong { len: usize, max: usize },
}

/// Successful adapter call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The post went out
    Posted {
        /// Platform-specific post ID
        id: Option<String>,
        /// URL of the published post, if available
        url: Option<String>,
    },
    /// The adapter chose not to post; the pair stays eligible
    Declined(String),
}

/// Text constraints of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderProfile {
    /// Maximum status length in chars; `None` for no limit
    pub max_chars: Option<usize>,
    /// Fixed length the platform charges for a link (e.g. 23 on X)
    pub link_cost: Option<usize>,
    /// Whether the link is appended to the text
    pub include_link: bool,
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self {
            max_chars: None,
            link_cost: None,
            include_link: true,
        }
    }
}

/// Port for a posting target (one social account)
#[async_trait]
pub trait Destination: Send + Sync {
    /// Registry tag of the adapter (e.g., "mastodon", "x")
    fn kind(&self) -> &'static str;

    /// Text constraints used when rendering for this destination
    fn profile(&self) -> RenderProfile;

    /// Deliver a prepared post
    async fn deliver(&self, post: &PreparedPost) -> Result<Delivery, DeliveryError>;
}

/// Error type for ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Database error: {0}")]
    Database(String),
}

/// Port for the durable delivery ledger
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Whether a row exists for this (entry, destination) pair
    async fn is_published(&self, entry_id: &str, destination: &str) -> Result<bool, LedgerError>;

    /// Insert a row; callers check `is_published` first
    async fn record_published(&self, record: &PublishRecord) -> Result<(), LedgerError>;

    /// Number of rows per destination, sorted by destination name
    async fn counts_by_destination(&self) -> Result<Vec<(String, u64)>, LedgerError>;
}

/// Error type for URL shortening
#[derive(Debug, Error)]
pub enum ShortenError {
    #[error("Shortener error: {0}")]
    Api(String),
    #[error("Network error: {0}")]
    Network(String),
}

/// Port for URL shortening services
#[async_trait]
pub trait UrlShortener: Send + Sync {
    /// Name matched against the `url_shortener` option (lower-case)
    fn name(&self) -> &str;

    async fn shorten(&self, url: &str) -> Result<String, ShortenError>;
}
