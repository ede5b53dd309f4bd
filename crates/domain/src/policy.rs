//! Posting policy: per-destination and per-feed options and post budgets

use std::fmt;
use std::time::Duration;

/// Default cap on the number of tags per post
pub const DEFAULT_MAX_TAGS: usize = 100;

/// Tag filtering flags (`tag_filter_opts`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagFilter {
    pub ignore_title: bool,
    pub ignore_content: bool,
    pub ignore_category: bool,
    pub case_sensitive: bool,
}

impl TagFilter {
    /// Parse a comma-separated flag set, e.g. `"ignore_title, case-sensitive"`
    pub fn parse(raw: &str) -> Result<Self, OptionsError> {
        let mut filter = Self::default();
        for flag in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
            match flag {
                "ignore_title" => filter.ignore_title = true,
                "ignore_content" => filter.ignore_content = true,
                "ignore_category" => filter.ignore_category = true,
                "case-sensitive" => filter.case_sensitive = true,
                other => return Err(OptionsError::UnknownTagFilter(other.to_string())),
            }
        }
        Ok(filter)
    }
}

/// Split a comma-separated tag string into trimmed, non-empty tags
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Run budget derived from `max_posts`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostBudget {
    /// `max_posts = 0`
    #[default]
    Unlimited,
    /// `max_posts > 0`: at most this many posts per run
    Capped(u32),
    /// `max_posts < 0`: mark this many leading entries as done without posting
    Seed(u32),
}

impl PostBudget {
    pub fn from_max_posts(max_posts: i64) -> Self {
        match max_posts {
            0 => Self::Unlimited,
            n if n > 0 => Self::Capped(u32::try_from(n).unwrap_or(u32::MAX)),
            n => Self::Seed(u32::try_from(n.unsigned_abs()).unwrap_or(u32::MAX)),
        }
    }

    /// Whether `done` posts exhaust this budget
    pub fn is_exhausted(&self, done: u32) -> bool {
        matches!(self, Self::Capped(cap) if done >= *cap)
    }

    /// Whether the entry at 1-based `item_index` is seeded rather than posted
    pub fn seeds(&self, item_index: usize) -> bool {
        match self {
            Self::Seed(count) => item_index <= *count as usize,
            _ => false,
        }
    }
}

impl fmt::Display for PostBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Capped(n) => write!(f, "at most {} per run", n),
            Self::Seed(n) => write!(f, "seed first {}", n),
        }
    }
}

/// `item_index + max_posts <= 0` for negative `max_posts`
pub fn should_seed(item_index: usize, max_posts: i64) -> bool {
    PostBudget::from_max_posts(max_posts).seeds(item_index)
}

/// The override-able option set carried by both destinations and feeds.
///
/// `None` means "not set at this level".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostOptions {
    pub tags: Option<Vec<String>>,
    pub tag_filter: Option<TagFilter>,
    pub max_tags: Option<usize>,
    pub post_prefix: Option<String>,
    pub post_suffix: Option<String>,
    pub include_content: Option<bool>,
    pub include_media: Option<bool>,
    pub url_shortener: Option<String>,
}

/// Options after resolving feed over destination over built-in defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveOptions {
    pub tags: Vec<String>,
    pub tag_filter: TagFilter,
    pub max_tags: usize,
    pub post_prefix: String,
    pub post_suffix: String,
    pub include_content: bool,
    pub include_media: bool,
    /// Lower-cased shortener name; `None` when disabled
    pub url_shortener: Option<String>,
}

impl Default for EffectiveOptions {
    fn default() -> Self {
        Self::resolve(&PostOptions::default(), &PostOptions::default())
    }
}

impl EffectiveOptions {
    /// Feed value first, else destination value, else default
    pub fn resolve(feed: &PostOptions, destination: &PostOptions) -> Self {
        fn pick<T: Clone>(feed: &Option<T>, destination: &Option<T>) -> Option<T> {
            feed.clone().or_else(|| destination.clone())
        }

        let url_shortener = pick(&feed.url_shortener, &destination.url_shortener)
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty() && s != "none");

        Self {
            tags: pick(&feed.tags, &destination.tags).unwrap_or_default(),
            tag_filter: pick(&feed.tag_filter, &destination.tag_filter).unwrap_or_default(),
            max_tags: pick(&feed.max_tags, &destination.max_tags).unwrap_or(DEFAULT_MAX_TAGS),
            post_prefix: pick(&feed.post_prefix, &destination.post_prefix).unwrap_or_default(),
            post_suffix: pick(&feed.post_suffix, &destination.post_suffix).unwrap_or_default(),
            include_content: pick(&feed.include_content, &destination.include_content)
                .unwrap_or(false),
            include_media: pick(&feed.include_media, &destination.include_media)
                .unwrap_or(false),
            url_shortener,
        }
    }
}

/// Settings of one connected destination
#[derive(Debug, Clone, Default)]
pub struct DestinationSettings {
    /// Configured name, stored as the ledger's destination column
    pub name: String,
    pub options: PostOptions,
    pub budget: PostBudget,
    /// Pause before each delivery after the first successful one
    pub delay: Option<Duration>,
}

impl DestinationSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Settings of one connected feed
#[derive(Debug, Clone, Default)]
pub struct FeedSettings {
    /// Display name, the feed location unless configured
    pub name: String,
    /// Overrides applied on top of each destination's options
    pub options: PostOptions,
    pub budget: PostBudget,
}

impl FeedSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Malformed option strings
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("Unknown tag filter option '{0}' (expected ignore_title, ignore_content, ignore_category, case-sensitive)")]
    UnknownTagFilter(String),
}
