//! Configuration loading and management

use anyhow::{Context, Result, bail};
use feed_relay_domain::policy::{
    DestinationSettings, FeedSettings, PostBudget, PostOptions, TagFilter, parse_tag_list,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub feeds: Vec<FeedConfig>,

    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,

    /// File used by destinations of type `outbox`
    #[serde(default = "default_outbox_path")]
    pub outbox_path: PathBuf,
}

/// Posting options shared by feeds and destinations; a feed's value wins
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostOptionsConfig {
    /// Comma-separated tags added to every post
    #[serde(default)]
    pub tags: Option<String>,

    /// Comma-separated flags: ignore_title, ignore_content, ignore_category, case-sensitive
    #[serde(default)]
    pub tag_filter_opts: Option<String>,

    #[serde(default)]
    pub max_tags: Option<usize>,

    /// 0 = unlimited, n > 0 = at most n posts per run, n < 0 = seed n entries
    #[serde(default)]
    pub max_posts: Option<i64>,

    #[serde(default)]
    pub post_prefix: Option<String>,

    #[serde(default)]
    pub post_suffix: Option<String>,

    #[serde(default)]
    pub post_include_content: Option<bool>,

    #[serde(default)]
    pub post_include_media: Option<bool>,

    #[serde(default)]
    pub url_shortener: Option<String>,
}

impl PostOptionsConfig {
    pub fn to_options(&self) -> Result<PostOptions> {
        let tag_filter = self
            .tag_filter_opts
            .as_deref()
            .map(TagFilter::parse)
            .transpose()?;

        Ok(PostOptions {
            tags: self.tags.as_deref().map(parse_tag_list),
            tag_filter,
            max_tags: self.max_tags,
            post_prefix: self.post_prefix.clone(),
            post_suffix: self.post_suffix.clone(),
            include_content: self.post_include_content,
            include_media: self.post_include_media,
            url_shortener: self.url_shortener.clone(),
        })
    }

    pub fn budget(&self) -> PostBudget {
        PostBudget::from_max_posts(self.max_posts.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Local file path or http(s) URL
    pub url: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub options: PostOptionsConfig,
}

impl FeedConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.url)
    }

    pub fn to_settings(&self) -> Result<FeedSettings> {
        let options = self
            .options
            .to_options()
            .with_context(|| format!("Invalid options for feed {}", self.display_name()))?;

        Ok(FeedSettings {
            options,
            budget: self.options.budget(),
            ..FeedSettings::new(self.display_name())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Stored in the ledger; renaming a destination makes every entry new to it
    pub name: String,

    /// Registry tag: mastodon, x, outbox, stub
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pause between two posts to this destination
    #[serde(default)]
    pub delay_secs: Option<u64>,

    #[serde(default)]
    pub max_chars: Option<usize>,

    #[serde(default)]
    pub access_token_env: Option<String>,

    #[serde(default)]
    pub instance_url: Option<String>,

    #[serde(default)]
    pub visibility: Option<String>,

    #[serde(default)]
    pub user_token_env: Option<String>,

    #[serde(flatten)]
    pub options: PostOptionsConfig,
}

impl DestinationConfig {
    pub fn to_settings(&self) -> Result<DestinationSettings> {
        let options = self
            .options
            .to_options()
            .with_context(|| format!("Invalid options for destination {}", self.name))?;

        Ok(DestinationSettings {
            options,
            budget: self.options.budget(),
            delay: self
                .delay_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            ..DestinationSettings::new(&self.name)
        })
    }
}

// Default value functions
fn default_ledger_path() -> PathBuf {
    PathBuf::from("./feed-relay.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_outbox_path() -> PathBuf {
    PathBuf::from("./outbox.jsonl")
}

fn default_true() -> bool {
    true
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ledger_path: default_ledger_path(),
            log_level: default_log_level(),
            dry_run: false,
            outbox_path: default_outbox_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./feed-relay.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("FEED_RELAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn enabled_destinations(&self) -> impl Iterator<Item = &DestinationConfig> {
        self.destinations.iter().filter(|d| d.enabled)
    }

    /// Check names and option strings before anything is read or posted
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for destination in &self.destinations {
            if destination.name.trim().is_empty() {
                bail!("Destination of type {} has an empty name", destination.kind);
            }
            if !names.insert(destination.name.as_str()) {
                bail!("Duplicate destination name: {}", destination.name);
            }
            destination.to_settings()?;
        }

        for feed in &self.feeds {
            if feed.url.trim().is_empty() {
                bail!("Feed {} has an empty url", feed.display_name());
            }
            feed.to_settings()?;
        }

        Ok(())
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# feed-relay configuration

[general]
ledger_path = "./feed-relay.sqlite"
log_level = "info"
dry_run = false
# Used by destinations of type "outbox"
outbox_path = "./outbox.jsonl"

# Options below may be set on a feed or a destination; the feed value wins.
#   tags                  comma-separated tags added to every post
#   tag_filter_opts       ignore_title, ignore_content, ignore_category, case-sensitive
#   max_tags              cap on tags per post (default 100)
#   max_posts             0 = unlimited, n > 0 = at most n per run,
#                         n < 0 = record n oldest entries as done without posting
#   post_prefix           text placed before each post
#   post_suffix           text placed after each post, before the link
#   post_include_content  append the entry content after the title
#   post_include_media    attach the entry image URL
#   url_shortener         isgd, dagd, tinyurl or none

[[feeds]]
url = "https://example.org/feed.atom"
name = "example"
# max_posts = -10

[[destinations]]
name = "mastodon"
type = "mastodon"
instance_url = "https://mastodon.social"
access_token_env = "MASTODON_ACCESS_TOKEN"
visibility = "unlisted"  # public, unlisted, private
delay_secs = 0
max_posts = 5
tags = "news"

[[destinations]]
name = "x"
type = "x"
enabled = false
user_token_env = "X_USER_TOKEN"
url_shortener = "isgd"

[[destinations]]
name = "review"
type = "outbox"
enabled = false
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_parses() {
        let config: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();

        assert_eq!(config.feeds.len(), 1);
        assert_eq!(config.destinations.len(), 3);
        assert_eq!(config.enabled_destinations().count(), 1);
        assert_eq!(config.destinations[0].options.max_posts, Some(5));
        assert!(!config.general.dry_run);
        config.validate().unwrap();
    }

    #[test]
    fn test_destination_settings() {
        let config: AppConfig = toml::from_str(
            r#"
[[destinations]]
name = "masto"
type = "mastodon"
delay_secs = 30
max_posts = -2
tags = "a, b"
tag_filter_opts = "ignore_title,case-sensitive"
"#,
        )
        .unwrap();

        let settings = config.destinations[0].to_settings().unwrap();
        assert_eq!(settings.name, "masto");
        assert_eq!(settings.budget, PostBudget::Seed(2));
        assert_eq!(settings.delay, Some(Duration::from_secs(30)));
        assert_eq!(
            settings.options.tags,
            Some(vec!["a".to_string(), "b".to_string()])
        );
        let filter = settings.options.tag_filter.unwrap();
        assert!(filter.ignore_title && filter.case_sensitive);
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let config: AppConfig = toml::from_str(
            r#"
[[destinations]]
name = "same"
type = "stub"

[[destinations]]
name = "same"
type = "outbox"
"#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate destination name"));
    }

    #[test]
    fn test_validate_rejects_unknown_tag_filter() {
        let config: AppConfig = toml::from_str(
            r#"
[[feeds]]
url = "feed.xml"
tag_filter_opts = "ignore_everything"
"#,
        )
        .unwrap();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_feed_name_defaults_to_url() {
        let config: AppConfig = toml::from_str("[[feeds]]\nurl = \"feed.xml\"\n").unwrap();
        assert_eq!(config.feeds[0].to_settings().unwrap().name, "feed.xml");
    }
}
