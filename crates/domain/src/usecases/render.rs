//! Rendering use case - turns an entry into destination-specific post text

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{Entry, PreparedPost};
use crate::policy::EffectiveOptions;
use crate::ports::RenderProfile;
use crate::usecases::compose::{ContractViolation, TextComposer};

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("Valid regex"));
static ENDING_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+#\w+$").expect("Valid regex"));
static LONE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*#\w+$").expect("Valid regex"));

/// Nested escaping rarely goes deeper than this
const MAX_STRIP_PASSES: usize = 5;

/// Renderer for building the text sent to a destination
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    composer: TextComposer,
}

impl Renderer {
    pub fn new(composer: TextComposer) -> Self {
        Self { composer }
    }

    /// Render `entry` for a destination.
    ///
    /// Layout: `[prefix ]body-with-tags[ suffix] link`, where body is the
    /// title optionally followed by `": "` and the plain-text content. The
    /// composer gets whatever the profile leaves after the link and affixes.
    pub fn render(
        &self,
        entry: &Entry,
        tags: &[String],
        options: &EffectiveOptions,
        profile: &RenderProfile,
        link: &str,
    ) -> Result<PreparedPost, ContractViolation> {
        let content = if options.include_content {
            let mut stripped = strip_html(&entry.content);
            if !options.tag_filter.ignore_content {
                stripped = remove_ending_tags(&stripped);
            }
            Some(stripped).filter(|c| !c.is_empty())
        } else {
            None
        };

        let body = match &content {
            Some(content) => format!("{}: {}", entry.title, content),
            None => entry.title.clone(),
        };

        let budget = profile
            .max_chars
            .map(|max| max.saturating_sub(self.reserved_chars(options, profile, link)));
        let rich = self.composer.compose(&body, tags, budget)?;

        let mut text = String::new();
        if !options.post_prefix.is_empty() {
            text.push_str(&options.post_prefix);
            text.push(' ');
        }
        text.push_str(&rich);
        if !options.post_suffix.is_empty() {
            text.push(' ');
            text.push_str(&options.post_suffix);
        }
        if profile.include_link {
            text.push(' ');
            text.push_str(link);
        }

        Ok(PreparedPost {
            entry_id: entry.identifier(),
            text,
            title: entry.title.clone(),
            link: link.to_string(),
            tags: tags.to_vec(),
            content,
            media_url: entry.media_url.clone().filter(|_| options.include_media),
        })
    }

    /// Chars taken by the link and affixes, each with its joining space
    fn reserved_chars(&self, options: &EffectiveOptions, profile: &RenderProfile, link: &str) -> usize {
        let mut reserved = 0;
        if profile.include_link {
            reserved += profile.link_cost.unwrap_or_else(|| link.chars().count()) + 1;
        }
        if !options.post_prefix.is_empty() {
            reserved += options.post_prefix.chars().count() + 1;
        }
        if !options.post_suffix.is_empty() {
            reserved += options.post_suffix.chars().count() + 1;
        }
        reserved
    }
}

/// Reduce HTML to trimmed plain text, repeating while escaped markup remains
pub fn strip_html(html: &str) -> String {
    let mut current = html.trim().to_string();
    for _ in 0..MAX_STRIP_PASSES {
        let without_tags = HTML_TAG.replace_all(&current, "");
        let decoded = html_escape::decode_html_entities(&without_tags);
        let next = decoded.trim().to_string();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

/// Drop trailing `#word` tokens; content that is a single hashtag becomes empty
pub fn remove_ending_tags(content: &str) -> String {
    let mut trimmed = content.to_string();
    while ENDING_TAG.is_match(&trimmed) {
        trimmed = ENDING_TAG.replace(&trimmed, "").into_owned();
    }
    if LONE_TAG.is_match(&trimmed) {
        trimmed.clear();
    }
    trimmed
}
