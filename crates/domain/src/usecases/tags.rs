//! Tag resolution - merges configured and entry tags into one bounded list

use std::collections::HashSet;

use crate::model::Entry;
use crate::policy::{EffectiveOptions, PostOptions};

/// Resolve the tag list for an entry sent to a destination, with feed options
/// taking precedence over destination options.
pub fn resolve_tags(entry: &Entry, destination: &PostOptions, feed: &PostOptions) -> Vec<String> {
    select_tags(entry, &EffectiveOptions::resolve(feed, destination))
}

/// Build the ordered, duplicate-free, size-limited tag list.
///
/// Priority: configured tags, then title, content and category tags unless
/// the corresponding `ignore_*` filter is set. Duplicates are dropped by exact
/// match in case-sensitive mode, otherwise by lower-cased form keeping the
/// first-seen casing. The scan stops as soon as `max_tags` is reached.
pub fn select_tags(entry: &Entry, options: &EffectiveOptions) -> Vec<String> {
    let filter = options.tag_filter;
    let sources = &entry.tag_sources;

    let candidates = options
        .tags
        .iter()
        .chain(sources.title.iter().filter(|_| !filter.ignore_title))
        .chain(sources.content.iter().filter(|_| !filter.ignore_content))
        .chain(sources.category.iter().filter(|_| !filter.ignore_category));

    let mut selected = Vec::new();
    let mut seen = HashSet::new();

    for tag in candidates {
        if selected.len() >= options.max_tags {
            break;
        }
        let key = if filter.case_sensitive {
            tag.clone()
        } else {
            tag.to_lowercase()
        };
        if seen.insert(key) {
            selected.push(tag.clone());
        }
    }

    selected
}
