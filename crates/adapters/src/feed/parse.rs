//! Atom and RSS parsing into normalized entries

use std::sync::LazyLock;

use feed_relay_domain::usecases::render::strip_html;
use feed_relay_domain::{Entry, FeedError, TagSources};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use serde::Deserialize;

static CONTENT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+#(\w+)$").expect("Valid regex"));
static LONE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#(\w+)$").expect("Valid regex"));
static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<img [^>]*src=["']([^"']+)["']"#).expect("Valid regex"));
static URL_ROOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(https?://[^/]+)/").expect("Valid regex"));

#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text", default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<TextNode>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    content: Option<TextNode>,
    summary: Option<TextNode>,
    updated: Option<String>,
    published: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<AtomCategory>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomCategory {
    #[serde(rename = "@term")]
    term: String,
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "content:encoded")]
    encoded: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    #[serde(rename = "category", default)]
    categories: Vec<TextNode>,
    #[serde(rename = "media:content", default)]
    media: Vec<MediaContent>,
}

#[derive(Debug, Deserialize)]
struct MediaContent {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@medium")]
    medium: Option<String>,
}

/// Parse an Atom or RSS document; entries come back oldest first
pub fn parse_feed(xml: &str, location: &str) -> Result<Vec<Entry>, FeedError> {
    let xml = scrub_html_entities_for_xml(xml);

    match root_element(&xml).as_deref() {
        Some("feed") => {
            let feed: AtomFeed = from_str(&xml).map_err(|e| FeedError::Parse(e.to_string()))?;
            Ok(feed.entries.into_iter().rev().map(atom_entry).collect())
        }
        Some("rss") => {
            let rss: Rss = from_str(&xml).map_err(|e| FeedError::Parse(e.to_string()))?;
            Ok(rss.channel.items.into_iter().rev().map(rss_entry).collect())
        }
        _ => Err(FeedError::UnknownFormat(location.to_string())),
    }
}

/// Lower-cased local name of the document's first element
fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase());
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn atom_entry(entry: AtomEntry) -> Entry {
    let title = entry
        .title
        .map(|t| strip_html(&t.text))
        .unwrap_or_default();

    let link = entry
        .links
        .iter()
        .find(|l| l.rel.as_deref().is_none_or(|rel| rel == "alternate"))
        .or_else(|| entry.links.first())
        .map(|l| l.href.clone())
        .unwrap_or_default();

    let raw_content = entry
        .content
        .map(|c| c.text)
        .filter(|c| !c.trim().is_empty())
        .or_else(|| entry.summary.map(|s| s.text))
        .unwrap_or_default();

    let media_url = find_image_url(None, &raw_content, &link);
    let (content, content_tags) = extract_content_tags(&raw_content);

    let category = entry
        .categories
        .iter()
        .map(|c| c.term.replace(' ', "_").trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();

    Entry {
        tag_sources: TagSources {
            title: extract_title_tags(&title),
            content: content_tags,
            category,
        },
        title,
        link,
        content,
        published_date: entry.updated.or(entry.published).map(|d| d.trim().to_string()),
        media_url,
    }
}

fn rss_entry(item: RssItem) -> Entry {
    let title = item.title.map(|t| t.trim().to_string()).unwrap_or_default();
    let link = item.link.map(|l| l.trim().to_string()).unwrap_or_default();
    let raw_content = item
        .encoded
        .filter(|c| !c.trim().is_empty())
        .or(item.description)
        .unwrap_or_default();

    let media = item
        .media
        .iter()
        .find(|m| m.medium.as_deref() == Some("image"))
        .and_then(|m| m.url.as_deref());
    let media_url = find_image_url(media, &raw_content, &link);
    let (content, content_tags) = extract_content_tags(&raw_content);

    let category = item
        .categories
        .iter()
        .map(|c| c.text.replace(' ', "_").trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    Entry {
        tag_sources: TagSources {
            title: extract_title_tags(&title),
            content: content_tags,
            category,
        },
        title,
        link,
        content,
        published_date: item.pub_date.map(|d| d.trim().to_string()),
        media_url,
    }
}

/// Lower-cased `#word` tokens of the title, in order
pub fn extract_title_tags(title: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for word in title.split_whitespace() {
        if let Some(tag) = word.strip_prefix('#').filter(|t| !t.is_empty()) {
            let tag = tag.to_lowercase();
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Strip trailing `#word` tokens from content, returning what remains and the
/// lower-cased tags in their original order. Content that is one lone tag
/// becomes empty and yields that tag.
pub fn extract_content_tags(content: &str) -> (String, Vec<String>) {
    let mut remaining = content.trim_end().to_string();
    let mut tags: Vec<String> = Vec::new();

    while let Some(captures) = CONTENT_TAG.captures(&remaining) {
        let tag = captures[1].to_lowercase();
        let start = captures.get(0).map_or(remaining.len(), |m| m.start());
        if !tags.contains(&tag) {
            tags.insert(0, tag);
        }
        remaining.truncate(start);
    }

    if let Some(captures) = LONE_TAG.captures(remaining.trim()) {
        let tag = captures[1].to_lowercase();
        if !tags.contains(&tag) {
            tags.insert(0, tag);
        }
        remaining.clear();
    }

    (remaining, tags)
}

/// Explicit media URL, else the first `<img src>` in the content, made
/// absolute against the entry link's scheme and host
fn find_image_url(media: Option<&str>, content: &str, link: &str) -> Option<String> {
    let found = media
        .map(str::to_string)
        .or_else(|| IMG_SRC.captures(content).map(|c| c[1].to_string()))?;

    if URL_ROOT.is_match(&found) {
        return Some(found);
    }
    match URL_ROOT.captures(link) {
        Some(root) if found.starts_with('/') => Some(format!("{}{}", &root[1], found)),
        Some(root) => Some(format!("{}/{}", &root[1], found)),
        None => Some(found),
    }
}

/// Replace HTML-only entities that XML parsers reject
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
