//! Text composition - inlines known tags as hashtags, appends the rest, and
//! trims the result to a platform budget

use regex::Regex;
use thiserror::Error;

/// Appended when prose is cut
pub const DEFAULT_ELLIPSIS: &str = "...";
/// Placed between the prose and the appended hashtags
pub const DEFAULT_SEPARATOR: &str = " |";

/// Start of text, quote, slash, opening bracket or whitespace
const BEFORE_TAG: &str = r#"(?:\A|['"/(\[{\s])"#;
/// End of text, quote, slash, closing bracket, punctuation or whitespace
const AFTER_TAG: &str = r#"(?:\z|['"/\s)\]},.!?:])"#;

/// The composed text does not fit the requested budget.
///
/// Budgets are computed by the caller, so this is a caller bug and is not
/// recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("composed text is {len} chars, over the {max_length} char budget: {text:?}")]
pub struct ContractViolation {
    pub text: String,
    pub len: usize,
    pub max_length: usize,
}

/// Composer settings
#[derive(Debug, Clone)]
pub struct TextComposer {
    ellipsis: String,
    separator: String,
}

impl Default for TextComposer {
    fn default() -> Self {
        Self::new(DEFAULT_ELLIPSIS, DEFAULT_SEPARATOR)
    }
}

/// Compose with the default ellipsis and separator
pub fn compose(
    text: &str,
    tags: &[String],
    max_length: Option<usize>,
) -> Result<String, ContractViolation> {
    TextComposer::default().compose(text, tags, max_length)
}

impl TextComposer {
    pub fn new(ellipsis: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            ellipsis: ellipsis.into(),
            separator: separator.into(),
        }
    }

    /// Produce `text` with tags rendered as hashtags, at most `max_length`
    /// chars long when a limit is given.
    ///
    /// Tags found as whole words in `text` are marked in place; the others
    /// are appended after the separator in their original order. When the
    /// result is too long it is cut at a space; an ellipsis is added only if
    /// the cut reaches into the prose. A separator with nothing after it is
    /// removed.
    pub fn compose(
        &self,
        text: &str,
        tags: &[String],
        max_length: Option<usize>,
    ) -> Result<String, ContractViolation> {
        let tags: Vec<String> = tags
            .iter()
            .map(|t| sanitize_tag(t))
            .filter(|t| !t.is_empty())
            .collect();

        let mut inline = Vec::new();
        let mut extra = Vec::new();
        for tag in &tags {
            if tag_pattern(r"#?", tag).is_match(text) {
                inline.push(tag.as_str());
            } else {
                extra.push(tag.as_str());
            }
        }

        let mut composed = text.to_string();
        for tag in &inline {
            mark_first_occurrence(&mut composed, tag);
        }

        // The placeholder has no spaces so trimming never cuts inside it
        let placeholder = self.separator.replace(' ', "_");
        let mut placeholder_at = None;
        let mut prose_chars = composed.chars().count();

        if !extra.is_empty() {
            placeholder_at = Some(composed.len());
            composed.push_str(&placeholder);
            prose_chars = composed.chars().count();

            for tag in &extra {
                if !tag_pattern("#", tag).is_match(&composed) {
                    composed.push_str(" #");
                    composed.push_str(tag);
                }
            }
        }

        if let Some(max_length) = max_length {
            let placeholder_chars = placeholder_at.map(|at| {
                let start = composed[..at].chars().count();
                (start, start + placeholder.chars().count())
            });
            composed = self.trim(&composed, max_length, prose_chars, placeholder_chars);
        }

        if let Some(at) = placeholder_at {
            let end = at + placeholder.len();
            if composed.get(at..end) == Some(placeholder.as_str()) {
                composed.replace_range(at..end, &self.separator);
                if composed[end..].trim().is_empty() {
                    composed.truncate(at);
                }
            }
        }

        if let Some(max_length) = max_length {
            let len = composed.chars().count();
            if len > max_length {
                return Err(ContractViolation {
                    text: composed,
                    len,
                    max_length,
                });
            }
        }

        Ok(composed)
    }

    /// Cut `text` to `max_length` chars at the last space that leaves room
    /// for the ellipsis. The ellipsis is added when the cut falls before
    /// `prose_chars`, i.e. inside the prose rather than the optional tag tail.
    fn trim(
        &self,
        text: &str,
        max_length: usize,
        prose_chars: usize,
        placeholder: Option<(usize, usize)>,
    ) -> String {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        if chars.len() <= max_length {
            return text.to_string();
        }

        let limit = max_length.saturating_sub(self.ellipsis.chars().count());
        let mut cut = chars[..=limit]
            .iter()
            .rposition(|(_, c)| *c == ' ')
            .unwrap_or(limit);

        if let Some((start, end)) = placeholder {
            if cut > start && cut < end {
                cut = start;
            }
        }

        let byte_cut = chars.get(cut).map_or(text.len(), |(i, _)| *i);
        let mut trimmed = text[..byte_cut].to_string();
        if cut < prose_chars {
            trimmed.push_str(&self.ellipsis);
        }
        trimmed
    }
}

/// Hashtags cannot carry `-` or `.`
fn sanitize_tag(tag: &str) -> String {
    tag.chars().filter(|c| !matches!(c, '-' | '.')).collect()
}

/// Case-insensitive whole-word pattern for `tag`, with `hash` in front.
/// Group 1 captures the hash.
fn tag_pattern(hash: &str, tag: &str) -> Regex {
    let pattern = format!(
        "(?i){}({}){}{}",
        BEFORE_TAG,
        hash,
        regex::escape(tag),
        AFTER_TAG
    );
    Regex::new(&pattern).expect("escaped tag pattern is valid")
}

/// Prefix the first whole-word occurrence of `tag` with `#`. An occurrence
/// that already carries `#` counts as first, so composing twice is stable.
fn mark_first_occurrence(text: &mut String, tag: &str) {
    let pattern = tag_pattern("#?", tag);
    let Some(caps) = pattern.captures(text.as_str()) else {
        return;
    };
    let Some(hash) = caps.get(1) else {
        return;
    };
    if hash.is_empty() {
        let at = hash.start();
        text.insert(at, '#');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    const PHRASES: &[&str] = &[
        "Atom-Powered Robots Run Amok across the whole city tonight",
        "Rust ownership explained with diagrams and plenty of examples",
        "Tags in red/white/blue",
        "One #Tag, Unrelated Keyword",
        "A short one",
        "Supercalifragilisticexpialidocious_is_a_very_long_word_without_spaces",
        "\"Quoted (bracketed) [words] {braces}\" and more: final!",
    ];

    #[test]
    fn test_appends_unmatched_tags_after_separator() {
        let out = compose("One #Tag, Unrelated Keyword", &tags(&["appended"]), Some(500)).unwrap();
        assert_eq!(out, "One #Tag, Unrelated Keyword | #appended");
    }

    #[test]
    fn test_inlines_tags_between_punctuation() {
        let out = compose(
            "Tags in red/white/blue",
            &tags(&["red", "white", "blue"]),
            Some(500),
        )
        .unwrap();
        assert_eq!(out, "Tags in #red/#white/#blue");
    }

    #[test]
    fn test_inline_matching_is_case_insensitive_and_keeps_text_casing() {
        let out = compose("Learning RUST today", &tags(&["rust"]), None).unwrap();
        assert_eq!(out, "Learning #RUST today");
    }

    #[test]
    fn test_existing_hashtag_is_not_doubled() {
        let out = compose("One #Tag, Unrelated Keyword", &tags(&["tag"]), None).unwrap();
        assert_eq!(out, "One #Tag, Unrelated Keyword");
    }

    #[test]
    fn test_recomposition_is_stable() {
        let list = tags(&["robots", "city", "extra"]);
        let once = compose(PHRASES[0], &list, Some(200)).unwrap();
        let twice = compose(&once, &list, Some(200)).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_partial_words_are_not_inlined() {
        let out = compose("Rustacean news", &tags(&["rust"]), None).unwrap();
        assert_eq!(out, "Rustacean news | #rust");
    }

    #[test]
    fn test_extra_tag_order_is_preserved() {
        let out = compose("Plain text", &tags(&["zeta", "alpha", "mid"]), None).unwrap();
        assert_eq!(out, "Plain text | #zeta #alpha #mid");
    }

    #[test]
    fn test_only_first_occurrence_is_marked() {
        let out = compose("rust and more rust", &tags(&["rust"]), None).unwrap();
        assert_eq!(out, "#rust and more rust");
    }

    #[test]
    fn test_tags_are_sanitized() {
        let out = compose("Plain text", &tags(&["open-source", "v1.2"]), None).unwrap();
        assert_eq!(out, "Plain text | #opensource #v12");
    }

    #[test]
    fn test_trimming_drops_tags_before_prose() {
        // 10 chars of prose, tail " | #alpha #beta"
        let out = compose("Plain text", &tags(&["alpha", "beta"]), Some(22)).unwrap();
        assert_eq!(out, "Plain text | #alpha");
    }

    #[test]
    fn test_separator_removed_when_all_tags_trimmed() {
        let out = compose("Plain text", &tags(&["alphabetical"]), Some(15)).unwrap();
        assert_eq!(out, "Plain text");
        assert!(!out.ends_with('|'));
    }

    #[test]
    fn test_prose_cut_gets_ellipsis() {
        let out = compose(
            "The quick brown fox jumps over the lazy dog",
            &tags(&["animals"]),
            Some(20),
        )
        .unwrap();
        assert_eq!(out, "The quick brown...");
    }

    #[test]
    fn test_no_limit_no_trim() {
        let long = "word ".repeat(200);
        let out = compose(&long, &[], None).unwrap();
        assert_eq!(out, long);
    }

    #[test]
    fn test_hard_cut_without_spaces() {
        let out = compose("abcdefghijklmnopqrstuvwxyz", &[], Some(10)).unwrap();
        assert_eq!(out, "abcdefg...");
    }

    #[test]
    fn test_hard_cut_never_splits_separator() {
        let out = compose("abcdefgh", &tags(&["x"]), Some(12)).unwrap();
        assert_eq!(out, "abcdefgh...");
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let out = compose("héllo wörld ünïcode", &tags(&["ça"]), Some(19)).unwrap();
        assert!(out.chars().count() <= 19);
    }

    #[test]
    fn test_budget_below_ellipsis_is_contract_violation() {
        let result = compose("hello world", &[], Some(2));
        let err = result.unwrap_err();
        assert_eq!(err.max_length, 2);
        assert_eq!(err.len, 3);
    }

    #[test]
    fn test_custom_separator_and_ellipsis() {
        let composer = TextComposer::new("…", " ·");
        let out = composer
            .compose("Plain text", &tags(&["alpha"]), None)
            .unwrap();
        assert_eq!(out, "Plain text · #alpha");

        let cut = composer
            .compose("The quick brown fox", &[], Some(12))
            .unwrap();
        assert_eq!(cut, "The quick…");
    }

    #[test]
    fn test_length_bound_and_no_dangling_separator() {
        let keyword_sets = [
            tags(&[]),
            tags(&["robots", "city", "qwerty", "zxcvb"]),
            tags(&["ownership", "diagrams", "lorem", "ipsum", "dolor"]),
            tags(&["red", "white", "blue", "green"]),
        ];

        for phrase in PHRASES {
            for keywords in &keyword_sets {
                for max_length in (30..260).step_by(10) {
                    let out = compose(phrase, keywords, Some(max_length)).unwrap();
                    assert!(
                        out.chars().count() <= max_length,
                        "{:?} is longer than {}",
                        out,
                        max_length
                    );
                    assert!(!out.ends_with('|'), "{:?} ends with separator", out);
                }
            }
        }

        let long = "lorem ipsum dolor ".repeat(30);
        for max_length in (30..260).step_by(10) {
            let out = compose(&long, &[], Some(max_length)).unwrap();
            assert!(out.chars().count() <= max_length);
        }
    }

    #[test]
    fn test_case_invariance() {
        let keywords = tags(&["robots", "Amok", "missing", "ownership"]);
        for phrase in PHRASES {
            let lower = compose(phrase, &keywords, Some(500)).unwrap();
            let upper = compose(&phrase.to_uppercase(), &keywords, Some(500)).unwrap();
            assert_eq!(lower.to_uppercase(), upper.to_uppercase());
        }
    }
}
