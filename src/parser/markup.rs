//! Wiki markup → plain prose.
//!
//! Two strategies: the structured one walks a `parse_wiki_text` tree (only
//! compiled with the `wikitext` feature), the regex one works on raw text and
//! is also the fallback when the parser blows up.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

const MAX_TEMPLATE_PASSES: usize = 10;

macro_rules! re {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($pattern).unwrap());
    };
}

// Templates, tables, links
re!(TABLE_RE, r"(?s)\{\|.*?\|\}");
re!(INNER_TEMPLATE_RE, r"\{\{[^{}]*?\}\}");
re!(BRACE_TOKEN_RE, r"\{\{|\}\}");
re!(FILE_RE, r"(?is)\[\[File:.*?\]\]");
re!(IMAGE_RE, r"(?is)\[\[Image:.*?\]\]");
re!(CATEGORY_RE, r"(?i)\[\[Category:.*?\]\]");
re!(WIKILINK_RE, r"\[\[(?:[^|\]]*\|)?([^\]]+)\]\]");
re!(BRACKET_TOKEN_RE, r"\[\[|\]\]");

// Geo data
re!(COORD_RE, r"(?i)\{coord\|.*?\}");
re!(COORDINATES_TAG_RE, r"(?is)<coordinates>.*?</coordinates>");
re!(DMS_PAIR_RE, r"\d+°\s*\d*'?\s*[NSEW]\s+\d+°\s*\d*'?\s*[NSEW]");
re!(DECIMAL_PAIR_RE, r"\d+\.\d+°?\s*[NSEW],?\s*\d+\.\d+°?\s*[NSEW]");

// HTML
re!(COMMENT_RE, r"(?s)<!--.*?-->");
re!(REF_SELF_CLOSING_RE, r"(?i)<ref[^>]*/>");
re!(REF_BLOCK_RE, r"(?is)<ref[^>]*>.*?</ref>");
re!(GALLERY_RE, r"(?is)<gallery[^>]*>.*?</gallery>");
re!(HTML_TAG_RE, r"<[^>]+>");

// Inline wiki formatting
re!(QUOTE_RUN_RE, r"'''|''");
re!(LIST_MARKER_RE, r"(?m)^[#*:;]+[ \t]*");
re!(HEADING_RE, r"(?m)^=+[ \t]*(.*?)[ \t]*=+[ \t]*$");

// External links
re!(EXTERNAL_LINK_RE, r"\[https?://[^\s\]]+\s+([^\]]+)\]");
re!(BARE_URL_RE, r"https?://\S+");

// Whitespace
re!(BLANK_RUN_RE, r"\n\s*\n\s*\n+");
re!(HSPACE_RUN_RE, r"[ \t]+");
re!(LINE_EDGE_SPACE_RE, r"(?m)^[ \t]+|[ \t]+$");

/// How raw markup is turned into prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanStrategy {
    /// Parse into a markup tree first, then tidy up with regexes.
    Structured,
    /// Regexes only.
    RegexOnly,
}

impl CleanStrategy {
    /// Best strategy this build supports.
    pub fn detect() -> Self {
        if cfg!(feature = "wikitext") {
            CleanStrategy::Structured
        } else {
            CleanStrategy::RegexOnly
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CleanStrategy::Structured => "parse_wiki_text",
            CleanStrategy::RegexOnly => "regex-only",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    strategy: CleanStrategy,
}

impl Normalizer {
    pub fn new(strategy: CleanStrategy) -> Self {
        let strategy = if strategy == CleanStrategy::Structured && !cfg!(feature = "wikitext") {
            warn!("built without the `wikitext` feature, falling back to regex-only cleaning");
            CleanStrategy::RegexOnly
        } else {
            strategy
        };
        Normalizer { strategy }
    }

    pub fn strategy(&self) -> CleanStrategy {
        self.strategy
    }

    /// Strip markup from `raw`. Never fails; may return an empty string.
    pub fn clean(&self, raw: &str) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }
        match self.strategy {
            CleanStrategy::Structured => clean_structured(raw),
            CleanStrategy::RegexOnly => clean_with_regex(raw, false),
        }
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(CleanStrategy::detect())
    }
}

#[cfg(feature = "wikitext")]
fn clean_structured(raw: &str) -> String {
    use std::panic::{self, AssertUnwindSafe};

    match panic::catch_unwind(AssertUnwindSafe(|| super::wikitext::flatten(raw))) {
        Ok(flat) => clean_with_regex(&flat, true),
        Err(_) => {
            warn!("wiki parser panicked, using regex-only cleaning");
            clean_with_regex(raw, false)
        }
    }
}

#[cfg(not(feature = "wikitext"))]
fn clean_structured(raw: &str) -> String {
    clean_with_regex(raw, false)
}

/// Regex cleanup. Order matters: templates and links go before the generic
/// bracket/brace cleanup. `skip_templates_links` is set when a parser already
/// dealt with them; stray `{{`/`[[` tokens are dropped either way.
pub fn clean_with_regex(text: &str, skip_templates_links: bool) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let mut text = text.to_string();

    if !skip_templates_links {
        text = strip(&TABLE_RE, &text);
        text = strip_templates(&text);

        text = strip(&FILE_RE, &text);
        text = strip(&IMAGE_RE, &text);
        text = strip(&CATEGORY_RE, &text);

        text = WIKILINK_RE.replace_all(&text, "$1").into_owned();
    }
    text = strip(&BRACE_TOKEN_RE, &text);
    text = strip(&BRACKET_TOKEN_RE, &text);

    text = strip(&COORD_RE, &text);
    text = strip(&COORDINATES_TAG_RE, &text);
    text = strip(&DMS_PAIR_RE, &text);
    text = strip(&DECIMAL_PAIR_RE, &text);

    text = strip(&COMMENT_RE, &text);
    // Self-closing refs first, or a block match would run on to the next `</ref>`.
    text = strip(&REF_SELF_CLOSING_RE, &text);
    text = strip(&REF_BLOCK_RE, &text);
    text = strip(&GALLERY_RE, &text);
    text = strip(&HTML_TAG_RE, &text);

    text = strip(&QUOTE_RUN_RE, &text);
    text = strip(&LIST_MARKER_RE, &text);
    text = HEADING_RE.replace_all(&text, "$1").into_owned();

    text = EXTERNAL_LINK_RE.replace_all(&text, "$1").into_owned();
    text = strip(&BARE_URL_RE, &text);

    normalize_whitespace(&text)
}

/// Innermost-first template removal, bounded so nested junk cannot loop.
fn strip_templates(text: &str) -> String {
    let mut text = text.to_string();
    for _ in 0..MAX_TEMPLATE_PASSES {
        let next = strip(&INNER_TEMPLATE_RE, &text);
        if next == text {
            break;
        }
        text = next;
    }
    text
}

fn normalize_whitespace(text: &str) -> String {
    let text = BLANK_RUN_RE.replace_all(text, "\n\n");
    let text = HSPACE_RUN_RE.replace_all(&text, " ");
    let text = LINE_EDGE_SPACE_RE.replace_all(&text, "");
    text.trim().to_string()
}

fn strip(re: &Regex, text: &str) -> String {
    re.replace_all(text, "").into_owned()
}
