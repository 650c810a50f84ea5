use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}$").unwrap());
static YEAR_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}").unwrap());
static JUNK_TITLE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)^\d+liner$",           // "1liner", "2liner"
        r"^[\d\s+\-]+$",             // "7 2", "7+2"
        r"^\d+\s*[+\-*/]\s*\d+$",    // "3 * 4"
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const MIN_TEXT_CHARS: usize = 100;

const EVENT_KEYWORDS: &[&str] = &[
    "world cup",
    "olympics",
    "fifa",
    "championship",
    "tournament",
    "conference",
    "summit",
];

/// Why a page was not kept as a travel article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    TooShort,
    YearTitle,
    JunkTitle,
    EventYear,
    Disambiguation,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::TooShort => "too short",
            Rejection::YearTitle => "year page",
            Rejection::JunkTitle => "junk title",
            Rejection::EventYear => "event page",
            Rejection::Disambiguation => "disambiguation page",
        };
        f.write_str(reason)
    }
}

/// First rule that rejects the page, or `None` when it is a valid travel
/// article.
pub fn classify(title: &str, cleaned_text: &str) -> Option<Rejection> {
    if cleaned_text.trim().chars().count() < MIN_TEXT_CHARS {
        return Some(Rejection::TooShort);
    }

    if YEAR_RE.is_match(title) {
        return Some(Rejection::YearTitle);
    }

    if JUNK_TITLE_RES.iter().any(|re| re.is_match(title)) {
        return Some(Rejection::JunkTitle);
    }

    let lower = title.to_lowercase();
    // Only dated events are dropped; "Business Summit" stays.
    if EVENT_KEYWORDS.iter().any(|kw| lower.contains(kw)) && YEAR_PREFIX_RE.is_match(title) {
        return Some(Rejection::EventYear);
    }

    if lower.contains("(disambiguation)") {
        return Some(Rejection::Disambiguation);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn length_boundary() {
        assert_eq!(classify("Paris", &body(99)), Some(Rejection::TooShort));
        assert_eq!(classify("Paris", &body(100)), None);
        let padded = format!("   {}   \n", body(99));
        assert_eq!(classify("Paris", &padded), Some(Rejection::TooShort));
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert_eq!(classify("Zürich", &"ü".repeat(100)), None);
        assert_eq!(classify("Zürich", &"ü".repeat(60)), Some(Rejection::TooShort));
    }

    #[test]
    fn year_titles() {
        let text = body(200);
        assert_eq!(classify("1990", &text), Some(Rejection::YearTitle));
        assert_eq!(classify("1990 Summit", &text), Some(Rejection::EventYear));
        assert_eq!(classify("2010 FIFA World Cup", &text), Some(Rejection::EventYear));
        assert_eq!(classify("Business Summit", &text), None);
        assert_eq!(classify("1990s", &text), None);
    }

    #[test]
    fn junk_titles() {
        let text = body(200);
        for title in ["7 2", "7+2", "3 - 4", "3 * 4", "12/4", "2liner", "10LINER"] {
            assert_eq!(classify(title, &text), Some(Rejection::JunkTitle), "{title}");
        }
        assert_eq!(classify("Route 66", &text), None);
    }

    #[test]
    fn disambiguation() {
        let text = body(200);
        assert_eq!(
            classify("Springfield (Disambiguation)", &text),
            Some(Rejection::Disambiguation)
        );
        assert_eq!(classify("Springfield (Illinois)", &text), None);
    }

    #[test]
    fn short_text_wins_over_title_rules() {
        assert_eq!(classify("1990", "short"), Some(Rejection::TooShort));
    }
}
