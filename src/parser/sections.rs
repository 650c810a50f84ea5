use std::sync::LazyLock;

use regex::Regex;

static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());

/// Texts shorter than this (after trimming) are not worth splitting.
const MIN_SPLIT_CHARS: usize = 50;

/// Canonical Wikivoyage section, plus the synthetic intro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    Intro,
    Understand,
    Orientation,
    History,
    Climate,
    GetIn,
    FeesAndPermits,
    GetAround,
    See,
    Do,
    Buy,
    Eat,
    Drink,
    Sleep,
    Learn,
    Work,
    Connect,
    Cope,
    StaySafe,
    StayHealthy,
    Respect,
    GoNext,
}

impl Section {
    /// Headings recognized in article text, in guide order.
    pub const HEADINGS: [Section; 21] = [
        Section::Understand,
        Section::Orientation,
        Section::History,
        Section::Climate,
        Section::GetIn,
        Section::FeesAndPermits,
        Section::GetAround,
        Section::See,
        Section::Do,
        Section::Buy,
        Section::Eat,
        Section::Drink,
        Section::Sleep,
        Section::Learn,
        Section::Work,
        Section::Connect,
        Section::Cope,
        Section::StaySafe,
        Section::StayHealthy,
        Section::Respect,
        Section::GoNext,
    ];

    /// Every section: intro first, then guide order.
    pub const CANONICAL: [Section; 22] = [
        Section::Intro,
        Section::Understand,
        Section::Orientation,
        Section::History,
        Section::Climate,
        Section::GetIn,
        Section::FeesAndPermits,
        Section::GetAround,
        Section::See,
        Section::Do,
        Section::Buy,
        Section::Eat,
        Section::Drink,
        Section::Sleep,
        Section::Learn,
        Section::Work,
        Section::Connect,
        Section::Cope,
        Section::StaySafe,
        Section::StayHealthy,
        Section::Respect,
        Section::GoNext,
    ];

    /// Sections that make it into an indexing document, in rendering order.
    pub const INDEXED: [Section; 9] = [
        Section::Intro,
        Section::Understand,
        Section::GetIn,
        Section::GetAround,
        Section::See,
        Section::Eat,
        Section::Drink,
        Section::StaySafe,
        Section::GoNext,
    ];

    /// Heading as it is written in the guide.
    pub fn heading(self) -> &'static str {
        match self {
            Section::Intro => "Intro",
            Section::Understand => "Understand",
            Section::Orientation => "Orientation",
            Section::History => "History",
            Section::Climate => "Climate",
            Section::GetIn => "Get in",
            Section::FeesAndPermits => "Fees and permits",
            Section::GetAround => "Get around",
            Section::See => "See",
            Section::Do => "Do",
            Section::Buy => "Buy",
            Section::Eat => "Eat",
            Section::Drink => "Drink",
            Section::Sleep => "Sleep",
            Section::Learn => "Learn",
            Section::Work => "Work",
            Section::Connect => "Connect",
            Section::Cope => "Cope",
            Section::StaySafe => "Stay safe",
            Section::StayHealthy => "Stay healthy",
            Section::Respect => "Respect",
            Section::GoNext => "Go next",
        }
    }

    /// Field name in the output record (`get_in`, `stay_safe`, ...).
    pub fn key(self) -> &'static str {
        match self {
            Section::Intro => "intro",
            Section::Understand => "understand",
            Section::Orientation => "orientation",
            Section::History => "history",
            Section::Climate => "climate",
            Section::GetIn => "get_in",
            Section::FeesAndPermits => "fees_and_permits",
            Section::GetAround => "get_around",
            Section::See => "see",
            Section::Do => "do",
            Section::Buy => "buy",
            Section::Eat => "eat",
            Section::Drink => "drink",
            Section::Sleep => "sleep",
            Section::Learn => "learn",
            Section::Work => "work",
            Section::Connect => "connect",
            Section::Cope => "cope",
            Section::StaySafe => "stay_safe",
            Section::StayHealthy => "stay_healthy",
            Section::Respect => "respect",
            Section::GoNext => "go_next",
        }
    }

    /// Upper-cased label used in rendered documents (`GET IN`).
    pub fn label(self) -> String {
        self.key().replace('_', " ").to_uppercase()
    }

    pub fn from_key(key: &str) -> Option<Section> {
        Section::CANONICAL.into_iter().find(|s| s.key() == key)
    }

    /// Match a bare heading line, ignoring case. `Intro` is never a heading.
    pub fn from_heading(line: &str) -> Option<Section> {
        Section::HEADINGS
            .into_iter()
            .find(|s| s.heading().eq_ignore_ascii_case(line))
    }
}

/// Ordered section → content map. Re-inserting a section replaces its
/// content but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionMap {
    entries: Vec<(Section, String)>,
}

impl SectionMap {
    pub fn insert(&mut self, section: Section, content: String) {
        match self.entries.iter_mut().find(|(s, _)| *s == section) {
            Some(entry) => entry.1 = content,
            None => self.entries.push((section, content)),
        }
    }

    pub fn get(&self, section: Section) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, c)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Section, &str)> {
        self.entries.iter().map(|(s, c)| (*s, c.as_str()))
    }

    pub fn sections(&self) -> impl Iterator<Item = Section> + '_ {
        self.entries.iter().map(|(s, _)| *s)
    }
}

/// Split cleaned article text into intro + canonical sections.
///
/// A new chunk starts at every line that is exactly a known heading
/// (optionally followed by one period and trailing whitespace). Chunks that
/// do not open with a heading are intro material.
pub fn split_sections(text: &str) -> SectionMap {
    if text.trim().chars().count() < MIN_SPLIT_CHARS {
        return SectionMap::default();
    }

    let mut intro_parts: Vec<&str> = Vec::new();
    let mut headed = SectionMap::default();

    for chunk in chunk_at_headings(text) {
        let chunk = chunk.trim();
        if chunk.is_empty() {
            continue;
        }

        let (first_line, rest) = chunk.split_once('\n').unwrap_or((chunk, ""));
        match Section::from_heading(first_line.trim().trim_end_matches('.')) {
            Some(section) => {
                let content = clean_section_content(rest.trim());
                if !content.is_empty() {
                    headed.insert(section, content);
                }
            }
            None => intro_parts.push(chunk),
        }
    }

    let mut sections = SectionMap::default();
    if !intro_parts.is_empty() {
        let intro = clean_section_content(intro_parts.join("\n\n").trim());
        if !intro.is_empty() {
            sections.insert(Section::Intro, intro);
        }
    }
    for (section, content) in headed.entries {
        sections.insert(section, content);
    }
    sections
}

/// Remove stray heading lines left inside a chunk and re-collapse blank runs.
pub fn clean_section_content(content: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let kept: Vec<&str> = content
        .split('\n')
        .filter(|line| Section::from_heading(line.trim().trim_end_matches('.')).is_none())
        .collect();

    let joined = kept.join("\n");
    BLANK_RUN_RE.replace_all(joined.trim(), "\n\n").into_owned()
}

fn is_heading_line(line: &str) -> bool {
    let line = line.trim_end();
    let line = line.strip_suffix('.').unwrap_or(line);
    Section::from_heading(line).is_some()
}

/// Cut `text` right before every heading line.
fn chunk_at_headings(text: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if offset > start && is_heading_line(line) {
            chunks.push(&text[start..offset]);
            start = offset;
        }
        offset += line.len();
    }
    chunks.push(&text[start..]);
    chunks
}

// ── Tests ──
