use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::parser::sections::{Section, SectionMap};

/// Page id as found in the dump; echoed back untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArticleId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleId::Number(n) => write!(f, "{n}"),
            ArticleId::Text(s) => f.write_str(s),
        }
    }
}

/// One line of the dump.
#[derive(Debug, Clone, Deserialize)]
pub struct RawArticle {
    pub id: ArticleId,
    pub title: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl RawArticle {
    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }
}

/// Output record: `{"id", "title", "<section>": "...", ...}` with the
/// sections flattened next to id and title.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "FlatRecord")]
pub struct NormalizedArticle {
    pub id: ArticleId,
    pub title: String,
    pub sections: SectionMap,
}

impl NormalizedArticle {
    /// Indexing text: the non-empty sections of [`Section::INDEXED`], in that
    /// order, each as `LABEL:\ncontent`, separated by a blank line. Other
    /// sections stay in the record but are not indexed.
    pub fn document_text(&self) -> String {
        Section::INDEXED
            .into_iter()
            .filter_map(|section| {
                self.sections
                    .get(section)
                    .filter(|content| !content.is_empty())
                    .map(|content| format!("{}:\n{}", section.label(), content))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Serialize for NormalizedArticle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.sections.len()))?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("title", &self.title)?;
        for (section, content) in self.sections.iter() {
            map.serialize_entry(section.key(), content)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
struct FlatRecord {
    id: ArticleId,
    title: String,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_json::Value>,
}

impl From<FlatRecord> for NormalizedArticle {
    fn from(record: FlatRecord) -> Self {
        let mut sections = SectionMap::default();
        for (key, value) in record.rest {
            let (Some(section), serde_json::Value::String(content)) = (Section::from_key(&key), value)
            else {
                continue;
            };
            sections.insert(section, content);
        }
        NormalizedArticle {
            id: record.id,
            title: record.title,
            sections,
        }
    }
}

/// What the indexing stage consumes for one article.
#[derive(Debug, Clone, Serialize)]
pub struct IndexDocument<'a> {
    pub id: &'a ArticleId,
    pub title: &'a str,
    pub text: String,
}

impl<'a> From<&'a NormalizedArticle> for IndexDocument<'a> {
    fn from(article: &'a NormalizedArticle) -> Self {
        IndexDocument {
            id: &article.id,
            title: &article.title,
            text: article.document_text(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> NormalizedArticle {
        let mut sections = SectionMap::default();
        sections.insert(Section::Intro, "A port town.".into());
        sections.insert(Section::See, "The fort.".into());
        sections.insert(Section::Understand, "Founded long ago.".into());
        NormalizedArticle {
            id: ArticleId::Text("42".into()),
            title: "Porto Novo".into(),
            sections,
        }
    }

    #[test]
    fn serializes_sections_flat_in_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"id":"42","title":"Porto Novo","intro":"A port town.","see":"The fort.","understand":"Founded long ago."}"#
        );
    }

    #[test]
    fn keeps_numeric_ids_and_unicode() {
        let mut article = sample();
        article.id = ArticleId::Number(7.into());
        article.title = "Zürich".into();
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.starts_with(r#"{"id":7,"title":"Zürich""#), "{json}");
    }

    #[test]
    fn reads_back_and_ignores_unknown_fields() {
        let line = r#"{"id":3,"title":"Oslo","see":"Opera house.","url":"x","eat":5}"#;
        let article: NormalizedArticle = serde_json::from_str(line).unwrap();
        assert_eq!(article.id, ArticleId::Number(3.into()));
        assert_eq!(article.sections.len(), 1);
        assert_eq!(article.sections.get(Section::See), Some("Opera house."));
    }

    #[test]
    fn document_text_uses_canonical_order() {
        assert_eq!(
            sample().document_text(),
            "INTRO:\nA port town.\n\nUNDERSTAND:\nFounded long ago.\n\nSEE:\nThe fort."
        );
    }

    #[test]
    fn document_text_skips_unindexed_sections() {
        let mut article = sample();
        article.sections.insert(Section::Sleep, "Harbour Inn.".into());
        article.sections.insert(Section::Do, "Hike the ridge.".into());
        article.sections.insert(Section::GoNext, "Lagos.".into());
        article.sections.insert(Section::Drink, "Palm wine.".into());
        assert_eq!(
            article.document_text(),
            "INTRO:\nA port town.\n\nUNDERSTAND:\nFounded long ago.\n\nSEE:\nThe fort.\n\nDRINK:\nPalm wine.\n\nGO NEXT:\nLagos."
        );
    }

    #[test]
    fn document_text_of_empty_article() {
        let mut article = sample();
        article.sections = SectionMap::default();
        assert_eq!(article.document_text(), "");
    }

    #[test]
    fn raw_article_text_defaults_to_empty() {
        let raw: RawArticle = serde_json::from_str(r#"{"id":"1","title":"X","text":null}"#).unwrap();
        assert_eq!(raw.text(), "");
        let raw: RawArticle = serde_json::from_str(r#"{"id":"1","title":"X"}"#).unwrap();
        assert_eq!(raw.text(), "");
        assert!(serde_json::from_str::<RawArticle>(r#"{"title":"X","text":"y"}"#).is_err());
    }
}
