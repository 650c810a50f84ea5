pub mod classify;
pub mod markup;
pub mod sections;
#[cfg(feature = "wikitext")]
pub mod wikitext;

use crate::record::{NormalizedArticle, RawArticle};
use classify::Rejection;
use markup::Normalizer;

/// Result of running one article through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleOutcome {
    Kept(NormalizedArticle),
    Rejected(Rejection),
}

/// Three-stage pipeline: markup → cleaned text → classification → sections.
pub fn process_article(normalizer: &Normalizer, article: RawArticle) -> ArticleOutcome {
    let cleaned = normalizer.clean(article.text());

    if let Some(rejection) = classify::classify(&article.title, &cleaned) {
        return ArticleOutcome::Rejected(rejection);
    }

    let sections = sections::split_sections(&cleaned);
    ArticleOutcome::Kept(NormalizedArticle {
        id: article.id,
        title: article.title,
        sections,
    })
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::markup::CleanStrategy;
    use crate::parser::sections::Section;
    use crate::record::ArticleId;

    fn raw(title: &str, text: &str) -> RawArticle {
        RawArticle {
            id: ArticleId::Text("1".into()),
            title: title.into(),
            text: Some(text.into()),
        }
    }

    fn fixture_text() -> String {
        std::fs::read_to_string("tests/fixtures/sampletown.wiki").unwrap()
    }

    #[test]
    fn sampletown_regex_only() {
        let normalizer = Normalizer::new(CleanStrategy::RegexOnly);
        let ArticleOutcome::Kept(article) = process_article(&normalizer, raw("Sampletown", &fixture_text()))
        else {
            panic!("Sampletown should be kept");
        };

        let keys: Vec<_> = article.sections.sections().map(Section::key).collect();
        assert_eq!(
            keys,
            vec!["intro", "understand", "get_in", "see", "eat", "sleep", "go_next"]
        );

        let intro = article.sections.get(Section::Intro).unwrap();
        assert!(intro.starts_with("Sampletown is a small harbour town"), "{intro}");
        assert!(!intro.contains("{{"), "{intro}");

        let see = article.sections.get(Section::See).unwrap();
        assert!(see.contains("The old fort"), "{see}");
        assert!(!see.contains("File:"), "{see}");
        assert!(!see.contains("Guidebook"), "{see}");

        let get_in = article.sections.get(Section::GetIn).unwrap();
        assert!(get_in.contains("Northport"), "{get_in}");
        assert!(!get_in.contains("[["), "{get_in}");

        // "Do" has only a template beneath it.
        assert_eq!(article.sections.get(Section::Do), None);
    }

    #[cfg(feature = "wikitext")]
    #[test]
    fn sampletown_structured() {
        let normalizer = Normalizer::new(CleanStrategy::Structured);
        let ArticleOutcome::Kept(article) = process_article(&normalizer, raw("Sampletown", &fixture_text()))
        else {
            panic!("Sampletown should be kept");
        };
        assert!(article.sections.get(Section::See).is_some());
        assert!(article.sections.get(Section::Eat).is_some());
        for (_, content) in article.sections.iter() {
            assert!(!content.contains("{{") && !content.contains("[["), "{content}");
        }
    }

    #[test]
    fn rejected_before_splitting() {
        let normalizer = Normalizer::new(CleanStrategy::RegexOnly);
        let outcome = process_article(&normalizer, raw("1990", &fixture_text()));
        assert_eq!(outcome, ArticleOutcome::Rejected(Rejection::YearTitle));

        let outcome = process_article(&normalizer, raw("Stubville", "{{stub}} Stubville is a town."));
        assert_eq!(outcome, ArticleOutcome::Rejected(Rejection::TooShort));
    }

    #[test]
    fn kept_without_sections_when_text_has_no_headings() {
        let normalizer = Normalizer::new(CleanStrategy::RegexOnly);
        let text = "x".repeat(120);
        let ArticleOutcome::Kept(article) = process_article(&normalizer, raw("Plain", &text)) else {
            panic!("should be kept");
        };
        assert_eq!(article.sections.get(Section::Intro), Some(text.as_str()));
    }
}
