use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::corpus::DEFAULT_FILE_PREFIX;
use crate::error::Result;

/// Run settings. Layered: defaults < `wikivoyage_prep.*` file <
/// `WIKIVOYAGE_*` environment < command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub file_prefix: String,
    pub regex_only: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input_dir: PathBuf::from("enwikivoyage-latest-pages-articles"),
            output_dir: PathBuf::from("enwikivoyage-sectioned"),
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
            regex_only: false,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::with_name("wikivoyage_prep").required(false))
            .add_source(Environment::with_prefix("WIKIVOYAGE").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dump_layout() {
        let settings = Settings::default();
        assert_eq!(settings.file_prefix, "wiki_");
        assert_eq!(settings.input_dir, PathBuf::from("enwikivoyage-latest-pages-articles"));
        assert!(!settings.regex_only);
    }

    #[test]
    fn partial_sources_fill_in_defaults() {
        let settings: Settings = Config::builder()
            .set_override("output_dir", "out")
            .unwrap()
            .set_override("regex_only", true)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert!(settings.regex_only);
        assert_eq!(settings.file_prefix, "wiki_");
    }
}
