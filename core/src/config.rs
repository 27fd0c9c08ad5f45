use crate::eval::QueryVariant;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Run settings. Every field has a default, so a config file only needs to
/// name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub corpus_dir: PathBuf,
    pub topics: PathBuf,
    pub qrels: PathBuf,
    pub output_dir: PathBuf,
    /// One stopword per line; the built-in list is used when unset.
    pub stopwords: Option<PathBuf>,
    pub results_file: String,
    pub report_file: String,
    /// Which query variant is written to the results file.
    pub results_variant: QueryVariant,
    pub max_results: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("ft911"),
            topics: PathBuf::from("topics.txt"),
            qrels: PathBuf::from("main.qrels"),
            output_dir: PathBuf::from("./index"),
            stopwords: None,
            results_file: "vsm_output.txt".into(),
            report_file: "performance_report.txt".into(),
            results_variant: QueryVariant::Title,
            max_results: None,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// `Config::load` when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let c: Config = serde_json::from_str(r#"{ "corpus_dir": "data", "results_variant": "title+desc", "max_results": 1000 }"#).unwrap();
        assert_eq!(c.corpus_dir, PathBuf::from("data"));
        assert_eq!(c.results_variant, QueryVariant::TitleDesc);
        assert_eq!(c.max_results, Some(1000));
        assert_eq!(c.report_file, "performance_report.txt");
        assert!(c.stopwords.is_none());
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = Config::load(Path::new("/nonexistent/trec.json")).unwrap_err();
        assert!(format!("{err:#}").contains("trec.json"));
    }
}
