use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::HashSet;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref WORD: Regex = Regex::new(r"[a-z]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref DEFAULT_STOPWORDS: HashSet<String> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","will","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().map(|w| w.to_string()).collect()
    };
}

/// Turns raw text into the normalized term stream the index is built from:
/// NFKD + lowercase, ASCII letter runs, stopword removal, English stemming.
#[derive(Debug, Clone)]
pub struct Analyzer {
    stopwords: HashSet<String>,
}

impl Default for Analyzer {
    fn default() -> Self { Self { stopwords: DEFAULT_STOPWORDS.clone() } }
}

impl Analyzer {
    pub fn with_stopwords<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let stopwords = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();
        Self { stopwords }
    }

    /// One stopword per line; blank lines are ignored.
    pub fn from_stopword_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading stopword list {}", path.display()))?;
        Ok(Self::with_stopwords(text.lines()))
    }

    /// Load the configured stopword list, falling back to the built-in one when it is
    /// absent or unreadable.
    pub fn from_optional_file(path: Option<&Path>) -> Self {
        match path {
            None => Self::default(),
            Some(p) => Self::from_stopword_file(p).unwrap_or_else(|err| {
                tracing::warn!(error = %err, "using built-in stopword list");
                Self::default()
            }),
        }
    }

    pub fn is_stopword(&self, token: &str) -> bool { self.stopwords.contains(token) }

    pub fn analyze(&self, text: &str) -> Vec<String> {
        let normalized = text.nfkd().collect::<String>().to_lowercase();
        let mut terms = Vec::new();
        for mat in WORD.find_iter(&normalized) {
            let token = mat.as_str();
            if self.is_stopword(token) { continue; }
            let stem = STEMMER.stem(token);
            if !stem.is_empty() {
                terms.push(stem.into_owned());
            }
        }
        terms
    }

    /// Lowercase and stem a single raw term without stopword filtering.
    ///
    /// Input that `analyze` would split into several tokens ("U.S.",
    /// "oil-spill") is not a single term and yields `None`.
    pub fn normalize_term(&self, raw: &str) -> Option<String> {
        let normalized = raw.trim().nfkd().collect::<String>().to_lowercase();
        let mut runs = WORD.find_iter(&normalized);
        let token = runs.next()?.as_str();
        if runs.next().is_some() {
            return None;
        }
        Some(STEMMER.stem(token).into_owned()).filter(|s| !s.is_empty())
    }
}
