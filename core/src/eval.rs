//! Precision/recall of ranked runs against relevance judgments.

use crate::retrieval::ScoredDoc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How much of a topic's text goes into the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueryVariant {
    #[default]
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "title+desc")]
    TitleDesc,
    #[serde(rename = "title+narr")]
    TitleNarr,
}

impl QueryVariant {
    pub const ALL: [QueryVariant; 3] = [QueryVariant::Title, QueryVariant::TitleDesc, QueryVariant::TitleNarr];

    pub fn label(self) -> &'static str {
        match self {
            QueryVariant::Title => "title",
            QueryVariant::TitleDesc => "title+desc",
            QueryVariant::TitleNarr => "title+narr",
        }
    }
}

impl fmt::Display for QueryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.label()) }
}

impl std::str::FromStr for QueryVariant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "title" => Ok(QueryVariant::Title),
            "title+desc" | "title-desc" => Ok(QueryVariant::TitleDesc),
            "title+narr" | "title-narr" => Ok(QueryVariant::TitleNarr),
            other => anyhow::bail!("unknown query variant {other:?} (expected title, title+desc or title+narr)"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub topic: u32,
    pub title: String,
    pub description: String,
    pub narrative: String,
}

impl Query {
    pub fn text(&self, variant: QueryVariant) -> String {
        match variant {
            QueryVariant::Title => self.title.clone(),
            QueryVariant::TitleDesc => format!("{} {}", self.title, self.description),
            QueryVariant::TitleNarr => format!("{} {}", self.title, self.narrative),
        }
    }
}

/// topic -> document name -> grade (0 or 1).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Judgments {
    by_topic: BTreeMap<u32, BTreeMap<String, u8>>,
}

impl Judgments {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, topic: u32, doc: impl Into<String>, grade: u8) {
        self.by_topic.entry(topic).or_default().insert(doc.into(), grade);
    }

    /// Grade of `doc` for `topic`, 0 when unjudged.
    pub fn grade(&self, topic: u32, doc: &str) -> u8 {
        self.by_topic.get(&topic).and_then(|docs| docs.get(doc)).copied().unwrap_or(0)
    }

    /// Sum of the grades recorded for the topic, independent of any run.
    pub fn total_relevant(&self, topic: u32) -> usize {
        self.by_topic.get(&topic).map_or(0, |docs| docs.values().map(|&g| g as usize).sum())
    }

    pub fn topics(&self) -> impl Iterator<Item = u32> + '_ { self.by_topic.keys().copied() }

    pub fn len(&self) -> usize { self.by_topic.values().map(BTreeMap::len).sum() }

    pub fn is_empty(&self) -> bool { self.by_topic.is_empty() }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedResult {
    pub topic: u32,
    pub doc_name: String,
    pub rank: usize,
    pub score: f64,
    pub variant: QueryVariant,
    pub relevance: u8,
}

impl RankedResult {
    /// Assign dense 1-based ranks to a ranking and attach judged grades.
    pub fn from_ranking(topic: u32, variant: QueryVariant, ranking: &[ScoredDoc], judgments: &Judgments) -> Vec<RankedResult> {
        ranking
            .iter()
            .enumerate()
            .map(|(i, hit)| RankedResult {
                topic,
                doc_name: hit.name.clone(),
                rank: i + 1,
                score: hit.score,
                variant,
                relevance: judgments.grade(topic, &hit.name),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Metrics {
    pub retrieved: usize,
    pub relevant_retrieved: usize,
    pub total_relevant: usize,
    pub precision: f64,
    pub recall: f64,
}

impl Metrics {
    pub fn compute(topic: u32, retrieved: &[&RankedResult], judgments: &Judgments) -> Self {
        let relevant_retrieved = retrieved.iter().filter(|r| judgments.grade(topic, &r.doc_name) == 1).count();
        let total_relevant = judgments.total_relevant(topic);
        let precision = if retrieved.is_empty() { 0.0 } else { relevant_retrieved as f64 / retrieved.len() as f64 };
        let recall = if total_relevant == 0 { 0.0 } else { relevant_retrieved as f64 / total_relevant as f64 };
        Self { retrieved: retrieved.len(), relevant_retrieved, total_relevant, precision, recall }
    }
}

/// Metrics keyed by topic, then by query variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub topics: BTreeMap<u32, BTreeMap<QueryVariant, Metrics>>,
}

impl Report {
    /// Make sure every variant of `topic` is present, scoring absent ones as an empty run.
    pub fn include_topic(&mut self, topic: u32, judgments: &Judgments) {
        let variants = self.topics.entry(topic).or_default();
        for variant in QueryVariant::ALL {
            variants.entry(variant).or_insert_with(|| Metrics::compute(topic, &[], judgments));
        }
    }

    pub fn get(&self, topic: u32, variant: QueryVariant) -> Option<&Metrics> {
        self.topics.get(&topic).and_then(|v| v.get(&variant))
    }
}

/// Group results by topic and variant and score each group.
pub fn evaluate(results: &[RankedResult], judgments: &Judgments) -> Report {
    let mut groups: BTreeMap<(u32, QueryVariant), Vec<&RankedResult>> = BTreeMap::new();
    for r in results {
        groups.entry((r.topic, r.variant)).or_default().push(r);
    }
    let mut report = Report::default();
    for ((topic, variant), retrieved) in groups {
        let metrics = Metrics::compute(topic, &retrieved, judgments);
        tracing::debug!(topic, variant = variant.label(), precision = metrics.precision, recall = metrics.recall, "evaluated run");
        report.topics.entry(topic).or_default().insert(variant, metrics);
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(doc_id: u32, name: &str, score: f64) -> ScoredDoc {
        ScoredDoc { doc_id, name: name.to_string(), score }
    }

    #[test]
    fn tied_relevance_scenario() {
        let mut j = Judgments::new();
        j.insert(1, "docA", 1);
        j.insert(1, "docB", 0);
        let ranking = vec![hit(1, "docA", 0.9), hit(2, "docB", 0.4)];
        let results = RankedResult::from_ranking(1, QueryVariant::Title, &ranking, &j);
        assert_eq!(results[0].rank, 1);
        assert_eq!(results[1].rank, 2);
        assert_eq!(results[0].relevance, 1);

        let report = evaluate(&results, &j);
        let m = report.get(1, QueryVariant::Title).unwrap();
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 1.0);
        assert_eq!((m.relevant_retrieved, m.total_relevant), (1, 1));
    }

    #[test]
    fn empty_runs_score_zero() {
        let mut j = Judgments::new();
        j.insert(5, "x", 1);
        let mut report = evaluate(&[], &j);
        assert!(report.topics.is_empty());
        report.include_topic(5, &j);
        for variant in QueryVariant::ALL {
            let m = report.get(5, variant).unwrap();
            assert_eq!((m.precision, m.recall, m.retrieved), (0.0, 0.0, 0));
            assert_eq!(m.total_relevant, 1);
        }
    }

    #[test]
    fn unjudged_documents_default_to_zero() {
        let j = Judgments::new();
        let results = RankedResult::from_ranking(3, QueryVariant::TitleNarr, &[hit(9, "Z", 0.1)], &j);
        assert_eq!(results[0].relevance, 0);
        let m = evaluate(&results, &j).get(3, QueryVariant::TitleNarr).copied().unwrap();
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
    }

    #[test]
    fn variants_are_scored_independently_and_bounded() {
        let mut j = Judgments::new();
        for (doc, g) in [("a", 1), ("b", 1), ("c", 0), ("d", 1)] {
            j.insert(7, doc, g);
        }
        let title = RankedResult::from_ranking(7, QueryVariant::Title, &[hit(1, "a", 0.8)], &j);
        let desc = RankedResult::from_ranking(
            7,
            QueryVariant::TitleDesc,
            &[hit(1, "a", 0.8), hit(2, "b", 0.5), hit(3, "c", 0.4), hit(5, "e", 0.1)],
            &j,
        );
        let all: Vec<_> = title.into_iter().chain(desc).collect();
        let report = evaluate(&all, &j);

        let t = report.get(7, QueryVariant::Title).unwrap();
        assert_eq!(t.precision, 1.0);
        assert!((t.recall - 1.0 / 3.0).abs() < 1e-12);
        let d = report.get(7, QueryVariant::TitleDesc).unwrap();
        assert_eq!(d.precision, 0.5);
        assert!((d.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!(report.get(7, QueryVariant::TitleNarr).is_none());

        for m in report.topics.values().flat_map(|v| v.values()) {
            assert!((0.0..=1.0).contains(&m.precision));
            assert!((0.0..=1.0).contains(&m.recall));
        }
    }

    #[test]
    fn query_text_per_variant() {
        let q = Query { topic: 1, title: "oil spill".into(), description: "desc".into(), narrative: "narr".into() };
        assert_eq!(q.text(QueryVariant::Title), "oil spill");
        assert_eq!(q.text(QueryVariant::TitleDesc), "oil spill desc");
        assert_eq!(q.text(QueryVariant::TitleNarr), "oil spill narr");
        assert_eq!("title+desc".parse::<QueryVariant>().unwrap(), QueryVariant::TitleDesc);
        assert!("body".parse::<QueryVariant>().is_err());
    }
}
