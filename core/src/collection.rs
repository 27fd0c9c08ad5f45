//! A built collection: dictionaries plus the validated index, and the
//! build, persist and query-run paths that operate on it.

use crate::corpus::TrecDocument;
use crate::dictionary::{Dictionaries, Dictionary};
use crate::eval::{evaluate, Judgments, Query, QueryVariant, RankedResult, Report};
use crate::index::{Index, InvertedIndex};
use crate::persist::{self, IndexPaths, MetaFile};
use crate::retrieval::{Retriever, ScoredDoc};
use crate::tokenizer::Analyzer;
use crate::vsm::VectorSpace;
use anyhow::{bail, Result};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub dictionaries: Dictionaries,
    pub index: Index,
}

/// Ranked results of every topic and variant, with their evaluation.
#[derive(Debug, Clone, Default)]
pub struct Run {
    pub results: Vec<RankedResult>,
    pub report: Report,
}

impl Run {
    pub fn for_variant(&self, variant: QueryVariant) -> impl Iterator<Item = &RankedResult> + '_ {
        self.results.iter().filter(move |r| r.variant == variant)
    }
}

impl Collection {
    /// Analyze the documents, assign ids, index every document and validate once.
    ///
    /// Returns the collection and the number of inconsistencies the validator
    /// reported. A DOCNO seen twice keeps its first id; its last occurrence
    /// supplies the indexed text.
    pub fn build(documents: &[TrecDocument], analyzer: &Analyzer) -> (Self, usize) {
        let start = Instant::now();
        let analyzed: Vec<(&str, Vec<String>)> = documents
            .iter()
            .map(|d| (d.docno.as_str(), analyzer.analyze(&d.text)))
            .collect();

        let terms = Dictionary::from_names_sorted(analyzed.iter().flat_map(|(_, t)| t.iter().cloned()));
        let mut docs = Dictionary::new();
        for (docno, _) in &analyzed {
            docs.get_or_insert(docno);
        }
        tracing::info!(num_docs = docs.len(), num_terms = terms.len(), "built dictionaries");

        let mut index = Index::new();
        for (n, (docno, tokens)) in analyzed.iter().enumerate() {
            let Some(doc_id) = docs.id(docno) else { continue };
            if let Err(err) = index.add_terms(doc_id, tokens, &terms) {
                tracing::error!(docno, error = %err, "failed to index document");
            }
            if (n + 1) % 100 == 0 {
                tracing::debug!(processed = n + 1, "indexing progress");
            }
        }

        let collection = Self { dictionaries: Dictionaries { terms, docs }, index };
        let inconsistencies = collection.index.validate();
        tracing::info!(
            docs = collection.total_documents(),
            indexed = collection.index.num_indexed_docs(),
            terms = collection.index.num_terms(),
            secs = start.elapsed().as_secs_f64(),
            "index build complete"
        );
        (collection, inconsistencies)
    }

    /// Rebuild from persisted dictionaries and inverted index.
    pub fn from_parts(dictionaries: Dictionaries, inverted: InvertedIndex) -> Self {
        Self { dictionaries, index: Index::from_inverted(inverted) }
    }

    pub fn load(paths: &IndexPaths) -> Result<Self> {
        let dictionaries = persist::load_dictionaries(paths)?;
        let inverted = persist::load_compressed_inverted(paths)?;
        let collection = Self::from_parts(dictionaries, inverted);
        tracing::info!(
            docs = collection.total_documents(),
            terms = collection.index.num_terms(),
            root = %paths.root.display(),
            "loaded index"
        );
        Ok(collection)
    }

    pub fn total_documents(&self) -> usize { self.dictionaries.total_documents() }

    pub fn space(&self) -> VectorSpace<'_> { VectorSpace::new(&self.index, self.total_documents()) }

    pub fn retriever(&self) -> Retriever<'_> { Retriever::new(self.space(), &self.dictionaries.docs) }

    /// Analyze free text and rank the collection against it.
    pub fn search(&self, text: &str, analyzer: &Analyzer) -> Vec<ScoredDoc> {
        search_with(&self.retriever(), &self.dictionaries.terms, text, analyzer)
    }

    /// Rank every topic under every query variant and evaluate the results.
    /// `max_results` truncates each ranking before evaluation.
    pub fn run_topics(
        &self,
        queries: &[Query],
        judgments: &Judgments,
        analyzer: &Analyzer,
        max_results: Option<usize>,
    ) -> Run {
        let start = Instant::now();
        let retriever = self.retriever();
        let mut results = Vec::new();
        for query in queries {
            for variant in QueryVariant::ALL {
                let mut ranking = search_with(&retriever, &self.dictionaries.terms, &query.text(variant), analyzer);
                if let Some(k) = max_results {
                    ranking.truncate(k);
                }
                tracing::debug!(topic = query.topic, variant = variant.label(), hits = ranking.len(), "ranked topic");
                results.extend(RankedResult::from_ranking(query.topic, variant, &ranking, judgments));
            }
        }

        let mut report = evaluate(&results, judgments);
        for query in queries {
            report.include_topic(query.topic, judgments);
        }
        tracing::info!(
            topics = queries.len(),
            results = results.len(),
            secs = start.elapsed().as_secs_f64(),
            "query processing complete"
        );
        Run { results, report }
    }

    /// Write the text dumps, id maps, compressed index, dictionaries and meta file.
    ///
    /// Every file is attempted; failures are logged with their path and
    /// summarized in the returned error.
    pub fn save(&self, paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
        let outcomes = [
            persist::write_file(&paths.forward_dump(), |w| persist::write_index_dump(w, self.index.forward())),
            persist::write_file(&paths.inverted_dump(), |w| persist::write_index_dump(w, self.index.inverted())),
            persist::write_file(&paths.word_ids(), |w| persist::write_id_map(w, &self.dictionaries.terms)),
            persist::write_file(&paths.doc_ids(), |w| persist::write_id_map(w, &self.dictionaries.docs)),
            persist::save_compressed_inverted(paths, self.index.inverted()),
            persist::save_dictionaries(paths, &self.dictionaries),
            persist::save_meta(paths, meta),
        ];
        let mut failed = 0;
        for outcome in outcomes {
            if let Err(err) = outcome {
                tracing::error!(error = format!("{err:#}"), "failed to write index output");
                failed += 1;
            }
        }
        if failed > 0 {
            bail!("{failed} index output file(s) could not be written under {}", paths.root.display());
        }
        tracing::info!(root = %paths.root.display(), "index files written");
        Ok(())
    }

    pub fn meta(&self, inconsistencies: usize, created_at: String) -> MetaFile {
        MetaFile {
            num_docs: self.total_documents() as u32,
            num_terms: self.dictionaries.terms.len() as u32,
            inconsistencies: inconsistencies as u32,
            created_at,
            version: persist::FORMAT_VERSION,
        }
    }
}

fn search_with(retriever: &Retriever<'_>, terms: &Dictionary, text: &str, analyzer: &Analyzer) -> Vec<ScoredDoc> {
    let tokens = analyzer.analyze(text);
    if tokens.is_empty() {
        return Vec::new();
    }
    let query = retriever.space().query_vector(&tokens, terms);
    retriever.rank(&query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docs() -> Vec<TrecDocument> {
        vec![
            TrecDocument { docno: "FT-1".into(), text: "cat dog cat".into() },
            TrecDocument { docno: "FT-2".into(), text: "dog bird".into() },
            TrecDocument { docno: "FT-3".into(), text: String::new() },
        ]
    }

    #[test]
    fn build_assigns_ids_and_validates_clean() {
        let (c, problems) = Collection::build(&docs(), &Analyzer::default());
        assert_eq!(problems, 0);
        assert_eq!(c.total_documents(), 3);
        assert_eq!(c.index.num_indexed_docs(), 2);
        assert_eq!(c.dictionaries.terms.id("bird"), Some(1));
        assert_eq!(c.dictionaries.terms.id("cat"), Some(2));
        assert_eq!(c.dictionaries.terms.id("dog"), Some(3));
        assert_eq!(c.dictionaries.docs.id("FT-3"), Some(3));
    }

    #[test]
    fn duplicate_docno_keeps_last_text() {
        let mut d = docs();
        d.push(TrecDocument { docno: "FT-1".into(), text: "bird".into() });
        let (c, problems) = Collection::build(&d, &Analyzer::default());
        assert_eq!(problems, 0);
        assert_eq!(c.total_documents(), 3);
        let bird = c.dictionaries.terms.id("bird").unwrap();
        assert_eq!(c.index.document(1).unwrap().keys().copied().collect::<Vec<_>>(), vec![bird]);
    }

    #[test]
    fn search_ranks_matching_document_first() {
        let (c, _) = Collection::build(&docs(), &Analyzer::default());
        let hits = c.search("cats", &Analyzer::default());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "FT-1");
        assert!(c.search("the of and", &Analyzer::default()).is_empty());
        assert!(c.search("", &Analyzer::default()).is_empty());
    }

    #[test]
    fn run_covers_every_topic_and_variant() {
        let (c, _) = Collection::build(&docs(), &Analyzer::default());
        let queries = vec![
            Query { topic: 1, title: "cat".into(), description: "dog".into(), narrative: "unicorn".into() },
            Query { topic: 2, title: "zebra".into(), ..Default::default() },
        ];
        let mut j = Judgments::new();
        j.insert(1, "FT-1", 1);
        j.insert(1, "FT-2", 0);
        let run = c.run_topics(&queries, &j, &Analyzer::default(), None);

        assert_eq!(run.for_variant(QueryVariant::Title).count(), 1);
        let t = run.report.get(1, QueryVariant::Title).unwrap();
        assert_eq!((t.precision, t.recall), (1.0, 1.0));
        let d = run.report.get(1, QueryVariant::TitleDesc).unwrap();
        assert_eq!(d.retrieved, 2);
        assert_eq!(d.precision, 0.5);
        let missing = run.report.get(2, QueryVariant::TitleNarr).unwrap();
        assert_eq!(missing.retrieved, 0);

        let capped = c.run_topics(&queries, &j, &Analyzer::default(), Some(1));
        assert_eq!(capped.report.get(1, QueryVariant::TitleDesc).unwrap().retrieved, 1);
    }

    #[test]
    fn save_writes_remaining_files_when_one_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = IndexPaths::new(tmp.path());
        std::fs::create_dir_all(paths.meta()).unwrap();
        let (c, problems) = Collection::build(&docs(), &Analyzer::default());

        let err = c.save(&paths, &c.meta(problems, String::new())).unwrap_err();
        assert!(err.to_string().starts_with("1 index output file(s) could not be written"));
        assert!(paths.forward_dump().is_file());
        assert!(paths.inverted_dump().is_file());
        assert!(paths.doc_ids().is_file());
        assert_eq!(Collection::load(&paths).unwrap(), c);
    }
}
