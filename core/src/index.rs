use crate::dictionary::Dictionary;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type TermId = u32;
pub type DocId = u32;

/// Occurrence counts of the terms of one document, keyed by term id.
pub type TermCounts = BTreeMap<TermId, u32>;
/// Occurrence counts of one term across documents, keyed by doc id.
pub type Postings = BTreeMap<DocId, u32>;

pub type ForwardIndex = BTreeMap<DocId, TermCounts>;
pub type InvertedIndex = BTreeMap<TermId, Postings>;

/// Forward (doc -> term counts) and inverted (term -> doc counts) indexes kept in lockstep.
///
/// Both sides use ordered maps so every listing comes out in ascending id order.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Index {
    pub(crate) forward: ForwardIndex,
    pub(crate) inverted: InvertedIndex,
}

impl Index {
    pub fn new() -> Self { Self::default() }

    /// Assemble an index from raw parts without checking symmetry. Run
    /// [`Index::validate`] before trusting the result.
    pub fn from_parts(forward: ForwardIndex, inverted: InvertedIndex) -> Self {
        Self { forward, inverted }
    }

    /// Rebuild the forward index as the transpose of a persisted inverted index.
    pub fn from_inverted(inverted: InvertedIndex) -> Self {
        let mut forward = ForwardIndex::new();
        for (&term, postings) in &inverted {
            for (&doc, &count) in postings {
                forward.entry(doc).or_default().insert(term, count);
            }
        }
        Self { forward, inverted }
    }

    /// Insert or replace the contribution of `doc_id`.
    ///
    /// A second call for the same document replaces the first one entirely.
    /// Zero counts are dropped with a warning; an empty row leaves the
    /// document without a forward entry.
    pub fn add_document(&mut self, doc_id: DocId, term_counts: &TermCounts) -> Result<()> {
        if doc_id == 0 {
            bail!("document id 0 is not a valid id");
        }
        if term_counts.contains_key(&0) {
            bail!("term id 0 is not a valid id (doc {doc_id})");
        }

        self.remove_document(doc_id);

        let mut row = TermCounts::new();
        for (&term, &count) in term_counts {
            if count == 0 {
                tracing::warn!(doc_id, term_id = term, "ignoring zero count");
                continue;
            }
            row.insert(term, count);
        }
        if row.is_empty() {
            return Ok(());
        }
        for (&term, &count) in &row {
            self.inverted.entry(term).or_default().insert(doc_id, count);
        }
        self.forward.insert(doc_id, row);
        Ok(())
    }

    /// Count each analyzed term of a document and add the result. Terms
    /// missing from the dictionary are skipped.
    pub fn add_terms<S: AsRef<str>>(&mut self, doc_id: DocId, terms: &[S], dict: &Dictionary) -> Result<()> {
        let counts = count_terms(terms, dict);
        self.add_document(doc_id, &counts)
    }

    fn remove_document(&mut self, doc_id: DocId) {
        let Some(old) = self.forward.remove(&doc_id) else { return };
        for term in old.keys() {
            if let Some(postings) = self.inverted.get_mut(term) {
                postings.remove(&doc_id);
                if postings.is_empty() {
                    self.inverted.remove(term);
                }
            }
        }
    }

    pub fn forward(&self) -> &ForwardIndex { &self.forward }

    pub fn inverted(&self) -> &InvertedIndex { &self.inverted }

    pub fn document(&self, doc_id: DocId) -> Option<&TermCounts> { self.forward.get(&doc_id) }

    pub fn postings(&self, term_id: TermId) -> Option<&Postings> { self.inverted.get(&term_id) }

    /// Number of documents that have at least one indexed term.
    pub fn num_indexed_docs(&self) -> usize { self.forward.len() }

    pub fn num_terms(&self) -> usize { self.inverted.len() }
}

/// Term-frequency map of a token stream. Unknown terms are dropped.
pub fn count_terms<S: AsRef<str>>(terms: &[S], dict: &Dictionary) -> TermCounts {
    let mut counts = TermCounts::new();
    for term in terms {
        if let Some(tid) = dict.id(term.as_ref()) {
            *counts.entry(tid).or_insert(0) += 1;
        }
    }
    counts
}
