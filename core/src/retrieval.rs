//! Cosine ranking of documents against a query vector.
//!
//! Document lengths and norms are computed once when the retriever is
//! created. A query then only touches the postings of its own terms, so the
//! cost per query is the summed posting-list length of the query terms.

use crate::dictionary::Dictionary;
use crate::index::DocId;
use crate::vsm::{norm, SparseVector, VectorSpace};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
struct DocStats {
    length: u64,
    norm: f64,
}

pub struct Retriever<'a> {
    space: VectorSpace<'a>,
    docs: &'a Dictionary,
    stats: HashMap<DocId, DocStats>,
}

impl<'a> Retriever<'a> {
    pub fn new(space: VectorSpace<'a>, docs: &'a Dictionary) -> Self {
        let mut stats = HashMap::with_capacity(space.index().num_indexed_docs());
        for &doc in space.index().forward().keys() {
            let vector = space.document_vector(doc);
            let length = space
                .index()
                .document(doc)
                .map_or(0, |row| row.values().map(|&c| c as u64).sum());
            stats.insert(doc, DocStats { length, norm: norm(&vector) });
        }
        Self { space, docs, stats }
    }

    pub fn space(&self) -> &VectorSpace<'a> { &self.space }

    /// Documents with positive cosine similarity, best first.
    ///
    /// Ties are broken by ascending document id. An empty or all-zero query
    /// yields an empty ranking.
    pub fn rank(&self, query: &SparseVector) -> Vec<ScoredDoc> {
        let query_norm = norm(query);
        if query_norm == 0.0 {
            return Vec::new();
        }

        let mut dots: BTreeMap<DocId, f64> = BTreeMap::new();
        for (&term, &q_w) in query {
            if q_w == 0.0 {
                continue;
            }
            let Some(postings) = self.space.index().postings(term) else { continue };
            let idf = self.space.idf(term);
            for (&doc, &count) in postings {
                let Some(stats) = self.stats.get(&doc) else { continue };
                if stats.length == 0 {
                    continue;
                }
                let d_w = (count as f64 / stats.length as f64) * idf;
                *dots.entry(doc).or_insert(0.0) += q_w * d_w;
            }
        }

        let mut scored: Vec<ScoredDoc> = Vec::with_capacity(dots.len());
        for (doc, dot) in dots {
            let doc_norm = self.stats.get(&doc).map_or(0.0, |s| s.norm);
            if doc_norm == 0.0 {
                continue;
            }
            let cosine = (dot / (query_norm * doc_norm)).min(1.0);
            if cosine <= 0.0 {
                continue;
            }
            let Some(name) = self.docs.name(doc) else {
                tracing::warn!(doc_id = doc, "ranked document has no name in the document dictionary");
                continue;
            };
            scored.push(ScoredDoc { doc_id: doc, name: name.to_string(), score: cosine });
        }

        scored.sort_by(|a, b| match b.score.total_cmp(&a.score) {
            Ordering::Equal => a.doc_id.cmp(&b.doc_id),
            other => other,
        });
        scored
    }
}
