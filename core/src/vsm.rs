//! TF-IDF weighting over an immutable index snapshot.
//!
//! Documents use raw relative frequency (`count / length`), queries use the
//! smoothed form `0.5 + 0.5 * count / length`, both multiplied by
//! `idf = ln(N / df)`.

use crate::dictionary::Dictionary;
use crate::index::{DocId, Index, TermId};
use std::collections::BTreeMap;

/// Sparse weight vector keyed by term id.
pub type SparseVector = BTreeMap<TermId, f64>;

#[derive(Debug, Clone, Copy)]
pub struct VectorSpace<'a> {
    index: &'a Index,
    total_docs: usize,
}

impl<'a> VectorSpace<'a> {
    /// `total_docs` is the size of the document dictionary, not the number of
    /// documents that ended up with a forward row.
    pub fn new(index: &'a Index, total_docs: usize) -> Self {
        Self { index, total_docs }
    }

    pub fn index(&self) -> &'a Index { self.index }

    pub fn total_docs(&self) -> usize { self.total_docs }

    pub fn df(&self, term: TermId) -> usize {
        self.index.postings(term).map_or(0, |p| p.len())
    }

    pub fn idf(&self, term: TermId) -> f64 {
        idf(self.total_docs, self.df(term))
    }

    pub fn document_vector(&self, doc: DocId) -> SparseVector {
        let mut vector = SparseVector::new();
        let Some(row) = self.index.document(doc) else { return vector };
        let length: u64 = row.values().map(|&c| c as u64).sum();
        if length == 0 {
            return vector;
        }
        for (&term, &count) in row {
            let tf = count as f64 / length as f64;
            vector.insert(term, tf * self.idf(term));
        }
        vector
    }

    /// Weights for an analyzed query. The query length counts every token,
    /// including ones missing from `terms`; those tokens carry no weight.
    pub fn query_vector<S: AsRef<str>>(&self, tokens: &[S], terms: &Dictionary) -> SparseVector {
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for token in tokens {
            if let Some(tid) = terms.id(token.as_ref()) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        self.query_vector_from_counts(&counts, tokens.len())
    }

    pub fn query_vector_from_counts(&self, counts: &BTreeMap<TermId, u32>, query_len: usize) -> SparseVector {
        let mut vector = SparseVector::new();
        if query_len == 0 {
            return vector;
        }
        for (&term, &qcount) in counts {
            if qcount == 0 {
                continue;
            }
            let tf = 0.5 + 0.5 * (qcount as f64 / query_len as f64);
            vector.insert(term, tf * self.idf(term));
        }
        vector
    }
}

/// `ln(total_docs / df)`, or 0 when the term occurs nowhere.
pub fn idf(total_docs: usize, df: usize) -> f64 {
    if df == 0 || total_docs == 0 {
        return 0.0;
    }
    // df can only exceed N when the index and dictionary disagree; clamp so weights stay non-negative
    (total_docs as f64 / df as f64).ln().max(0.0)
}

pub fn norm(v: &SparseVector) -> f64 {
    v.values().map(|w| w * w).sum::<f64>().sqrt()
}

pub fn dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(t, w)| large.get(t).map(|x| w * x))
        .sum()
}
