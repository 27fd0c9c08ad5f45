//! Cross-check of forward and inverted indexes.
//!
//! The validator only observes: it reports every mismatch it finds and
//! leaves the index untouched.

use crate::index::{DocId, Index, TermId};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// The term of a forward entry has no inverted bucket at all.
    TermMissing { term: TermId, doc: DocId },
    /// The inverted bucket exists but lacks the document.
    PostingMissing { term: TermId, doc: DocId },
    CountMismatch { term: TermId, doc: DocId, forward: u32, inverted: u32 },
    /// An inverted posting names a document with no forward row.
    DocumentMissing { doc: DocId, term: TermId },
    /// The forward row exists but lacks the term.
    ForwardTermMissing { term: TermId, doc: DocId },
    /// A stored zero count, on either side.
    ZeroCount { term: TermId, doc: DocId },
    EmptyBucket { term: TermId },
    EmptyRow { doc: DocId },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TermMissing { term, doc } => {
                write!(f, "term {term} exists in doc {doc} but is missing from the inverted index")
            }
            Self::PostingMissing { term, doc } => {
                write!(f, "term {term} has no doc {doc} entry in the inverted index")
            }
            Self::CountMismatch { term, doc, forward, inverted } => write!(
                f,
                "count mismatch for term {term} in doc {doc} (forward: {forward} vs inverted: {inverted})"
            ),
            Self::DocumentMissing { doc, term } => {
                write!(f, "doc {doc} is listed for term {term} but is missing from the forward index")
            }
            Self::ForwardTermMissing { term, doc } => {
                write!(f, "term {term} is missing from doc {doc}'s forward index row")
            }
            Self::ZeroCount { term, doc } => write!(f, "zero count stored for term {term} in doc {doc}"),
            Self::EmptyBucket { term } => write!(f, "term {term} has an empty inverted bucket"),
            Self::EmptyRow { doc } => write!(f, "doc {doc} has an empty forward row"),
        }
    }
}

/// Every structural disagreement between the two sides of `index`.
///
/// Pass one walks the forward index and checks each (doc, term, count)
/// against the inverted side; pass two walks the inverted index and checks
/// that each (term, doc) pair has a forward entry. Counts are compared only
/// in pass one.
pub fn inconsistencies(index: &Index) -> Vec<Inconsistency> {
    let mut found = Vec::new();

    for (&doc, row) in &index.forward {
        if row.is_empty() {
            found.push(Inconsistency::EmptyRow { doc });
        }
        for (&term, &count) in row {
            if count == 0 {
                found.push(Inconsistency::ZeroCount { term, doc });
            }
            match index.inverted.get(&term) {
                None => found.push(Inconsistency::TermMissing { term, doc }),
                Some(postings) => match postings.get(&doc) {
                    None => found.push(Inconsistency::PostingMissing { term, doc }),
                    Some(&inverted) if inverted != count => {
                        found.push(Inconsistency::CountMismatch { term, doc, forward: count, inverted })
                    }
                    Some(_) => {}
                },
            }
        }
    }

    for (&term, postings) in &index.inverted {
        if postings.is_empty() {
            found.push(Inconsistency::EmptyBucket { term });
        }
        for (&doc, &count) in postings {
            if count == 0 {
                found.push(Inconsistency::ZeroCount { term, doc });
            }
            match index.forward.get(&doc) {
                None => found.push(Inconsistency::DocumentMissing { doc, term }),
                Some(row) if !row.contains_key(&term) => {
                    found.push(Inconsistency::ForwardTermMissing { term, doc })
                }
                Some(_) => {}
            }
        }
    }

    found
}

impl Index {
    /// Reports every inconsistency through `tracing::error!` and returns how many were found.
    pub fn validate(&self) -> usize {
        let found = inconsistencies(self);
        for problem in &found {
            tracing::error!(%problem, "index inconsistency");
        }
        if found.is_empty() {
            tracing::info!(docs = self.num_indexed_docs(), terms = self.num_terms(), "index validation passed");
        } else {
            tracing::error!(count = found.len(), "index validation found inconsistencies");
        }
        found.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ForwardIndex, InvertedIndex, TermCounts};

    fn built() -> Index {
        let mut idx = Index::new();
        idx.add_document(1, &TermCounts::from([(1, 2), (2, 1)])).unwrap();
        idx.add_document(2, &TermCounts::from([(2, 1), (3, 1)])).unwrap();
        idx
    }

    #[test]
    fn clean_build_has_no_problems() {
        let idx = built();
        assert!(inconsistencies(&idx).is_empty());
        assert_eq!(idx.validate(), 0);
    }

    #[test]
    fn detects_count_mismatch() {
        let mut idx = built();
        idx.inverted.get_mut(&1).unwrap().insert(1, 9);
        assert_eq!(
            inconsistencies(&idx),
            vec![Inconsistency::CountMismatch { term: 1, doc: 1, forward: 2, inverted: 9 }]
        );
    }

    #[test]
    fn detects_missing_sides() {
        let mut idx = built();
        idx.inverted.remove(&3);
        idx.forward.get_mut(&1).unwrap().remove(&2);
        let found = inconsistencies(&idx);
        assert!(found.contains(&Inconsistency::TermMissing { term: 3, doc: 2 }));
        assert!(found.contains(&Inconsistency::ForwardTermMissing { term: 2, doc: 1 }));
        assert_eq!(idx.validate(), found.len());
    }

    #[test]
    fn detects_orphan_postings_and_empty_buckets() {
        let mut forward = ForwardIndex::new();
        forward.insert(1, TermCounts::from([(1, 1)]));
        let mut inverted = InvertedIndex::new();
        inverted.insert(1, [(1, 1), (5, 2)].into_iter().collect());
        inverted.insert(4, Default::default());
        let idx = Index::from_parts(forward, inverted);

        let found = inconsistencies(&idx);
        assert_eq!(
            found,
            vec![
                Inconsistency::DocumentMissing { doc: 5, term: 1 },
                Inconsistency::EmptyBucket { term: 4 },
            ]
        );
    }

    #[test]
    fn detects_empty_forward_row() {
        let mut forward = ForwardIndex::new();
        forward.insert(1, TermCounts::from([(1, 1)]));
        forward.insert(2, TermCounts::new());
        let mut inverted = InvertedIndex::new();
        inverted.insert(1, [(1, 1)].into_iter().collect());
        let idx = Index::from_parts(forward, inverted);

        assert_eq!(inconsistencies(&idx), vec![Inconsistency::EmptyRow { doc: 2 }]);
        assert_eq!(idx.validate(), 1);
    }

    #[test]
    fn detects_zero_count_on_forward_side() {
        let mut forward = ForwardIndex::new();
        forward.insert(1, TermCounts::from([(1, 0)]));
        let mut inverted = InvertedIndex::new();
        inverted.insert(1, [(1, 3)].into_iter().collect());
        let idx = Index::from_parts(forward, inverted);

        assert_eq!(
            inconsistencies(&idx),
            vec![
                Inconsistency::ZeroCount { term: 1, doc: 1 },
                Inconsistency::CountMismatch { term: 1, doc: 1, forward: 0, inverted: 3 },
            ]
        );
    }

    #[test]
    fn messages_name_the_ids() {
        let msg = Inconsistency::PostingMissing { term: 12, doc: 34 }.to_string();
        assert!(msg.contains("12") && msg.contains("34"));
    }
}
