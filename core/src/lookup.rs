use crate::collection::Collection;
use crate::index::{DocId, TermId};
use crate::tokenizer::Analyzer;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub doc_name: String,
    pub doc_id: DocId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    NotFound { raw: String },
    NoPostings { raw: String, term: String, term_id: TermId },
    Found { term: String, term_id: TermId, occurrences: Vec<Occurrence> },
}

/// Resolve a raw term the same way document text is normalized and list
/// the documents it occurs in, ascending by document id.
pub fn lookup(collection: &Collection, analyzer: &Analyzer, raw: &str) -> LookupOutcome {
    let not_found = || LookupOutcome::NotFound { raw: raw.trim().to_string() };
    let Some(term) = analyzer.normalize_term(raw) else { return not_found() };
    let Some(term_id) = collection.dictionaries.terms.id(&term) else { return not_found() };

    let occurrences: Vec<Occurrence> = collection
        .index
        .postings(term_id)
        .into_iter()
        .flatten()
        .map(|(&doc_id, &count)| Occurrence {
            doc_name: collection.dictionaries.docs.name(doc_id).unwrap_or("<unknown>").to_string(),
            doc_id,
            count,
        })
        .collect();

    if occurrences.is_empty() {
        LookupOutcome::NoPostings { raw: raw.trim().to_string(), term, term_id }
    } else {
        LookupOutcome::Found { term, term_id, occurrences }
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupOutcome::NotFound { raw } => write!(f, "Term '{raw}' not found in the index."),
            LookupOutcome::NoPostings { raw, .. } => write!(f, "Term '{raw}' found but appears in no documents."),
            LookupOutcome::Found { term, term_id, occurrences } => {
                writeln!(f, "Term: {term} (ID: {term_id})")?;
                write!(f, "Appears in the following documents:")?;
                for o in occurrences {
                    write!(f, "\n  Document: {} (ID: {}), Frequency: {}", o.doc_name, o.doc_id, o.count)?;
                }
                Ok(())
            }
        }
    }
}
