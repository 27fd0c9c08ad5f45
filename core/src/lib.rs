pub mod collection;
pub mod config;
pub mod corpus;
pub mod dictionary;
pub mod eval;
pub mod index;
pub mod lookup;
pub mod persist;
pub mod qrels;
pub mod report;
pub mod retrieval;
pub mod tokenizer;
pub mod topics;
pub mod validate;
pub mod vsm;

pub use collection::Collection;
pub use dictionary::{Dictionaries, Dictionary};
pub use eval::{Judgments, Metrics, Query, QueryVariant, RankedResult, Report};
pub use index::{DocId, Index, TermCounts, TermId};
pub use retrieval::{Retriever, ScoredDoc};
pub use validate::Inconsistency;
pub use vsm::{SparseVector, VectorSpace};
