pub mod corpus;
pub mod daat;
pub mod index;
pub mod postings;
pub mod tokenizer;

pub use daat::{daat_and, daat_and_with_skips, rank_by_weight, MergeOutcome};
pub use index::{IndexBuilder, InvertedIndex};
pub use postings::{Posting, PostingsList};

pub type DocId = u32;

/// Structural failures during index construction or skip-pointer misuse.
/// Per-query anomalies (unknown term, empty query) are not errors and are
/// handled by the orchestrator as empty results.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("out-of-order insertion for term {term:?}: doc {got} after doc {last}")]
    OutOfOrderInsertion { term: String, last: DocId, got: DocId },
    #[error("skip pointers used before the list was skip-linked")]
    SkipBeforeFinalize,
    #[error("postings list mutated after skip pointers were built")]
    SkipAfterMutation,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
