//! The in-memory index store.
//!
//! - [`AnalyzedDocument`]: everything the index needs from one document,
//!   computed before any lock is taken.
//! - [`InvertedIndex`]: term dictionaries, postings and stored documents.
//! - [`IndexStore`]: the shared, lock-protected index with availability,
//!   generations and gap-free rebuilds.
//! - [`IndexSearcher`]: runs a [`StructuredQuery`](crate::query::StructuredQuery)
//!   against a read guard.

pub mod analyzed;
pub mod bm25;
pub mod inverted;
pub mod searcher;
pub mod store;

pub use analyzed::{AnalyzedDocument, ExactFields, FieldTerms};
pub use bm25::Bm25;
pub use inverted::{FieldIndex, IndexStats, InvertedIndex, Postings};
pub use searcher::{Candidate, IndexSearcher};
pub use store::{IndexStore, RebuildToken, StoreWrite};
