//! The read façade.
//!
//! [`SearchGateway`] exposes the four read operations (search, filter,
//! autocomplete, spellcheck) over the shared index store, and hands out the
//! [`Indexer`](crate::indexer::Indexer) for writes.

pub mod request;
pub mod response;
pub mod service;

pub use request::{AutocompleteRequest, FilterQuery, SearchRequest, SpellcheckRequest};
pub use response::{SearchHit, SearchPage};
pub use service::SearchGateway;
