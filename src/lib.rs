//! # Hearth
//!
//! Search and discovery for apartment listings.
//!
//! ## Features
//!
//! - Typo-tolerant full-text search with per-field boosts
//! - Structured, non-scoring filters (type, price, dates, amenities)
//! - Featured-aware ranking evaluated at query time
//! - Prefix autocomplete and "did you mean" spelling suggestions
//! - Per-document write serialization with retry and reconciliation
//! - Gap-free background reindexing with an atomic swap
//!
//! ## Example
//!
//! ```no_run
//! use hearth::config::HearthConfig;
//! use hearth::gateway::{SearchGateway, SearchRequest};
//!
//! let gateway = SearchGateway::new(HearthConfig::default()).unwrap();
//! let page = gateway.search(&SearchRequest::new("zamalek")).unwrap();
//! println!("{} matching listings", page.total_count);
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod index;
pub mod indexer;
pub mod query;
pub mod ranking;
pub mod suggest;
pub mod util;

pub mod prelude {
    pub use crate::config::HearthConfig;
    pub use crate::document::{ApartmentRecord, ListingStatus, SearchDocument};
    pub use crate::error::{HearthError, Result};
    pub use crate::gateway::{
        AutocompleteRequest, FilterQuery, SearchGateway, SearchPage, SearchRequest,
        SpellcheckRequest,
    };
    pub use crate::indexer::{ApartmentEvent, Indexer, WriteOutcome};
    pub use crate::query::{FilterRequest, Fuzziness};
    pub use crate::ranking::SortMode;
    pub use crate::suggest::SuggestField;
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
