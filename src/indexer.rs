//! Indexing: turning apartment changes into index store writes.
//!
//! The [`Indexer`] is the single writer of the [`IndexStore`](crate::index::IndexStore).
//! It serializes writes per document id, retries transient failures with
//! backoff, queues what still fails for reconciliation, and rebuilds the
//! whole index from an [`ApartmentSource`] without interrupting reads.

pub mod event;
pub mod locks;
pub mod reconcile;
pub mod reindex;
pub mod retry;
pub mod source;
pub mod writer;

pub use event::ApartmentEvent;
pub use locks::{IdGuard, IdLocks};
pub use reconcile::{DocumentChange, PendingWrite, ReconcileReport, ReconciliationQueue};
pub use reindex::{ReindexHandle, ReindexReport};
pub use retry::Backoff;
pub use source::{ApartmentSource, InMemorySource};
pub use writer::{Indexer, WriteOutcome};
