//! Writes that could not be applied, kept for a later pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use crate::document::SearchDocument;
use crate::index::AnalyzedDocument;

/// An in-place change to a stored document's ranking state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentChange {
    /// One more view.
    View,
    /// Clear the featured flag if the window ended before this instant.
    ExpireFeatured(DateTime<Utc>),
}

impl DocumentChange {
    /// Apply to `doc`; whether anything changed.
    pub fn apply(&self, doc: &mut SearchDocument) -> bool {
        match self {
            DocumentChange::View => {
                doc.view_count = doc.view_count.saturating_add(1);
                true
            }
            DocumentChange::ExpireFeatured(now) => {
                if !doc.featured_expired_at(*now) {
                    return false;
                }
                doc.is_featured = false;
                true
            }
        }
    }
}

/// A deferred index write.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingWrite {
    Upsert(AnalyzedDocument),
    Remove(u64),
    /// Changes to whatever revision of `id` is stored when applied.
    Modify { id: u64, changes: Vec<DocumentChange> },
}

impl PendingWrite {
    pub fn id(&self) -> u64 {
        match self {
            PendingWrite::Upsert(analyzed) => analyzed.id(),
            PendingWrite::Remove(id) => *id,
            PendingWrite::Modify { id, .. } => *id,
        }
    }

    /// Whether applying `self` makes the queued write `queued` redundant.
    /// A queued upsert survives a write of an older or equal-content
    /// revision, and queued changes survive any upsert.
    fn supersedes(&self, queued: &PendingWrite) -> bool {
        match (self, queued) {
            (PendingWrite::Remove(_), _) => true,
            (PendingWrite::Upsert(applied), PendingWrite::Upsert(queued)) => {
                queued.document.updated_at <= applied.document.updated_at
            }
            (PendingWrite::Upsert(_), PendingWrite::Remove(_)) => true,
            (PendingWrite::Upsert(_), PendingWrite::Modify { .. }) => false,
            (PendingWrite::Modify { .. }, _) => false,
        }
    }
}

/// Deferred writes keyed by document id.
///
/// A removal, or an upsert at least as new as a queued one, replaces the
/// queued write for its id. Changes are folded into a queued upsert or
/// appended to queued changes, and dropped when the id is queued for removal.
#[derive(Debug, Default)]
pub struct ReconciliationQueue {
    pending: Mutex<BTreeMap<u64, PendingWrite>>,
}

impl ReconciliationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, write: PendingWrite) {
        let mut pending = self.pending.lock();
        let Some(queued) = pending.get_mut(&write.id()) else {
            pending.insert(write.id(), write);
            return;
        };
        match (queued, write) {
            (PendingWrite::Upsert(queued), PendingWrite::Modify { changes, .. }) => {
                fold_changes(queued, &changes);
            }
            (PendingWrite::Modify { changes: queued, .. }, PendingWrite::Modify { changes, .. }) => {
                queued.extend(changes);
            }
            (PendingWrite::Remove(_), PendingWrite::Modify { .. }) => {}
            (PendingWrite::Upsert(queued), PendingWrite::Upsert(incoming))
                if incoming.document.updated_at < queued.document.updated_at => {}
            (queued, PendingWrite::Upsert(mut incoming)) => {
                if let PendingWrite::Modify { changes, .. } = &*queued {
                    fold_changes(&mut incoming, changes);
                }
                *queued = PendingWrite::Upsert(incoming);
            }
            (queued, write) => *queued = write,
        }
    }

    /// Forget the queued write for the id of `applied`, a write that just
    /// went through, unless the queued one still carries newer state.
    pub fn discard_superseded(&self, applied: &PendingWrite) -> bool {
        let mut pending = self.pending.lock();
        let id = applied.id();
        let superseded = pending.get(&id).is_some_and(|queued| applied.supersedes(queued));
        superseded && pending.remove(&id).is_some()
    }

    /// Fold changes just written to the store into a queued upsert of the
    /// same id.
    pub fn carry_changes(&self, id: u64, changes: &[DocumentChange]) {
        if let Some(PendingWrite::Upsert(queued)) = self.pending.lock().get_mut(&id) {
            fold_changes(queued, changes);
        }
    }

    /// Remove and return every queued write, lowest id first.
    pub fn drain(&self) -> Vec<PendingWrite> {
        std::mem::take(&mut *self.pending.lock())
            .into_values()
            .collect()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.pending.lock().contains_key(&id)
    }

    pub fn ids(&self) -> Vec<u64> {
        self.pending.lock().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

// View and featured state are not analyzed, so the terms stay valid.
fn fold_changes(queued: &mut AnalyzedDocument, changes: &[DocumentChange]) {
    let doc = Arc::make_mut(&mut queued.document);
    for change in changes {
        change.apply(doc);
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub attempted: usize,
    pub applied: usize,
    pub unchanged: usize,
    pub removed: usize,
    pub missing: usize,
    /// Still failing; queued again.
    pub deferred: usize,
    /// Dropped because the write itself is invalid.
    pub failed: usize,
}
