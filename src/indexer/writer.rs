//! The write side: the only component that mutates the index store.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::analysis::FieldAnalyzers;
use crate::config::IndexerConfig;
use crate::document::{ApartmentRecord, SearchDocument};
use crate::error::{HearthError, Result};
use crate::index::{AnalyzedDocument, IndexStore, StoreWrite};
use crate::indexer::event::ApartmentEvent;
use crate::indexer::locks::IdLocks;
use crate::indexer::reconcile::{DocumentChange, PendingWrite, ReconcileReport, ReconciliationQueue};
use crate::indexer::reindex::{Rebuild, ReindexHandle, ReindexReport};
use crate::indexer::retry::{Backoff, Exhausted, retry};
use crate::indexer::source::ApartmentSource;
use crate::util::deadline::Deadline;

/// What an indexer write did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WriteOutcome {
    /// The document is now searchable in its new state.
    Applied,
    /// Identical content, or an older revision than the indexed one.
    Unchanged,
    Removed,
    /// Removal of an id that was never indexed.
    Missing,
    /// The write kept failing and waits in the reconciliation queue.
    Deferred,
}

impl From<StoreWrite> for WriteOutcome {
    fn from(write: StoreWrite) -> Self {
        match write {
            StoreWrite::Applied => WriteOutcome::Applied,
            StoreWrite::Unchanged | StoreWrite::Stale => WriteOutcome::Unchanged,
            StoreWrite::Removed => WriteOutcome::Removed,
            StoreWrite::Missing => WriteOutcome::Missing,
        }
    }
}

/// Applies apartment changes to the shared [`IndexStore`].
///
/// Writes to the same id are serialized; writes to different ids run in
/// parallel. A write that keeps failing after the configured retries is
/// queued for [`Indexer::reconcile`] instead of being lost, and the caller
/// gets [`WriteOutcome::Deferred`].
pub struct Indexer {
    store: Arc<IndexStore>,
    analyzers: FieldAnalyzers,
    config: IndexerConfig,
    backoff: Backoff,
    locks: IdLocks,
    queue: ReconciliationQueue,
}

impl Indexer {
    pub fn new(store: Arc<IndexStore>, analyzers: FieldAnalyzers, config: IndexerConfig) -> Self {
        Indexer {
            backoff: Backoff::from_config(&config),
            store,
            analyzers,
            config,
            locks: IdLocks::new(),
            queue: ReconciliationQueue::new(),
        }
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Writes waiting for the next reconciliation pass.
    pub fn pending_writes(&self) -> usize {
        self.queue.len()
    }

    pub fn pending_ids(&self) -> Vec<u64> {
        self.queue.ids()
    }

    /// Index `record` as it now stands. Records that are not published and
    /// active stay in the store but are excluded from every read.
    ///
    /// An invalid record is rejected with [`HearthError::InvalidInput`];
    /// write failures never surface as errors.
    pub fn upsert(&self, record: &ApartmentRecord) -> Result<WriteOutcome> {
        let doc = SearchDocument::from_record(record)?;
        let analyzed = AnalyzedDocument::analyze(doc, &self.analyzers)?;
        self.write(PendingWrite::Upsert(analyzed))
    }

    /// Drop `id` from the index. Unknown ids are a no-op.
    pub fn remove(&self, id: u64) -> Result<WriteOutcome> {
        self.write(PendingWrite::Remove(id))
    }

    pub fn apply_event(&self, event: ApartmentEvent) -> Result<WriteOutcome> {
        let id = event.id();
        let name = event.name();
        let outcome = match event.into_record() {
            Some(record) => self.upsert(&record)?,
            None => self.remove(id)?,
        };
        debug!(doc_id = id, event = name, %outcome, "applied apartment event");
        Ok(outcome)
    }

    /// Bump the view count of an indexed document. A missing id is reported
    /// as [`WriteOutcome::Missing`]; a view that cannot be applied yet is
    /// deferred like any other write.
    pub fn record_view(&self, id: u64) -> Result<WriteOutcome> {
        self.write(PendingWrite::Modify {
            id,
            changes: vec![DocumentChange::View],
        })
    }

    /// Clear the featured flag on every document whose window ended before
    /// `now`. Ranking already ignores expired windows; this keeps the stored
    /// documents consistent with it. Returns the number of documents changed
    /// now. A document that cannot be written is deferred and the sweep
    /// moves on.
    pub fn expire_featured(&self, now: DateTime<Utc>) -> Result<usize> {
        let expired: Vec<u64> = {
            let index = self.store.read(&Deadline::after(self.config.lock_timeout()))?;
            index
                .documents()
                .filter(|analyzed| analyzed.document.featured_expired_at(now))
                .map(|analyzed| analyzed.id())
                .collect()
        };

        let mut changed = 0;
        let mut deferred = 0;
        for id in expired {
            let expire = PendingWrite::Modify {
                id,
                changes: vec![DocumentChange::ExpireFeatured(now)],
            };
            match self.write(expire) {
                Ok(WriteOutcome::Applied) => changed += 1,
                Ok(WriteOutcome::Deferred) => deferred += 1,
                Ok(_) => {}
                Err(e) => warn!(doc_id = id, error = %e, "could not expire featured listing"),
            }
        }
        if changed > 0 || deferred > 0 {
            info!(changed, deferred, "expired featured listings");
        }
        Ok(changed)
    }

    /// Re-apply every deferred write once. Writes that still fail are queued
    /// again.
    pub fn reconcile(&self) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for pending in self.queue.drain() {
            report.attempted += 1;
            let id = pending.id();
            match self.write(pending) {
                Ok(WriteOutcome::Applied) => report.applied += 1,
                Ok(WriteOutcome::Unchanged) => report.unchanged += 1,
                Ok(WriteOutcome::Removed) => report.removed += 1,
                Ok(WriteOutcome::Missing) => report.missing += 1,
                Ok(WriteOutcome::Deferred) => report.deferred += 1,
                Err(e) => {
                    warn!(doc_id = id, error = %e, "dropping unreconcilable write");
                    report.failed += 1;
                }
            }
        }
        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                applied = report.applied,
                deferred = report.deferred,
                "reconciliation pass finished"
            );
        }
        report
    }

    /// Rebuild the whole index from `source` on the calling thread.
    ///
    /// Reads keep using the current index until the rebuilt one is swapped
    /// in. Setting `cancel` stops the rebuild at the next page boundary with
    /// [`HearthError::Cancelled`], leaving the current index in place.
    pub fn reindex_all(&self, source: &dyn ApartmentSource, cancel: &AtomicBool) -> Result<ReindexReport> {
        self.rebuild(source).run(Uuid::new_v4(), cancel)
    }

    /// Rebuild the whole index from `source` on a background thread.
    pub fn spawn_reindex(&self, source: Arc<dyn ApartmentSource>) -> Result<ReindexHandle> {
        if self.store.is_rebuilding() {
            return Err(HearthError::index("a rebuild is already in progress"));
        }
        let store = Arc::clone(&self.store);
        let analyzers = self.analyzers.clone();
        let page_size = self.config.reindex_page_size;
        let swap_timeout = self.config.lock_timeout();

        ReindexHandle::spawn(move |job_id, cancel| {
            Rebuild {
                store: &store,
                source: source.as_ref(),
                analyzers: &analyzers,
                page_size,
                swap_timeout,
            }
            .run(job_id, cancel)
        })
    }

    /// Flush deferred writes and stop accepting reads and writes.
    pub fn shutdown(&self) -> ReconcileReport {
        let report = if self.store.is_closed() {
            ReconcileReport::default()
        } else {
            self.reconcile()
        };
        if !self.queue.is_empty() {
            warn!(pending = self.queue.len(), "shutting down with unapplied index writes");
        }
        self.store.close();
        report
    }

    fn rebuild<'a>(&'a self, source: &'a dyn ApartmentSource) -> Rebuild<'a> {
        Rebuild {
            store: &self.store,
            source,
            analyzers: &self.analyzers,
            page_size: self.config.reindex_page_size,
            swap_timeout: self.config.lock_timeout(),
        }
    }

    /// Apply one write under the id's lock, retrying transient failures and
    /// deferring the write once retries run out.
    fn write(&self, pending: PendingWrite) -> Result<WriteOutcome> {
        let id = pending.id();
        let timeout = self.config.lock_timeout();

        let result = retry(&self.backoff, self.config.max_retries, |_| {
            let _guard = self.locks.acquire(id, timeout)?;
            let outcome: WriteOutcome = match &pending {
                PendingWrite::Upsert(analyzed) => self.store.upsert(analyzed.clone(), timeout)?.into(),
                PendingWrite::Remove(id) => self.store.remove(*id, timeout)?.into(),
                PendingWrite::Modify { id, changes } => {
                    let outcome = self.modify(*id, changes, timeout)?;
                    self.queue.carry_changes(*id, changes);
                    outcome
                }
            };
            self.queue.discard_superseded(&pending);
            Ok(outcome)
        });

        match result {
            Ok(outcome) => Ok(outcome),
            Err(exhausted) => self.defer(pending, exhausted),
        }
    }

    fn defer(&self, pending: PendingWrite, exhausted: Exhausted) -> Result<WriteOutcome> {
        let Exhausted { error, attempts } = exhausted;
        if !error.is_retryable() {
            return Err(error);
        }
        warn!(
            doc_id = pending.id(),
            attempts,
            error = %error,
            "index write failed, queued for reconciliation"
        );
        self.queue.push(pending);
        Ok(WriteOutcome::Deferred)
    }

    /// Read-modify-write of the stored document. The caller holds the id lock.
    fn modify(&self, id: u64, changes: &[DocumentChange], timeout: Duration) -> Result<WriteOutcome> {
        let Some(current) = self.store.get(id, timeout)? else {
            return Ok(WriteOutcome::Missing);
        };
        let mut doc = SearchDocument::clone(&current);
        let changed = changes
            .iter()
            .fold(false, |changed, change| change.apply(&mut doc) | changed);
        if !changed {
            return Ok(WriteOutcome::Unchanged);
        }
        let analyzed = AnalyzedDocument::analyze(doc, &self.analyzers)?;
        Ok(self.store.upsert(analyzed, timeout)?.into())
    }
}

impl std::fmt::Debug for Indexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indexer")
            .field("config", &self.config)
            .field("pending_writes", &self.queue.len())
            .finish()
    }
}
