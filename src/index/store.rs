//! The shared index store.
//!
//! Reads take the read lock with a deadline and never block each other.
//! Writes hold the write lock only long enough to apply one already
//! analyzed document. A rebuild builds a fresh [`InvertedIndex`] without any
//! lock, journals the writes that land meanwhile, then replays the journal
//! and swaps the new index in under one short write lock.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::document::SearchDocument;
use crate::error::{HearthError, Result};
use crate::index::analyzed::AnalyzedDocument;
use crate::index::inverted::InvertedIndex;
use crate::util::deadline::Deadline;

/// What a write did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreWrite {
    /// The document was inserted or replaced.
    Applied,
    /// The stored document already has identical content.
    Unchanged,
    /// The stored document is a newer revision; the write was ignored.
    Stale,
    /// The document was dropped.
    Removed,
    /// Nothing to remove.
    Missing,
}

#[derive(Debug)]
enum JournalEntry {
    Upsert(AnalyzedDocument),
    Remove(u64),
}

/// The process-wide index, shared by the indexer and all readers.
#[derive(Debug)]
pub struct IndexStore {
    index: RwLock<InvertedIndex>,
    /// `Some` while a rebuild is running.
    journal: Mutex<Option<Vec<JournalEntry>>>,
    available: AtomicBool,
    closed: AtomicBool,
    generation: AtomicU64,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::with_index(InvertedIndex::new())
    }

    pub fn with_index(index: InvertedIndex) -> Self {
        IndexStore {
            index: RwLock::new(index),
            journal: Mutex::new(None),
            available: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            generation: AtomicU64::new(0),
        }
    }

    /// Bumped by every change to the searchable state.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Take the store offline (or back online). Reads fail fast while offline.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Release);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire) && !self.is_closed()
    }

    /// Permanently stop serving.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn check_available(&self) -> Result<()> {
        if self.is_closed() {
            return Err(HearthError::unavailable("index store is closed"));
        }
        if !self.available.load(Ordering::Acquire) {
            return Err(HearthError::unavailable("index store is offline"));
        }
        Ok(())
    }

    /// Acquire the read lock before `deadline`.
    pub fn read(&self, deadline: &Deadline) -> Result<RwLockReadGuard<'_, InvertedIndex>> {
        self.check_available()?;
        let guard = match deadline.instant() {
            Some(at) => self.index.try_read_until(at),
            None => Some(self.index.read()),
        };
        guard.ok_or_else(|| HearthError::timeout("timed out waiting for the index read lock"))
    }

    fn write(&self, timeout: Duration) -> Result<RwLockWriteGuard<'_, InvertedIndex>> {
        self.check_available()?;
        self.index
            .try_write_for(timeout)
            .ok_or_else(|| HearthError::unavailable("index store is busy"))
    }

    /// The stored document for `id`, if any.
    pub fn get(&self, id: u64, timeout: Duration) -> Result<Option<Arc<SearchDocument>>> {
        self.check_available()?;
        let guard = self
            .index
            .try_read_for(timeout)
            .ok_or_else(|| HearthError::unavailable("index store is busy"))?;
        Ok(guard.get(id).cloned())
    }

    /// Insert or replace a document unless the stored one is identical or newer.
    pub fn upsert(&self, analyzed: AnalyzedDocument, timeout: Duration) -> Result<StoreWrite> {
        let mut index = self.write(timeout)?;
        let outcome = classify(&index, &analyzed);
        if outcome != StoreWrite::Applied {
            return Ok(outcome);
        }

        if let Some(journal) = self.journal.lock().as_mut() {
            journal.push(JournalEntry::Upsert(analyzed.clone()));
        }
        index.insert(analyzed);
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(StoreWrite::Applied)
    }

    /// Drop a document. A missing id is not an error.
    pub fn remove(&self, id: u64, timeout: Duration) -> Result<StoreWrite> {
        let mut index = self.write(timeout)?;

        if let Some(journal) = self.journal.lock().as_mut() {
            journal.push(JournalEntry::Remove(id));
        }
        match index.remove(id) {
            Some(_) => {
                self.generation.fetch_add(1, Ordering::AcqRel);
                Ok(StoreWrite::Removed)
            }
            None => Ok(StoreWrite::Missing),
        }
    }

    /// Start journaling writes for a rebuild. Only one rebuild may run at a time.
    pub fn begin_rebuild(&self) -> Result<RebuildToken<'_>> {
        let mut journal = self.journal.lock();
        if journal.is_some() {
            return Err(HearthError::index("a rebuild is already in progress"));
        }
        *journal = Some(Vec::new());
        Ok(RebuildToken {
            store: self,
            finished: false,
        })
    }

    pub fn is_rebuilding(&self) -> bool {
        self.journal.lock().is_some()
    }
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(index: &InvertedIndex, analyzed: &AnalyzedDocument) -> StoreWrite {
    match index.get(analyzed.id()) {
        Some(existing) if **existing == *analyzed.document => StoreWrite::Unchanged,
        Some(existing) if analyzed.document.updated_at < existing.updated_at => StoreWrite::Stale,
        _ => StoreWrite::Applied,
    }
}

/// An in-progress rebuild. Dropping it without [`RebuildToken::swap_in`]
/// abandons the rebuild and leaves the current index serving.
#[derive(Debug)]
pub struct RebuildToken<'a> {
    store: &'a IndexStore,
    finished: bool,
}

impl RebuildToken<'_> {
    /// Replay the writes journaled since the rebuild began onto `rebuilt`,
    /// then make it the live index. Returns the number of replayed writes.
    pub fn swap_in(mut self, mut rebuilt: InvertedIndex, timeout: Duration) -> Result<usize> {
        let mut live = self.store.write(timeout)?;

        let entries = self.store.journal.lock().take().unwrap_or_default();
        self.finished = true;

        let replayed = entries.len();
        for entry in entries {
            match entry {
                JournalEntry::Upsert(analyzed) => {
                    if classify(&rebuilt, &analyzed) == StoreWrite::Applied {
                        rebuilt.insert(analyzed);
                    }
                }
                JournalEntry::Remove(id) => {
                    rebuilt.remove(id);
                }
            }
        }

        *live = rebuilt;
        self.store.generation.fetch_add(1, Ordering::AcqRel);
        Ok(replayed)
    }
}

impl Drop for RebuildToken<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.store.journal.lock().take();
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;
    use crate::analysis::FieldAnalyzers;
    use crate::document::ApartmentRecord;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn analyzed(record: &ApartmentRecord) -> AnalyzedDocument {
        let doc = SearchDocument::from_record(record).unwrap();
        AnalyzedDocument::analyze(doc, &FieldAnalyzers::new()).unwrap()
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(1))
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = IndexStore::new();
        let record = ApartmentRecord::new(1, "Garden Flat");

        assert_eq!(store.upsert(analyzed(&record), TIMEOUT).unwrap(), StoreWrite::Applied);
        let generation = store.generation();
        assert_eq!(store.upsert(analyzed(&record), TIMEOUT).unwrap(), StoreWrite::Unchanged);
        assert_eq!(store.generation(), generation);
        assert_eq!(store.read(&deadline()).unwrap().len(), 1);
    }

    #[test]
    fn test_stale_revision_ignored() {
        let store = IndexStore::new();
        let newer = ApartmentRecord::new(1, "Newer title");
        let mut older = ApartmentRecord::new(1, "Older title");
        older.updated_at = Some(newer.created_at - ChronoDuration::minutes(5));

        store.upsert(analyzed(&newer), TIMEOUT).unwrap();
        assert_eq!(store.upsert(analyzed(&older), TIMEOUT).unwrap(), StoreWrite::Stale);
        let guard = store.read(&deadline()).unwrap();
        assert_eq!(guard.get(1).unwrap().title, "Newer title");
    }

    #[test]
    fn test_remove_missing() {
        let store = IndexStore::new();
        assert_eq!(store.remove(9, TIMEOUT).unwrap(), StoreWrite::Missing);
    }

    #[test]
    fn test_unavailable_and_closed() {
        let store = IndexStore::new();
        store.set_available(false);
        assert!(matches!(
            store.read(&deadline()),
            Err(HearthError::IndexUnavailable(_))
        ));
        store.set_available(true);
        assert!(store.read(&deadline()).is_ok());

        store.close();
        assert!(!store.is_available());
        assert!(matches!(
            store.upsert(analyzed(&ApartmentRecord::new(1, "x")), TIMEOUT),
            Err(HearthError::IndexUnavailable(_))
        ));
    }

    #[test]
    fn test_read_times_out_behind_writer() {
        let store = IndexStore::new();
        let _writer = store.index.write();
        let expired = Deadline::after(Duration::from_millis(5));
        assert!(matches!(store.read(&expired), Err(HearthError::Timeout(_))));
    }

    #[test]
    fn test_rebuild_replays_journal() {
        let store = IndexStore::new();
        store.upsert(analyzed(&ApartmentRecord::new(1, "Old one")), TIMEOUT).unwrap();
        store.upsert(analyzed(&ApartmentRecord::new(2, "Old two")), TIMEOUT).unwrap();

        let token = store.begin_rebuild().unwrap();
        assert!(store.begin_rebuild().is_err());

        let mut rebuilt = InvertedIndex::new();
        rebuilt.insert(analyzed(&ApartmentRecord::new(1, "Rebuilt one")));
        rebuilt.insert(analyzed(&ApartmentRecord::new(2, "Rebuilt two")));

        // Writes during the rebuild hit the live index and the journal.
        store.upsert(analyzed(&ApartmentRecord::new(3, "Written during rebuild")), TIMEOUT).unwrap();
        store.remove(2, TIMEOUT).unwrap();
        assert_eq!(store.read(&deadline()).unwrap().get(1).unwrap().title, "Old one");

        assert_eq!(token.swap_in(rebuilt, TIMEOUT).unwrap(), 2);
        assert!(!store.is_rebuilding());

        let guard = store.read(&deadline()).unwrap();
        assert_eq!(guard.get(1).unwrap().title, "Rebuilt one");
        assert!(guard.get(2).is_none());
        assert!(guard.get(3).is_some());
    }

    #[test]
    fn test_dropped_rebuild_keeps_old_index() {
        let store = IndexStore::new();
        store.upsert(analyzed(&ApartmentRecord::new(1, "Old one")), TIMEOUT).unwrap();
        {
            let _token = store.begin_rebuild().unwrap();
            store.upsert(analyzed(&ApartmentRecord::new(2, "Two")), TIMEOUT).unwrap();
        }
        assert!(!store.is_rebuilding());
        assert_eq!(store.read(&deadline()).unwrap().len(), 2);
        assert!(store.begin_rebuild().is_ok());
    }
}
