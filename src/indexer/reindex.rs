//! Full rebuild of the index from the source of truth.
//!
//! The rebuild runs without holding any index lock. Writes that land while
//! it runs go to the live index and to the store's rebuild journal, and are
//! replayed onto the new index just before it is swapped in.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, bounded};
use rayon::prelude::*;
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::FieldAnalyzers;
use crate::document::{ApartmentRecord, SearchDocument};
use crate::error::{HearthError, Result};
use crate::index::{AnalyzedDocument, IndexStore, InvertedIndex};
use crate::indexer::source::ApartmentSource;

/// Summary of a finished rebuild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReindexReport {
    pub job_id: Uuid,
    /// Visible records now in the index.
    pub indexed: usize,
    /// Records left out: not visible, or invalid.
    pub skipped: usize,
    /// Writes made during the rebuild and replayed onto it.
    pub replayed: usize,
    pub pages: usize,
    pub elapsed: Duration,
}

/// Inputs of one rebuild.
pub(crate) struct Rebuild<'a> {
    pub store: &'a IndexStore,
    pub source: &'a dyn ApartmentSource,
    pub analyzers: &'a FieldAnalyzers,
    pub page_size: usize,
    pub swap_timeout: Duration,
}

impl Rebuild<'_> {
    pub(crate) fn run(&self, job_id: Uuid, cancel: &AtomicBool) -> Result<ReindexReport> {
        let started = Instant::now();
        let token = self.store.begin_rebuild()?;
        info!(%job_id, page_size = self.page_size, "reindex started");

        let mut rebuilt = InvertedIndex::new();
        let mut after = None;
        let mut pages = 0;
        let mut skipped = 0;

        loop {
            if cancel.load(Ordering::Acquire) {
                info!(%job_id, pages, "reindex cancelled, keeping the current index");
                return Err(HearthError::cancelled(format!("reindex {job_id} was cancelled")));
            }

            let page = self.source.fetch_page(after, self.page_size)?;
            let Some(last) = page.last() else {
                break;
            };
            after = Some(last.id);
            pages += 1;

            let analyzed: Vec<(u64, Result<Option<AnalyzedDocument>>)> = page
                .par_iter()
                .map(|record| (record.id, self.analyze(record)))
                .collect();

            for (id, result) in analyzed {
                match result {
                    Ok(Some(doc)) => {
                        rebuilt.insert(doc);
                    }
                    Ok(None) => skipped += 1,
                    Err(e) => {
                        warn!(%job_id, doc_id = id, error = %e, "skipping invalid record");
                        skipped += 1;
                    }
                }
            }

            if page.len() < self.page_size {
                break;
            }
        }

        if cancel.load(Ordering::Acquire) {
            info!(%job_id, pages, "reindex cancelled, keeping the current index");
            return Err(HearthError::cancelled(format!("reindex {job_id} was cancelled")));
        }

        let indexed = rebuilt.len();
        let replayed = token.swap_in(rebuilt, self.swap_timeout)?;
        let report = ReindexReport {
            job_id,
            indexed,
            skipped,
            replayed,
            pages,
            elapsed: started.elapsed(),
        };
        info!(
            %job_id,
            indexed,
            skipped,
            replayed,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "reindex finished"
        );
        Ok(report)
    }

    fn analyze(&self, record: &ApartmentRecord) -> Result<Option<AnalyzedDocument>> {
        let doc = SearchDocument::from_record(record)?;
        if !doc.is_visible() {
            return Ok(None);
        }
        AnalyzedDocument::analyze(doc, self.analyzers).map(Some)
    }
}

/// A rebuild running on a background thread.
#[derive(Debug)]
pub struct ReindexHandle {
    id: Uuid,
    cancel: Arc<AtomicBool>,
    receiver: Receiver<Result<ReindexReport>>,
    thread: Option<JoinHandle<()>>,
}

impl ReindexHandle {
    pub(crate) fn spawn<F>(job: F) -> Result<Self>
    where
        F: FnOnce(Uuid, &AtomicBool) -> Result<ReindexReport> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let cancel = Arc::new(AtomicBool::new(false));
        let (sender, receiver) = bounded(1);

        let flag = Arc::clone(&cancel);
        let thread = thread::Builder::new()
            .name(format!("hearth-reindex-{}", id.simple()))
            .spawn(move || {
                let result = job(id, &flag);
                // The handle may already be gone; nobody is waiting then.
                let _ = sender.send(result);
            })?;

        Ok(ReindexHandle {
            id,
            cancel,
            receiver,
            thread: Some(thread),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Ask the rebuild to stop at the next page boundary.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(|t| t.is_finished())
    }

    /// Block until the rebuild ends.
    pub fn wait(mut self) -> Result<ReindexReport> {
        let result = self
            .receiver
            .recv()
            .map_err(|_| HearthError::index("reindex thread exited without a result"))?;
        self.join();
        result
    }

    /// Wait at most `timeout`; the handle is returned when still running.
    pub fn wait_timeout(mut self, timeout: Duration) -> std::result::Result<Result<ReindexReport>, Self> {
        match self.receiver.recv_timeout(timeout) {
            Ok(result) => {
                self.join();
                Ok(result)
            }
            Err(RecvTimeoutError::Timeout) => Err(self),
            Err(RecvTimeoutError::Disconnected) => {
                self.join();
                Ok(Err(HearthError::index("reindex thread exited without a result")))
            }
        }
    }

    fn join(&mut self) {
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!(job_id = %self.id, "reindex thread panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ListingStatus;
    use crate::indexer::source::InMemorySource;
    use crate::util::deadline::Deadline;

    fn rebuild<'a>(
        store: &'a IndexStore,
        source: &'a InMemorySource,
        analyzers: &'a FieldAnalyzers,
    ) -> Rebuild<'a> {
        Rebuild {
            store,
            source,
            analyzers,
            page_size: 2,
            swap_timeout: Duration::from_millis(200),
        }
    }

    fn titles(store: &IndexStore) -> Vec<String> {
        let index = store.read(&Deadline::after(Duration::from_secs(1))).unwrap();
        let mut titles: Vec<String> = index.documents().map(|d| d.document.title.clone()).collect();
        titles.sort();
        titles
    }

    #[test]
    fn test_rebuild_indexes_visible_records() {
        let store = IndexStore::new();
        let analyzers = FieldAnalyzers::new();
        let mut invalid = ApartmentRecord::new(4, "Broken");
        invalid.rent_per_week = 0;
        let source = InMemorySource::from_records(vec![
            ApartmentRecord::new(1, "Alpha"),
            ApartmentRecord::new(2, "Beta"),
            ApartmentRecord::new(3, "Draft").with_status(ListingStatus::Draft),
            invalid,
            ApartmentRecord::new(5, "Gamma"),
        ]);

        let report = rebuild(&store, &source, &analyzers)
            .run(Uuid::new_v4(), &AtomicBool::new(false))
            .unwrap();
        assert_eq!(report.indexed, 3);
        assert_eq!(report.skipped, 2);
        assert_eq!(report.pages, 3);
        assert_eq!(titles(&store), vec!["Alpha", "Beta", "Gamma"]);
        assert!(!store.is_rebuilding());
    }

    #[test]
    fn test_cancelled_rebuild_keeps_index() {
        let store = IndexStore::new();
        let analyzers = FieldAnalyzers::new();
        let old = SearchDocument::from_record(&ApartmentRecord::new(9, "Old")).unwrap();
        store
            .upsert(AnalyzedDocument::analyze(old, &analyzers).unwrap(), Duration::from_millis(100))
            .unwrap();
        let source = InMemorySource::from_records(vec![ApartmentRecord::new(1, "New")]);

        let result = rebuild(&store, &source, &analyzers).run(Uuid::new_v4(), &AtomicBool::new(true));
        assert!(matches!(result, Err(HearthError::Cancelled(_))));
        assert_eq!(titles(&store), vec!["Old"]);
        assert!(!store.is_rebuilding());
    }

    #[test]
    fn test_handle_wait() {
        let handle = ReindexHandle::spawn(|id, _| {
            Ok(ReindexReport {
                job_id: id,
                indexed: 1,
                skipped: 0,
                replayed: 0,
                pages: 1,
                elapsed: Duration::ZERO,
            })
        })
        .unwrap();
        let id = handle.id();
        let report = handle.wait().unwrap();
        assert_eq!(report.job_id, id);
    }

    #[test]
    fn test_handle_cancel() {
        let handle = ReindexHandle::spawn(|id, cancel| {
            while !cancel.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
            Err(HearthError::cancelled(format!("{id}")))
        })
        .unwrap();
        let handle = handle.wait_timeout(Duration::from_millis(10)).unwrap_err();
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(matches!(handle.wait(), Err(HearthError::Cancelled(_))));
    }
}
