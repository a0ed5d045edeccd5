//! Per-document write serialization.

use std::sync::Arc;
use std::time::Duration;

use ahash::AHashMap;
use parking_lot::{Mutex, RawMutex, lock_api::ArcMutexGuard};

use crate::error::{HearthError, Result};

/// One lock per document id, created on demand and dropped when idle.
///
/// Writes to different ids never contend beyond the short critical section
/// that looks up the id's lock.
#[derive(Debug, Default)]
pub struct IdLocks {
    locks: Mutex<AHashMap<u64, Arc<Mutex<()>>>>,
}

impl IdLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `id`, waiting at most `timeout` for a concurrent writer.
    ///
    /// Failing to get the lock in time is a [`HearthError::WriteConflict`].
    pub fn acquire(&self, id: u64, timeout: Duration) -> Result<IdGuard<'_>> {
        let lock = self.locks.lock().entry(id).or_default().clone();
        let guard = lock.try_lock_arc_for(timeout);
        drop(lock);

        match guard {
            Some(guard) => Ok(IdGuard {
                id,
                locks: self,
                guard: Some(guard),
            }),
            None => {
                self.release_if_idle(id);
                Err(HearthError::write_conflict(id))
            }
        }
    }

    /// Number of ids with a live lock.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release_if_idle(&self, id: u64) {
        let mut locks = self.locks.lock();
        // Only the map's own reference left: nobody holds or waits.
        if locks.get(&id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            locks.remove(&id);
        }
    }
}

/// Exclusive write access to one document id. Released on drop.
pub struct IdGuard<'a> {
    id: u64,
    locks: &'a IdLocks,
    guard: Option<ArcMutexGuard<RawMutex, ()>>,
}

impl IdGuard<'_> {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for IdGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGuard").field("id", &self.id).finish()
    }
}

impl Drop for IdGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks.release_if_idle(self.id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(20);

    #[test]
    fn test_same_id_conflicts() {
        let locks = IdLocks::new();
        let guard = locks.acquire(7, TIMEOUT).unwrap();
        assert_eq!(guard.id(), 7);
        assert!(matches!(
            locks.acquire(7, TIMEOUT),
            Err(HearthError::WriteConflict { id: 7 })
        ));
        // The failed attempt does not drop the held lock.
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.acquire(7, TIMEOUT).is_ok());
    }

    #[test]
    fn test_different_ids_do_not_conflict() {
        let locks = IdLocks::new();
        let _a = locks.acquire(1, TIMEOUT).unwrap();
        let _b = locks.acquire(2, TIMEOUT).unwrap();
        assert_eq!(locks.len(), 2);
    }

    #[test]
    fn test_idle_locks_are_dropped() {
        let locks = IdLocks::new();
        {
            let _guard = locks.acquire(1, TIMEOUT).unwrap();
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }

    #[test]
    fn test_waiter_gets_lock_after_release() {
        let locks = Arc::new(IdLocks::new());
        let guard = locks.acquire(3, TIMEOUT).unwrap();

        let waiter = {
            let locks = Arc::clone(&locks);
            thread::spawn(move || locks.acquire(3, Duration::from_secs(5)).map(|g| g.id()))
        };
        thread::sleep(Duration::from_millis(20));
        drop(guard);

        assert_eq!(waiter.join().unwrap().unwrap(), 3);
        assert!(locks.is_empty());
    }
}
