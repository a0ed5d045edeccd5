//! The source of truth the indexer rebuilds from.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

use crate::document::ApartmentRecord;
use crate::error::Result;

/// Read access to the authoritative apartment records.
///
/// Full scans use keyset pagination: each page holds the records with the
/// smallest ids greater than `after_id`, ascending.
pub trait ApartmentSource: Send + Sync {
    fn fetch_page(&self, after_id: Option<u64>, limit: usize) -> Result<Vec<ApartmentRecord>>;

    fn fetch(&self, id: u64) -> Result<Option<ApartmentRecord>>;
}

/// An in-process source, used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct InMemorySource {
    records: RwLock<BTreeMap<u64, ApartmentRecord>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records<I: IntoIterator<Item = ApartmentRecord>>(records: I) -> Self {
        let source = Self::new();
        {
            let mut map = source.records.write();
            for record in records {
                map.insert(record.id, record);
            }
        }
        source
    }

    /// Insert or replace a record.
    pub fn put(&self, record: ApartmentRecord) -> Option<ApartmentRecord> {
        self.records.write().insert(record.id, record)
    }

    pub fn delete(&self, id: u64) -> Option<ApartmentRecord> {
        self.records.write().remove(&id)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl ApartmentSource for InMemorySource {
    fn fetch_page(&self, after_id: Option<u64>, limit: usize) -> Result<Vec<ApartmentRecord>> {
        let lower = after_id.map_or(Bound::Unbounded, Bound::Excluded);
        Ok(self
            .records
            .read()
            .range((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect())
    }

    fn fetch(&self, id: u64) -> Result<Option<ApartmentRecord>> {
        Ok(self.records.read().get(&id).cloned())
    }
}
