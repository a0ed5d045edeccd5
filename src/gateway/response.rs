//! Read results.

use std::sync::Arc;

use serde::Serialize;

use crate::document::SearchDocument;
use crate::ranking::{RankedHit, RankedPage};

/// One ranked listing.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub id: u64,
    /// Text score; 0 for browse and filter results.
    pub score: f32,
    /// Whether the listing was promoted at query time.
    pub featured: bool,
    pub document: Arc<SearchDocument>,
}

impl From<RankedHit> for SearchHit {
    fn from(hit: RankedHit) -> Self {
        SearchHit {
            id: hit.candidate.id,
            score: hit.candidate.score,
            featured: hit.featured,
            document: hit.candidate.document,
        }
    }
}

/// A page of results plus the size of the whole matching set.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub hits: Vec<SearchHit>,
    pub total_count: usize,
    pub skip: usize,
    pub limit: usize,
}

impl SearchPage {
    pub(crate) fn from_ranked(page: RankedPage, skip: usize, limit: usize) -> Self {
        SearchPage {
            hits: page.hits.into_iter().map(SearchHit::from).collect(),
            total_count: page.total_count,
            skip,
            limit,
        }
    }

    /// Pages of `limit` needed to cover every match.
    pub fn page_count(&self) -> usize {
        if self.limit == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.limit)
    }

    /// Whether results remain after this page.
    pub fn has_more(&self) -> bool {
        self.skip + self.hits.len() < self.total_count
    }

    pub fn ids(&self) -> Vec<u64> {
        self.hits.iter().map(|hit| hit.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(total_count: usize, skip: usize, limit: usize) -> SearchPage {
        SearchPage {
            hits: Vec::new(),
            total_count,
            skip,
            limit,
        }
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page(0, 0, 10).page_count(), 0);
        assert_eq!(page(10, 0, 10).page_count(), 1);
        assert_eq!(page(11, 0, 10).page_count(), 2);
        assert_eq!(page(11, 0, 0).page_count(), 0);
    }

    #[test]
    fn test_has_more() {
        assert!(page(5, 0, 2).has_more());
        assert!(!page(0, 0, 2).has_more());
    }
}
