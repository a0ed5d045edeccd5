//! The multi-key comparator and page selection.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::index::Candidate;
use crate::ranking::sort_mode::SortMode;

/// A candidate with its featured status fixed for one ranking pass.
#[derive(Debug, Clone)]
pub struct RankedHit {
    pub candidate: Candidate,
    /// Featured at ranking time. An expired window is not featured.
    pub featured: bool,
}

/// One page of an ordered result set.
#[derive(Debug, Clone)]
pub struct RankedPage {
    pub hits: Vec<RankedHit>,
    /// Size of the whole ordered set, not of the page.
    pub total_count: usize,
}

/// Orders candidates. Holds no state; the settings of a call fully
/// determine its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingPolicy {
    pub sort: SortMode,
    pub show_featured_first: bool,
}

impl RankingPolicy {
    pub fn new(sort: SortMode, show_featured_first: bool) -> Self {
        RankingPolicy {
            sort,
            show_featured_first,
        }
    }

    fn featured_block(&self) -> bool {
        self.show_featured_first || !self.sort.allows_featured_opt_out()
    }

    /// Total order: featured block, primary key, id ascending.
    pub fn compare(&self, a: &RankedHit, b: &RankedHit) -> Ordering {
        let featured = if self.featured_block() {
            b.featured.cmp(&a.featured).then_with(|| {
                if a.featured && b.featured {
                    b.candidate
                        .document
                        .featured_priority
                        .cmp(&a.candidate.document.featured_priority)
                } else {
                    Ordering::Equal
                }
            })
        } else {
            Ordering::Equal
        };

        featured
            .then_with(|| self.compare_primary(a, b))
            .then_with(|| a.candidate.id.cmp(&b.candidate.id))
    }

    fn compare_primary(&self, a: &RankedHit, b: &RankedHit) -> Ordering {
        let (da, db) = (&a.candidate.document, &b.candidate.document);
        match self.sort {
            SortMode::Relevance | SortMode::Featured => {
                b.candidate.score.total_cmp(&a.candidate.score)
            }
            SortMode::PriceAsc => da.rent_per_week.cmp(&db.rent_per_week),
            SortMode::PriceDesc => db.rent_per_week.cmp(&da.rent_per_week),
            SortMode::DateDesc => db.created_at.cmp(&da.created_at),
            SortMode::DateAsc => da.created_at.cmp(&db.created_at),
            SortMode::ViewsDesc => db.view_count.cmp(&da.view_count),
        }
    }

    fn prepare(candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<RankedHit> {
        candidates
            .into_iter()
            .map(|candidate| RankedHit {
                featured: candidate.document.is_featured_at(now),
                candidate,
            })
            .collect()
    }

    /// Order every candidate.
    pub fn rank(&self, candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<RankedHit> {
        let mut hits = Self::prepare(candidates, now);
        hits.sort_unstable_by(|a, b| self.compare(a, b));
        hits
    }

    /// The `limit` hits after the first `skip` of the full order, without
    /// sorting past the end of the page.
    pub fn page(
        &self,
        candidates: Vec<Candidate>,
        now: DateTime<Utc>,
        skip: usize,
        limit: usize,
    ) -> RankedPage {
        let total_count = candidates.len();
        let end = skip.saturating_add(limit).min(total_count);
        if skip >= end {
            return RankedPage {
                hits: Vec::new(),
                total_count,
            };
        }

        let mut hits = Self::prepare(candidates, now);
        if end < hits.len() {
            hits.select_nth_unstable_by(end - 1, |a, b| self.compare(a, b));
            hits.truncate(end);
        }
        hits.sort_unstable_by(|a, b| self.compare(a, b));
        hits.drain(..skip);

        RankedPage { hits, total_count }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::document::{ApartmentRecord, SearchDocument};

    fn candidate(record: ApartmentRecord, score: f32) -> Candidate {
        let document = Arc::new(SearchDocument::from_record(&record).unwrap());
        Candidate {
            id: document.id,
            score,
            document,
        }
    }

    fn ids(hits: &[RankedHit]) -> Vec<u64> {
        hits.iter().map(|h| h.candidate.id).collect()
    }

    fn sample(now: DateTime<Utc>) -> Vec<Candidate> {
        vec![
            candidate(ApartmentRecord::new(1, "a").with_rent(900), 1.0),
            candidate(ApartmentRecord::new(2, "b").with_rent(300), 3.0),
            candidate(
                ApartmentRecord::new(3, "c")
                    .with_rent(500)
                    .with_featured(1, Some(now + Duration::days(3))),
                0.5,
            ),
            candidate(
                ApartmentRecord::new(4, "d")
                    .with_rent(100)
                    .with_featured(9, Some(now - Duration::days(1))),
                2.0,
            ),
            candidate(ApartmentRecord::new(5, "e").with_rent(700).with_featured(5, None), 0.1),
        ]
    }

    #[test]
    fn test_featured_first_by_priority() {
        let now = Utc::now();
        let policy = RankingPolicy::new(SortMode::Relevance, true);
        let ranked = policy.rank(sample(now), now);
        assert_eq!(ids(&ranked), vec![5, 3, 2, 4, 1]);
        assert!(ranked[0].featured);
        // Expired window: no boost.
        assert!(!ranked[3].featured);
    }

    #[test]
    fn test_featured_first_regardless_of_sort() {
        let now = Utc::now();
        let policy = RankingPolicy::new(SortMode::PriceAsc, true);
        assert_eq!(ids(&policy.rank(sample(now), now)), vec![5, 3, 4, 2, 1]);
    }

    #[test]
    fn test_opt_out_of_featured_block() {
        let now = Utc::now();
        let policy = RankingPolicy::new(SortMode::PriceAsc, false);
        assert_eq!(ids(&policy.rank(sample(now), now)), vec![4, 2, 3, 5, 1]);
    }

    #[test]
    fn test_opt_out_ignored_outside_price_and_date() {
        let now = Utc::now();
        for sort in [SortMode::Relevance, SortMode::Featured, SortMode::ViewsDesc] {
            let policy = RankingPolicy::new(sort, false);
            let ranked = policy.rank(sample(now), now);
            assert_eq!(&ids(&ranked)[..2], &[5, 3], "{sort}");
        }
    }

    #[test]
    fn test_equal_priority_falls_through_to_primary_key() {
        let now = Utc::now();
        let candidates = vec![
            candidate(ApartmentRecord::new(7, "x").with_rent(800).with_featured(2, None), 0.0),
            candidate(ApartmentRecord::new(6, "y").with_rent(200).with_featured(2, None), 0.0),
        ];
        let policy = RankingPolicy::new(SortMode::PriceDesc, true);
        assert_eq!(ids(&policy.rank(candidates, now)), vec![7, 6]);
    }

    #[test]
    fn test_ties_break_by_id() {
        let now = Utc::now();
        let created = now - Duration::days(2);
        let candidates: Vec<Candidate> = [9, 3, 6]
            .into_iter()
            .map(|id| candidate(ApartmentRecord::new(id, "same").with_created_at(created), 1.0))
            .collect();
        let policy = RankingPolicy::new(SortMode::DateDesc, true);
        assert_eq!(ids(&policy.rank(candidates, now)), vec![3, 6, 9]);
    }

    #[test]
    fn test_date_and_views() {
        let now = Utc::now();
        let mut popular = ApartmentRecord::new(1, "old").with_created_at(now - Duration::days(10));
        popular.view_count = 50;
        let fresh = ApartmentRecord::new(2, "new").with_created_at(now - Duration::days(1));
        let candidates = vec![candidate(popular, 0.0), candidate(fresh, 0.0)];

        let by_date = RankingPolicy::new(SortMode::DateDesc, true);
        assert_eq!(ids(&by_date.rank(candidates.clone(), now)), vec![2, 1]);
        let oldest = RankingPolicy::new(SortMode::DateAsc, true);
        assert_eq!(ids(&oldest.rank(candidates.clone(), now)), vec![1, 2]);
        let by_views = RankingPolicy::new(SortMode::ViewsDesc, true);
        assert_eq!(ids(&by_views.rank(candidates, now)), vec![1, 2]);
    }

    #[test]
    fn test_pages_concatenate_to_full_order() {
        let now = Utc::now();
        let candidates: Vec<Candidate> = (1..=25)
            .map(|id| candidate(ApartmentRecord::new(id, "t"), (id % 4) as f32))
            .collect();
        let policy = RankingPolicy::new(SortMode::Relevance, true);

        let full = ids(&policy.page(candidates.clone(), now, 0, 20).hits);
        let first = policy.page(candidates.clone(), now, 0, 10);
        let second = policy.page(candidates.clone(), now, 10, 10);
        assert_eq!(first.total_count, 25);

        let mut joined = ids(&first.hits);
        joined.extend(ids(&second.hits));
        assert_eq!(joined, full);
        assert_eq!(full, ids(&policy.rank(candidates, now))[..20].to_vec());
    }

    #[test]
    fn test_page_past_the_end() {
        let now = Utc::now();
        let candidates = vec![candidate(ApartmentRecord::new(1, "t"), 0.0)];
        let policy = RankingPolicy::new(SortMode::Relevance, true);
        let page = policy.page(candidates.clone(), now, 5, 10);
        assert!(page.hits.is_empty());
        assert_eq!(page.total_count, 1);
        assert!(policy.page(candidates, now, 0, 0).hits.is_empty());
    }
}
