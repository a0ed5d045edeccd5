//! The search gateway.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::analysis::FieldAnalyzers;
use crate::config::HearthConfig;
use crate::document::SearchDocument;
use crate::error::{HearthError, Result};
use crate::gateway::request::{AutocompleteRequest, FilterQuery, SearchRequest, SpellcheckRequest};
use crate::gateway::response::SearchPage;
use crate::index::{Bm25, IndexSearcher, IndexStats, IndexStore};
use crate::indexer::{Indexer, ReconcileReport};
use crate::query::{Fuzziness, QueryBuilder, StructuredQuery};
use crate::ranking::RankingPolicy;
use crate::suggest::{Autocompleter, GroupedSuggestions, SpellChecker, Suggestions};
use crate::util::deadline::Deadline;

/// Entry point of the search core.
///
/// Reads run concurrently against the shared [`IndexStore`] and never
/// modify it. Writes go through [`SearchGateway::indexer`].
///
/// ```
/// use hearth::document::ApartmentRecord;
/// use hearth::gateway::{SearchGateway, SearchRequest};
/// use hearth::config::HearthConfig;
///
/// let gateway = SearchGateway::new(HearthConfig::default()).unwrap();
/// let record = ApartmentRecord::new(1, "Spacious 2BHK in Zamalek")
///     .with_location("Zamalek")
///     .with_rent(700);
/// gateway.indexer().upsert(&record).unwrap();
///
/// let page = gateway.search(&SearchRequest::new("zanalek")).unwrap();
/// assert_eq!(page.ids(), vec![1]);
/// ```
pub struct SearchGateway {
    config: HearthConfig,
    store: Arc<IndexStore>,
    indexer: Indexer,
    builder: QueryBuilder,
    bm25: Bm25,
}

impl SearchGateway {
    /// Validate `config` and start with an empty index.
    pub fn new(config: HearthConfig) -> Result<Self> {
        Self::with_store(config, Arc::new(IndexStore::new()))
    }

    /// Serve an existing store.
    pub fn with_store(config: HearthConfig, store: Arc<IndexStore>) -> Result<Self> {
        config.validate()?;
        let analyzers = FieldAnalyzers::new();
        let indexer = Indexer::new(Arc::clone(&store), analyzers.clone(), config.indexer.clone());
        let builder = QueryBuilder::with_analyzers(config.query.clone(), analyzers);
        let bm25 = Bm25::new(config.query.bm25_k1, config.query.bm25_b);

        Ok(SearchGateway {
            config,
            store,
            indexer,
            builder,
            bm25,
        })
    }

    pub fn config(&self) -> &HearthConfig {
        &self.config
    }

    /// The write hooks: upserts, removals, events, reindexing.
    pub fn indexer(&self) -> &Indexer {
        &self.indexer
    }

    pub fn store(&self) -> &Arc<IndexStore> {
        &self.store
    }

    /// Free-text search, ranked by `sort_by` with featured listings first
    /// unless the caller opts out.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let deadline = self.read_deadline(request.deadline);
        let filters = self.builder.filters(&request.filters)?;
        let query = self
            .builder
            .build(request.query.as_deref(), filters, request.fuzziness)?;
        let policy = RankingPolicy::new(request.sort_by, request.show_featured_first);
        self.execute("search", &query, policy, request.skip, request.limit, &deadline)
    }

    /// Structured filtering only; no text scoring.
    pub fn filter(&self, request: &FilterQuery) -> Result<SearchPage> {
        let deadline = self.read_deadline(request.deadline);
        let filters = self.builder.filters(&request.filters)?;
        let query = self.builder.build(None, filters, Fuzziness::None)?;
        let policy = RankingPolicy::new(request.sort_by, request.show_featured_first);
        self.execute("filter", &query, policy, request.skip, request.limit, &deadline)
    }

    /// Completions of a partially typed word.
    pub fn autocomplete(&self, request: &AutocompleteRequest) -> Result<Suggestions> {
        let deadline = self.suggest_deadline(request.deadline);
        let limit = self.config.gateway.effective_limit(request.limit);
        self.observe("autocomplete", || {
            let index = self.store.read(&deadline)?;
            Autocompleter::new(&index, &self.config.suggest).suggest(
                &request.query,
                request.field,
                limit,
                &deadline,
            )
        })
    }

    /// Title, location and keyword completions as separate lists.
    pub fn autocomplete_grouped(&self, request: &AutocompleteRequest) -> Result<GroupedSuggestions> {
        let deadline = self.suggest_deadline(request.deadline);
        let limit = self.config.gateway.effective_limit(request.limit);
        self.observe("autocomplete", || {
            let index = self.store.read(&deadline)?;
            Autocompleter::new(&index, &self.config.suggest).suggest_grouped(
                &request.query,
                limit,
                &deadline,
            )
        })
    }

    /// "Did you mean" suggestions for a whole query.
    pub fn spellcheck(&self, request: &SpellcheckRequest) -> Result<Suggestions> {
        let deadline = self.suggest_deadline(request.deadline);
        self.observe("spellcheck", || {
            let index = self.store.read(&deadline)?;
            SpellChecker::new(&index, &self.config.suggest, self.builder.analyzers())
                .correct(&request.query, &deadline)
        })
    }

    /// The indexed document for `id`, visible or not.
    pub fn document(&self, id: u64) -> Result<Option<Arc<SearchDocument>>> {
        let deadline = self.read_deadline(None);
        Ok(self.store.read(&deadline)?.get(id).cloned())
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let deadline = self.read_deadline(None);
        Ok(self.store.read(&deadline)?.stats())
    }

    /// Flush deferred writes and close the store. Later reads fail with
    /// [`HearthError::IndexUnavailable`].
    pub fn shutdown(&self) -> ReconcileReport {
        self.indexer.shutdown()
    }

    fn read_deadline(&self, deadline: Option<Deadline>) -> Deadline {
        deadline.unwrap_or_else(|| Deadline::after(self.config.gateway.read_timeout()))
    }

    fn suggest_deadline(&self, deadline: Option<Deadline>) -> Deadline {
        deadline.unwrap_or_else(|| Deadline::after(self.config.gateway.autocomplete_timeout()))
    }

    fn execute(
        &self,
        operation: &'static str,
        query: &StructuredQuery,
        policy: RankingPolicy,
        skip: usize,
        limit: usize,
        deadline: &Deadline,
    ) -> Result<SearchPage> {
        let limit = self.config.gateway.effective_limit(limit);
        self.observe(operation, || {
            let candidates = {
                let index = self.store.read(deadline)?;
                IndexSearcher::new(&index, self.bm25).search(query, deadline)?
            };
            let page = policy.page(candidates, Utc::now(), skip, limit);
            deadline.check(operation)?;
            Ok(SearchPage::from_ranked(page, skip, limit))
        })
    }

    fn observe<T, F>(&self, operation: &'static str, read: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        read().inspect_err(|e| {
            if matches!(e, HearthError::Timeout(_) | HearthError::IndexUnavailable(_)) {
                debug!(operation, error = %e, "read failed");
            }
        })
    }
}

impl std::fmt::Debug for SearchGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchGateway")
            .field("config", &self.config)
            .field("indexer", &self.indexer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use serde_json::json;

    use super::*;
    use crate::document::{ApartmentRecord, ApartmentType, ListingStatus};
    use crate::query::FilterRequest;
    use crate::ranking::SortMode;
    use crate::suggest::SuggestField;

    fn gateway() -> SearchGateway {
        let gateway = SearchGateway::new(HearthConfig::default()).unwrap();
        let records = vec![
            ApartmentRecord::new(1, "Spacious 2BHK in Zamalek")
                .with_location("Zamalek")
                .with_type(ApartmentType::TwoBhk)
                .with_rent(700),
            ApartmentRecord::new(2, "Studio near the Nile")
                .with_location("Maadi")
                .with_rent(300),
            ApartmentRecord::new(3, "Hidden draft")
                .with_location("Zamalek")
                .with_status(ListingStatus::Draft),
        ];
        for record in &records {
            gateway.indexer().upsert(record).unwrap();
        }
        gateway
    }

    #[test]
    fn test_search_with_typo() {
        let gateway = gateway();
        assert_eq!(gateway.search(&SearchRequest::new("zamalek")).unwrap().ids(), vec![1]);
        let page = gateway
            .search(&SearchRequest::new("zanalek").with_fuzziness(Fuzziness::Auto))
            .unwrap();
        assert_eq!(page.ids(), vec![1]);
        assert_eq!(page.total_count, 1);
    }

    #[test]
    fn test_filter_by_type_and_price() {
        let gateway = gateway();
        let filters = FilterRequest::from_json(&json!({
            "apartment_type": "2bhk",
            "min_price": 600,
            "max_price": 800
        }))
        .unwrap();
        assert_eq!(gateway.filter(&FilterQuery::new(filters)).unwrap().ids(), vec![1]);
    }

    #[test]
    fn test_browse_excludes_hidden() {
        let gateway = gateway();
        let page = gateway.search(&SearchRequest::browse().with_sort(SortMode::PriceAsc)).unwrap();
        assert_eq!(page.ids(), vec![2, 1]);
    }

    #[test]
    fn test_invalid_filter() {
        let gateway = gateway();
        let filters = FilterRequest {
            min_price: Some(900),
            max_price: Some(100),
            ..Default::default()
        };
        assert!(matches!(
            gateway.filter(&FilterQuery::new(filters)),
            Err(HearthError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_suggestions() {
        let gateway = gateway();
        let completions = gateway
            .autocomplete(&AutocompleteRequest::new("za").with_field(SuggestField::Location))
            .unwrap();
        assert_eq!(completions.items, vec!["zamalek"]);
        assert!(gateway.autocomplete(&AutocompleteRequest::new("z")).unwrap().is_empty());

        let corrections = gateway.spellcheck(&SpellcheckRequest::new("zamalik")).unwrap();
        assert_eq!(corrections.items, vec!["zamalek"]);
        assert!(gateway.spellcheck(&SpellcheckRequest::new("za")).unwrap().is_empty());
    }

    #[test]
    fn test_expired_deadline_is_timeout() {
        let gateway = gateway();
        let expired = Deadline::at(Instant::now() - Duration::from_millis(1));
        let request = SearchRequest::new("zamalek").with_deadline(expired);
        assert!(matches!(gateway.search(&request), Err(HearthError::Timeout(_))));
    }

    #[test]
    fn test_expired_deadline_stops_suggestions() {
        let gateway = gateway();
        let expired = Deadline::at(Instant::now() - Duration::from_millis(1));
        let completions = AutocompleteRequest::new("za")
            .with_field(SuggestField::Location)
            .with_deadline(expired);
        assert!(matches!(gateway.autocomplete(&completions), Err(HearthError::Timeout(_))));
        assert!(matches!(
            gateway.autocomplete_grouped(&AutocompleteRequest::new("za").with_deadline(expired)),
            Err(HearthError::Timeout(_))
        ));
        let corrections = SpellcheckRequest::new("zamalik").with_deadline(expired);
        assert!(matches!(gateway.spellcheck(&corrections), Err(HearthError::Timeout(_))));
    }

    #[test]
    fn test_huge_timeouts_never_expire() {
        let mut config = HearthConfig::default();
        config.gateway.read_timeout_ms = u64::MAX;
        config.gateway.autocomplete_timeout_ms = u64::MAX;
        config.indexer.lock_timeout_ms = u64::MAX;
        let gateway = SearchGateway::new(config).unwrap();
        gateway
            .indexer()
            .upsert(&ApartmentRecord::new(1, "Spacious 2BHK in Zamalek").with_location("Zamalek"))
            .unwrap();

        assert_eq!(gateway.search(&SearchRequest::new("zamalek")).unwrap().ids(), vec![1]);
        let completions = gateway
            .autocomplete(&AutocompleteRequest::new("za").with_field(SuggestField::Location))
            .unwrap();
        assert_eq!(completions.items, vec!["zamalek"]);
        let corrections = gateway.spellcheck(&SpellcheckRequest::new("zamalik")).unwrap();
        assert_eq!(corrections.items, vec!["zamalek"]);
    }

    #[test]
    fn test_reads_after_shutdown() {
        let gateway = gateway();
        gateway.shutdown();
        assert!(matches!(
            gateway.search(&SearchRequest::browse()),
            Err(HearthError::IndexUnavailable(_))
        ));
        assert!(matches!(
            gateway.spellcheck(&SpellcheckRequest::new("zamalik")),
            Err(HearthError::IndexUnavailable(_))
        ));
    }

    #[test]
    fn test_stats() {
        let stats = gateway().stats().unwrap();
        assert_eq!(stats.documents, 3);
        assert_eq!(stats.visible_documents, 2);
    }
}
