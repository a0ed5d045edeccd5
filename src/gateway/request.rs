//! Read requests, with the parameters the API layer forwards.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::{FilterRequest, Fuzziness};
use crate::ranking::SortMode;
use crate::suggest::SuggestField;
use crate::util::deadline::Deadline;

/// Free-text search with optional filters.
///
/// A `limit` of 0 asks for the configured default page size; larger limits
/// are capped. Without a `deadline` the gateway's read timeout applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub filters: FilterRequest,
    pub skip: usize,
    pub limit: usize,
    pub sort_by: SortMode,
    pub fuzziness: Fuzziness,
    pub show_featured_first: bool,
    #[serde(skip)]
    pub deadline: Option<Deadline>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchRequest {
            query: None,
            filters: FilterRequest::default(),
            skip: 0,
            limit: 0,
            sort_by: SortMode::Relevance,
            fuzziness: Fuzziness::Auto,
            show_featured_first: true,
            deadline: None,
        }
    }
}

impl SearchRequest {
    pub fn new<S: Into<String>>(query: S) -> Self {
        SearchRequest {
            query: Some(query.into()),
            ..Default::default()
        }
    }

    /// Every visible listing.
    pub fn browse() -> Self {
        Self::default()
    }

    pub fn with_filters(mut self, filters: FilterRequest) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort_by: SortMode) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_fuzziness(mut self, fuzziness: Fuzziness) -> Self {
        self.fuzziness = fuzziness;
        self
    }

    pub fn with_featured_first(mut self, show_featured_first: bool) -> Self {
        self.show_featured_first = show_featured_first;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Structured filtering without free text. Newest listings come first
/// unless another sort is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterQuery {
    pub filters: FilterRequest,
    pub skip: usize,
    pub limit: usize,
    pub sort_by: SortMode,
    pub show_featured_first: bool,
    #[serde(skip)]
    pub deadline: Option<Deadline>,
}

impl Default for FilterQuery {
    fn default() -> Self {
        FilterQuery {
            filters: FilterRequest::default(),
            skip: 0,
            limit: 0,
            sort_by: SortMode::DateDesc,
            show_featured_first: true,
            deadline: None,
        }
    }
}

impl FilterQuery {
    pub fn new(filters: FilterRequest) -> Self {
        FilterQuery {
            filters,
            ..Default::default()
        }
    }

    /// From a loosely typed JSON filter object.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Ok(Self::new(FilterRequest::from_json(value)?))
    }

    pub fn with_page(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = limit;
        self
    }

    pub fn with_sort(mut self, sort_by: SortMode) -> Self {
        self.sort_by = sort_by;
        self
    }

    pub fn with_featured_first(mut self, show_featured_first: bool) -> Self {
        self.show_featured_first = show_featured_first;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Prefix completion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteRequest {
    pub query: String,
    pub field: SuggestField,
    pub limit: usize,
    #[serde(skip)]
    pub deadline: Option<Deadline>,
}

impl AutocompleteRequest {
    pub fn new<S: Into<String>>(query: S) -> Self {
        AutocompleteRequest {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_field(mut self, field: SuggestField) -> Self {
        self.field = field;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// "Did you mean" for a whole query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellcheckRequest {
    pub query: String,
    #[serde(skip)]
    pub deadline: Option<Deadline>,
}

impl SpellcheckRequest {
    pub fn new<S: Into<String>>(query: S) -> Self {
        SpellcheckRequest {
            query: query.into(),
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_from_api_params() {
        let json = serde_json::json!({
            "query": "zamalek",
            "skip": 10,
            "limit": 5,
            "sort_by": "price_asc",
            "fuzziness": "1"
        });
        let request: SearchRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.query.as_deref(), Some("zamalek"));
        assert_eq!(request.sort_by, SortMode::PriceAsc);
        assert_eq!(request.fuzziness, Fuzziness::Edits(1));
        assert!(request.show_featured_first);
        assert_eq!(request.deadline, None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(FilterQuery::default().sort_by, SortMode::DateDesc);
        assert_eq!(SearchRequest::browse().sort_by, SortMode::Relevance);
        assert_eq!(SearchRequest::browse().query, None);
        assert_eq!(AutocompleteRequest::new("ca").field, SuggestField::All);
    }

    #[test]
    fn test_filter_query_rejects_unknown_fields() {
        let json = serde_json::json!({ "colour": "blue" });
        assert!(FilterQuery::from_json(&json).is_err());
    }
}
