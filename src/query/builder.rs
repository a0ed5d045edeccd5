//! Composition of free text, filters and fuzziness into one query.

use crate::analysis::FieldAnalyzers;
use crate::config::{FieldBoosts, QueryConfig};
use crate::error::{HearthError, Result};
use crate::query::filter::{FilterRequest, FilterSet};
use crate::query::fuzziness::Fuzziness;

/// Longest free-text query accepted, in analyzed terms.
pub const MAX_QUERY_TERMS: usize = 32;

/// One analyzed query term and how loosely it may match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTerm {
    pub text: String,
    /// Edits allowed against an indexed term.
    pub max_edits: usize,
    /// Leading characters that must match exactly when `max_edits > 0`.
    pub prefix_length: usize,
}

impl QueryTerm {
    pub fn is_exact(&self) -> bool {
        self.max_edits == 0
    }
}

/// The scored half of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    /// The phrase as typed.
    pub raw: String,
    /// The phrase in exact-copy form, for the phrase bonus.
    pub phrase: String,
    /// Distinct terms in query order.
    pub terms: Vec<QueryTerm>,
    /// Terms that must match for a document to be a candidate.
    pub minimum_should_match: usize,
    pub boosts: FieldBoosts,
    pub max_expansions: usize,
    pub exact_phrase_boost: f32,
}

/// A complete query: optional scored text plus mandatory filters.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredQuery {
    pub text: Option<TextQuery>,
    pub filters: FilterSet,
}

impl StructuredQuery {
    /// Every visible document matching `filters`, unscored.
    pub fn browse(filters: FilterSet) -> Self {
        StructuredQuery {
            text: None,
            filters,
        }
    }
}

/// Builds [`StructuredQuery`] values with one analyzer setup and one
/// scoring configuration.
#[derive(Clone)]
pub struct QueryBuilder {
    config: QueryConfig,
    analyzers: FieldAnalyzers,
}

impl QueryBuilder {
    pub fn new(config: QueryConfig) -> Self {
        Self::with_analyzers(config, FieldAnalyzers::new())
    }

    pub fn with_analyzers(config: QueryConfig, analyzers: FieldAnalyzers) -> Self {
        QueryBuilder { config, analyzers }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn analyzers(&self) -> &FieldAnalyzers {
        &self.analyzers
    }

    /// Validate a caller's filter object with this builder's analyzers and
    /// default keyword mode.
    pub fn filters(&self, request: &FilterRequest) -> Result<FilterSet> {
        request.validate_with(&self.analyzers, self.config.keyword_mode)
    }

    /// Compose a query. Blank (or punctuation-only) text means browse-all,
    /// which is valid on its own and with filters.
    pub fn build(
        &self,
        free_text: Option<&str>,
        filters: FilterSet,
        fuzziness: Fuzziness,
    ) -> Result<StructuredQuery> {
        let text = match free_text.map(str::trim).filter(|t| !t.is_empty()) {
            Some(raw) => self.text_query(raw, fuzziness)?,
            None => None,
        };
        Ok(StructuredQuery { text, filters })
    }

    fn text_query(&self, raw: &str, fuzziness: Fuzziness) -> Result<Option<TextQuery>> {
        let mut terms: Vec<QueryTerm> = Vec::new();
        for text in self.analyzers.analyze_query(raw)? {
            if terms.iter().any(|t| t.text == text) {
                continue;
            }
            terms.push(QueryTerm {
                max_edits: fuzziness.max_edits(&text),
                prefix_length: self.config.fuzzy_prefix_length,
                text,
            });
        }

        if terms.is_empty() {
            return Ok(None);
        }
        if terms.len() > MAX_QUERY_TERMS {
            return Err(HearthError::invalid_input(format!(
                "query has {} terms; at most {MAX_QUERY_TERMS} are allowed",
                terms.len()
            )));
        }

        Ok(Some(TextQuery {
            raw: raw.to_string(),
            phrase: self.analyzers.normalize_exact(raw)?,
            minimum_should_match: self.config.minimum_should_match.required(terms.len()),
            terms,
            boosts: self.config.field_boosts,
            max_expansions: self.config.max_expansions,
            exact_phrase_boost: self.config.exact_phrase_boost,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MinimumShouldMatch;

    #[test]
    fn test_blank_text_is_browse_all() {
        let builder = QueryBuilder::new(QueryConfig::default());
        for text in [None, Some(""), Some("   "), Some("?!")] {
            let query = builder
                .build(text, FilterSet::visible_only(), Fuzziness::Auto)
                .unwrap();
            assert!(query.text.is_none());
        }
    }

    #[test]
    fn test_terms_get_fuzziness() {
        let builder = QueryBuilder::new(QueryConfig::default());
        let query = builder
            .build(Some("Studio in Zamalek"), FilterSet::visible_only(), Fuzziness::Auto)
            .unwrap();
        let text = query.text.unwrap();

        let edits: Vec<(&str, usize)> = text
            .terms
            .iter()
            .map(|t| (t.text.as_str(), t.max_edits))
            .collect();
        assert_eq!(edits, vec![("studio", 2), ("in", 0), ("zamalek", 2)]);
        assert_eq!(text.phrase, "studio in zamalek");
        assert_eq!(text.minimum_should_match, 3);
        assert!(text.terms.iter().all(|t| t.prefix_length == 2));
    }

    #[test]
    fn test_duplicate_terms_collapse() {
        let builder = QueryBuilder::new(QueryConfig::default());
        let query = builder
            .build(Some("big BIG flat"), FilterSet::visible_only(), Fuzziness::None)
            .unwrap();
        let text = query.text.unwrap();
        assert_eq!(text.terms.len(), 2);
        assert!(text.terms.iter().all(QueryTerm::is_exact));
    }

    #[test]
    fn test_minimum_should_match_from_config() {
        let config = QueryConfig {
            minimum_should_match: MinimumShouldMatch::AtLeast(1),
            ..Default::default()
        };
        let builder = QueryBuilder::new(config);
        let query = builder
            .build(Some("garden pool gym"), FilterSet::visible_only(), Fuzziness::Auto)
            .unwrap();
        assert_eq!(query.text.unwrap().minimum_should_match, 1);
    }

    #[test]
    fn test_overlong_query_rejected() {
        let builder = QueryBuilder::new(QueryConfig::default());
        let long: Vec<String> = (0..40).map(|i| format!("word{i}")).collect();
        let err = builder
            .build(Some(&long.join(" ")), FilterSet::visible_only(), Fuzziness::Auto)
            .unwrap_err();
        assert!(matches!(err, HearthError::InvalidInput(_)));
    }
}
