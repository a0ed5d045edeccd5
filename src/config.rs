//! Configuration for the search core.
//!
//! [`HearthConfig`] groups four sections, one per component family. Every
//! field has a default, so a partial JSON document only needs to name the
//! values it overrides:
//!
//! ```
//! use hearth::config::HearthConfig;
//!
//! let config = HearthConfig::from_json_str(r#"{ "gateway": { "max_limit": 50 } }"#).unwrap();
//! assert_eq!(config.gateway.max_limit, 50);
//! assert_eq!(config.gateway.default_limit, 10);
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};
use crate::query::KeywordMode;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HearthConfig {
    /// Query building and text scoring.
    pub query: QueryConfig,
    /// Autocomplete and spelling correction.
    pub suggest: SuggestConfig,
    /// Write path: retries, locking, reindexing.
    pub indexer: IndexerConfig,
    /// Read path: paging and deadlines.
    pub gateway: GatewayConfig,
}

impl HearthConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: HearthConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<()> {
        self.query.validate()?;
        self.suggest.validate()?;
        self.indexer.validate()?;
        self.gateway.validate()
    }
}

/// Relative weight of each text field in relevance scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldBoosts {
    pub title: f32,
    pub description: f32,
    pub location: f32,
    pub keywords: f32,
}

impl Default for FieldBoosts {
    fn default() -> Self {
        FieldBoosts {
            title: 3.0,
            description: 2.0,
            location: 2.0,
            keywords: 1.0,
        }
    }
}

/// How many query terms must match for a document to be a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum MinimumShouldMatch {
    /// Every term must match at least one text field.
    All,
    /// At least this many terms (clamped to the number of terms).
    AtLeast(usize),
    /// At least this percentage of terms, rounded down, never below one.
    Percent(u8),
}

impl MinimumShouldMatch {
    /// Resolve the policy against a concrete number of query terms.
    pub fn required(&self, term_count: usize) -> usize {
        if term_count == 0 {
            return 0;
        }
        match *self {
            MinimumShouldMatch::All => term_count,
            MinimumShouldMatch::AtLeast(n) => n.clamp(1, term_count),
            MinimumShouldMatch::Percent(p) => {
                let p = p.min(100) as usize;
                (term_count * p / 100).max(1)
            }
        }
    }
}

/// Query builder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub field_boosts: FieldBoosts,
    /// Leading characters that must match exactly before fuzzy edits apply.
    pub fuzzy_prefix_length: usize,
    /// Maximum dictionary terms a single fuzzy term may expand to, per field.
    pub max_expansions: usize,
    pub minimum_should_match: MinimumShouldMatch,
    /// Added to the score when the whole phrase occurs in the exact title or location.
    pub exact_phrase_boost: f32,
    /// Default combination of multiple requested keywords.
    pub keyword_mode: KeywordMode,
    /// BM25 term frequency saturation.
    pub bm25_k1: f32,
    /// BM25 length normalization.
    pub bm25_b: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        QueryConfig {
            field_boosts: FieldBoosts::default(),
            fuzzy_prefix_length: 2,
            max_expansions: 50,
            minimum_should_match: MinimumShouldMatch::All,
            exact_phrase_boost: 2.0,
            keyword_mode: KeywordMode::Any,
            bm25_k1: 1.2,
            bm25_b: 0.75,
        }
    }
}

impl QueryConfig {
    fn validate(&self) -> Result<()> {
        let boosts = self.field_boosts;
        for (name, boost) in [
            ("title", boosts.title),
            ("description", boosts.description),
            ("location", boosts.location),
            ("keywords", boosts.keywords),
        ] {
            if !boost.is_finite() || boost < 0.0 {
                return Err(HearthError::config(format!(
                    "field boost for {name} must be a non-negative number"
                )));
            }
        }
        if self.max_expansions == 0 {
            return Err(HearthError::config("max_expansions must be at least 1"));
        }
        if let MinimumShouldMatch::Percent(p) = self.minimum_should_match
            && p > 100
        {
            return Err(HearthError::config("minimum_should_match percent exceeds 100"));
        }
        if !(0.0..=1.0).contains(&self.bm25_b) || self.bm25_k1 < 0.0 {
            return Err(HearthError::config("bm25 parameters out of range"));
        }
        Ok(())
    }
}

/// Suggestion engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestConfig {
    /// Shorter autocomplete prefixes return nothing.
    pub autocomplete_min_prefix: usize,
    /// Shorter spellcheck queries return nothing.
    pub spellcheck_min_query: usize,
    /// Query words shorter than this are never corrected.
    pub spellcheck_min_word: usize,
    /// Leading characters a correction must share with the misspelled word.
    pub spellcheck_prefix_length: usize,
    pub max_corrections: usize,
    pub max_edit_distance: usize,
    /// Alternatives considered per misspelled word when composing whole-query corrections.
    pub candidates_per_word: usize,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        SuggestConfig {
            autocomplete_min_prefix: 2,
            spellcheck_min_query: 3,
            spellcheck_min_word: 3,
            spellcheck_prefix_length: 1,
            max_corrections: 5,
            max_edit_distance: 2,
            candidates_per_word: 5,
        }
    }
}

impl SuggestConfig {
    fn validate(&self) -> Result<()> {
        if self.autocomplete_min_prefix == 0 {
            return Err(HearthError::config("autocomplete_min_prefix must be at least 1"));
        }
        if self.max_corrections == 0 || self.candidates_per_word == 0 {
            return Err(HearthError::config(
                "max_corrections and candidates_per_word must be at least 1",
            ));
        }
        if self.max_edit_distance > 2 {
            return Err(HearthError::config("max_edit_distance is capped at 2"));
        }
        Ok(())
    }
}

/// Write path settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// How long a write waits for another write to the same id.
    pub lock_timeout_ms: u64,
    /// Records fetched per source page during a full reindex.
    pub reindex_page_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            max_retries: 3,
            initial_backoff_ms: 20,
            max_backoff_ms: 1000,
            lock_timeout_ms: 250,
            reindex_page_size: 500,
        }
    }
}

impl IndexerConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.max_backoff_ms < self.initial_backoff_ms {
            return Err(HearthError::config(
                "max_backoff_ms must not be smaller than initial_backoff_ms",
            ));
        }
        if self.reindex_page_size == 0 {
            return Err(HearthError::config("reindex_page_size must be at least 1"));
        }
        Ok(())
    }
}

/// Read path settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Page size used when a request asks for zero results.
    pub default_limit: usize,
    pub max_limit: usize,
    /// Deadline for search and filter when the caller sets none.
    pub read_timeout_ms: u64,
    /// Deadline for autocomplete and spellcheck when the caller sets none.
    pub autocomplete_timeout_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            default_limit: 10,
            max_limit: 100,
            read_timeout_ms: 1000,
            autocomplete_timeout_ms: 200,
        }
    }
}

impl GatewayConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn autocomplete_timeout(&self) -> Duration {
        Duration::from_millis(self.autocomplete_timeout_ms)
    }

    /// Clamp a requested page size.
    pub fn effective_limit(&self, requested: usize) -> usize {
        if requested == 0 {
            self.default_limit
        } else {
            requested.min(self.max_limit)
        }
    }

    fn validate(&self) -> Result<()> {
        if self.default_limit == 0 || self.max_limit == 0 {
            return Err(HearthError::config("page limits must be at least 1"));
        }
        if self.default_limit > self.max_limit {
            return Err(HearthError::config("default_limit exceeds max_limit"));
        }
        if self.read_timeout_ms == 0 || self.autocomplete_timeout_ms == 0 {
            return Err(HearthError::config("timeouts must be positive"));
        }
        Ok(())
    }
}
