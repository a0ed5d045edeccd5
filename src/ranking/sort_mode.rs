//! Sort modes callers can request.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::error::{HearthError, Result};

/// The primary ordering key of a result list.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumString,
    Display,
    AsRefStr,
    EnumIter,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum SortMode {
    /// Text score, highest first. Browse queries score 0, so they fall
    /// through to the id tie-break.
    #[default]
    Relevance,
    /// `rent_per_week` ascending.
    PriceAsc,
    /// `rent_per_week` descending.
    PriceDesc,
    /// `created_at` newest first.
    DateDesc,
    /// `created_at` oldest first.
    DateAsc,
    /// `view_count` highest first.
    ViewsDesc,
    /// Relevance; same as [`SortMode::Relevance`].
    Featured,
}

impl SortMode {
    pub fn parse(value: &str) -> Result<Self> {
        value.trim().parse().map_err(|_| {
            let expected: Vec<&'static str> = SortMode::iter().map(|m| m.into()).collect();
            HearthError::invalid_input(format!(
                "unknown sort_by `{value}` (expected one of: {})",
                expected.join(", ")
            ))
        })
    }

    /// Whether callers may turn the featured block off. Only explicit price
    /// and date orderings honour the opt-out.
    pub fn allows_featured_opt_out(&self) -> bool {
        matches!(
            self,
            SortMode::PriceAsc | SortMode::PriceDesc | SortMode::DateAsc | SortMode::DateDesc
        )
    }
}

impl TryFrom<String> for SortMode {
    type Error = HearthError;

    fn try_from(value: String) -> Result<Self> {
        SortMode::parse(&value)
    }
}

impl From<SortMode> for String {
    fn from(value: SortMode) -> String {
        value.to_string()
    }
}
