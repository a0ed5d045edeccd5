//! Structured, non-scoring filters.
//!
//! Callers send a loosely typed filter object; [`FilterRequest`] is its
//! closed shape (unknown fields are rejected) and [`FilterRequest::validate`]
//! turns it into a [`FilterSet`] of typed [`Filter`] clauses.
//!
//! ```
//! use hearth::query::{Filter, FilterRequest};
//! use serde_json::json;
//!
//! let request = FilterRequest::from_json(&json!({
//!     "apartment_type": "2bhk",
//!     "min_price": 600,
//!     "max_price": 800
//! }))
//! .unwrap();
//! let filters = request.validate().unwrap();
//! assert!(matches!(filters.iter().next(), Some(Filter::Visible)));
//! assert_eq!(filters.len(), 3);
//! ```

use std::fmt::Debug;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use crate::analysis::FieldAnalyzers;
use crate::document::{
    ApartmentType, FurnishingType, GenderPreference, ParkingType, SearchDocument, parse_date,
};
use crate::error::{HearthError, Result};
use crate::index::ExactFields;

/// How several requested keywords combine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    /// A listing matches when it has at least one of the keywords.
    #[default]
    Any,
    /// A listing must have every keyword.
    All,
}

/// A bound for range filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound<T> {
    /// Inclusive bound.
    Included(T),
    /// Exclusive bound.
    Excluded(T),
    /// Unbounded (no limit).
    Unbounded,
}

impl<T: PartialOrd> Bound<T> {
    /// Check if a value satisfies this bound as a lower bound.
    pub fn contains_lower(&self, value: &T) -> bool {
        match self {
            Bound::Included(bound) => value >= bound,
            Bound::Excluded(bound) => value > bound,
            Bound::Unbounded => true,
        }
    }

    /// Check if a value satisfies this bound as an upper bound.
    pub fn contains_upper(&self, value: &T) -> bool {
        match self {
            Bound::Included(bound) => value <= bound,
            Bound::Excluded(bound) => value < bound,
            Bound::Unbounded => true,
        }
    }

    fn value(&self) -> Option<&T> {
        match self {
            Bound::Included(v) | Bound::Excluded(v) => Some(v),
            Bound::Unbounded => None,
        }
    }
}

impl<T> From<Option<T>> for Bound<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Bound::Unbounded, Bound::Included)
    }
}

/// A possibly open-ended range over an ordered field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeFilter<T> {
    pub lower: Bound<T>,
    pub upper: Bound<T>,
}

impl<T: PartialOrd + Debug> RangeFilter<T> {
    pub fn new(lower: Bound<T>, upper: Bound<T>) -> Self {
        RangeFilter { lower, upper }
    }

    /// An inclusive range from optional ends. `None` when both ends are
    /// open; `InvalidInput` when `min > max`.
    pub fn inclusive(name: &str, min: Option<T>, max: Option<T>) -> Result<Option<Self>> {
        if min.is_none() && max.is_none() {
            return Ok(None);
        }
        let range = RangeFilter::new(Bound::from(min), Bound::from(max));
        if let (Some(lo), Some(hi)) = (range.lower.value(), range.upper.value())
            && lo > hi
        {
            return Err(HearthError::invalid_input(format!(
                "{name} range is empty: minimum {lo:?} exceeds maximum {hi:?}"
            )));
        }
        Ok(Some(range))
    }

    pub fn contains(&self, value: &T) -> bool {
        self.lower.contains_lower(value) && self.upper.contains_upper(value)
    }
}

/// One mandatory, non-scoring clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `status == published && is_active`. Always present.
    Visible,
    /// Every term must occur in the listing's location.
    Location(Vec<String>),
    ApartmentType(ApartmentType),
    Price(RangeFilter<u32>),
    Furnishing(FurnishingType),
    Parking(ParkingType),
    BathroomSolo(bool),
    PlaceAccept(GenderPreference),
    StartDate(RangeFilter<NaiveDate>),
    /// A listing without a duration never satisfies a duration range.
    Duration(RangeFilter<u32>),
    /// Case-insensitive exact keyword match.
    Keywords {
        keywords: Vec<String>,
        mode: KeywordMode,
    },
}

impl Filter {
    pub fn matches(&self, doc: &SearchDocument, exact: &ExactFields) -> bool {
        match self {
            Filter::Visible => doc.is_visible(),
            Filter::Location(terms) => terms
                .iter()
                .all(|term| exact.location.split(' ').any(|t| t == term)),
            Filter::ApartmentType(t) => doc.apartment_type == *t,
            Filter::Price(range) => range.contains(&doc.rent_per_week),
            Filter::Furnishing(f) => doc.furnishing_type == *f,
            Filter::Parking(p) => doc.parking_type == *p,
            Filter::BathroomSolo(b) => doc.is_bathroom_solo == *b,
            Filter::PlaceAccept(g) => doc.gender_preference == *g,
            Filter::StartDate(range) => range.contains(&doc.start_date),
            Filter::Duration(range) => doc.duration_weeks.is_some_and(|d| range.contains(&d)),
            Filter::Keywords { keywords, mode } => {
                let has = |kw: &String| exact.keywords.iter().any(|k| k == kw);
                match mode {
                    KeywordMode::Any => keywords.iter().any(has),
                    KeywordMode::All => keywords.iter().all(has),
                }
            }
        }
    }
}

/// The validated filters of one query. Always starts with [`Filter::Visible`].
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    /// Only the visibility rule: browse everything public.
    pub fn visible_only() -> Self {
        FilterSet {
            filters: vec![Filter::Visible],
        }
    }

    /// Add a clause. A second [`Filter::Visible`] is ignored.
    pub fn push(&mut self, filter: Filter) {
        if filter == Filter::Visible {
            return;
        }
        self.filters.push(filter);
    }

    pub fn matches(&self, doc: &SearchDocument, exact: &ExactFields) -> bool {
        self.filters.iter().all(|f| f.matches(doc, exact))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Always false: the visibility clause is never absent.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterSet {
    fn default() -> Self {
        Self::visible_only()
    }
}

/// The filter object callers send, before validation.
///
/// Empty strings count as absent. The older field names `rent_per_week`
/// (an upper price bound), `start_date`, `duration_len` and
/// `is_pathroom_solo` are accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterRequest {
    pub location: Option<String>,
    pub apartment_type: Option<String>,
    pub min_price: Option<u32>,
    #[serde(alias = "rent_per_week")]
    pub max_price: Option<u32>,
    pub furnishing_type: Option<String>,
    pub parking_type: Option<String>,
    #[serde(alias = "is_pathroom_solo")]
    pub is_bathroom_solo: Option<bool>,
    pub place_accept: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date_from: Option<String>,
    pub start_date_to: Option<String>,
    #[serde(alias = "duration_len")]
    pub min_duration_weeks: Option<u32>,
    pub max_duration_weeks: Option<u32>,
    #[serde(deserialize_with = "deserialize_keyword_list")]
    pub keywords: Vec<String>,
    pub keywords_mode: Option<KeywordMode>,
}

impl FilterRequest {
    /// Decode a JSON filter object. Unknown fields and wrong types are
    /// [`HearthError::InvalidInput`].
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        FilterRequest::deserialize(value)
            .map_err(|e| HearthError::invalid_input(format!("invalid filter: {e}")))
    }

    /// Validate with the default analyzers and keyword mode.
    pub fn validate(&self) -> Result<FilterSet> {
        self.validate_with(&FieldAnalyzers::new(), KeywordMode::default())
    }

    /// Validate into typed clauses. `default_mode` applies when the request
    /// does not name a keyword mode.
    pub fn validate_with(
        &self,
        analyzers: &FieldAnalyzers,
        default_mode: KeywordMode,
    ) -> Result<FilterSet> {
        let mut set = FilterSet::visible_only();

        if let Some(location) = present(&self.location) {
            let terms = analyzers.analyze_query(location)?;
            if terms.is_empty() {
                return Err(HearthError::invalid_input(format!(
                    "location filter `{location}` has no searchable words"
                )));
            }
            set.push(Filter::Location(terms));
        }
        if let Some(value) = present(&self.apartment_type) {
            set.push(Filter::ApartmentType(ApartmentType::parse(value)?));
        }
        if let Some(range) = RangeFilter::inclusive("price", self.min_price, self.max_price)? {
            set.push(Filter::Price(range));
        }
        if let Some(value) = present(&self.furnishing_type) {
            set.push(Filter::Furnishing(FurnishingType::parse(value)?));
        }
        if let Some(value) = present(&self.parking_type) {
            set.push(Filter::Parking(ParkingType::parse(value)?));
        }
        if let Some(solo) = self.is_bathroom_solo {
            set.push(Filter::BathroomSolo(solo));
        }
        if let Some(value) = present(&self.place_accept) {
            set.push(Filter::PlaceAccept(GenderPreference::parse(value)?));
        }

        let from = present(&self.start_date_from).map(parse_date).transpose()?;
        let to = present(&self.start_date_to).map(parse_date).transpose()?;
        if let Some(range) = RangeFilter::inclusive("start_date", from, to)? {
            set.push(Filter::StartDate(range));
        }
        if let Some(range) = RangeFilter::inclusive(
            "duration_weeks",
            self.min_duration_weeks,
            self.max_duration_weeks,
        )? {
            set.push(Filter::Duration(range));
        }

        let mut keywords = Vec::new();
        for raw in self.keywords.iter().flat_map(|k| k.split(',')) {
            if let Some(keyword) = analyzers.normalize_keyword(raw)?
                && !keywords.contains(&keyword)
            {
                keywords.push(keyword);
            }
        }
        if !keywords.is_empty() {
            set.push(Filter::Keywords {
                keywords,
                mode: self.keywords_mode.unwrap_or(default_mode),
            });
        }

        Ok(set)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn deserialize_keyword_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawKeywords {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<RawKeywords>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawKeywords::List(list)) => list,
        Some(RawKeywords::Joined(joined)) => vec![joined],
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::ApartmentRecord;

    fn doc_and_exact(record: ApartmentRecord) -> (SearchDocument, ExactFields) {
        let doc = SearchDocument::from_record(&record).unwrap();
        let exact = ExactFields::from_document(&doc, &FieldAnalyzers::new()).unwrap();
        (doc, exact)
    }

    fn zamalek() -> ApartmentRecord {
        ApartmentRecord::new(1, "Spacious 2BHK in Zamalek")
            .with_location("Zamalek, Cairo")
            .with_type(ApartmentType::TwoBhk)
            .with_rent(700)
            .with_keywords(["Balcony", "Nile View"])
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let range = RangeFilter::inclusive("price", Some(500u32), Some(1000)).unwrap().unwrap();
        assert!(range.contains(&500));
        assert!(range.contains(&1000));
        assert!(!range.contains(&499));
        assert!(!range.contains(&1001));
    }

    #[test]
    fn test_open_ended_ranges() {
        let min_only = RangeFilter::inclusive("price", Some(500u32), None).unwrap().unwrap();
        assert!(min_only.contains(&u32::MAX));
        let max_only = RangeFilter::inclusive("price", None, Some(500u32)).unwrap().unwrap();
        assert!(max_only.contains(&0));
        assert!(RangeFilter::<u32>::inclusive("price", None, None).unwrap().is_none());
    }

    #[test]
    fn test_inverted_range_is_invalid() {
        let request = FilterRequest {
            min_price: Some(900),
            max_price: Some(500),
            ..Default::default()
        };
        assert!(matches!(request.validate(), Err(HearthError::InvalidInput(_))));
    }

    #[test]
    fn test_exclusive_bounds() {
        let range = RangeFilter::new(Bound::Excluded(5u32), Bound::Excluded(10));
        assert!(!range.contains(&5));
        assert!(range.contains(&6));
        assert!(!range.contains(&10));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = FilterRequest::from_json(&json!({ "colour": "blue" })).unwrap_err();
        assert!(matches!(err, HearthError::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_enum_value_rejected() {
        let request = FilterRequest::from_json(&json!({ "apartment_type": "castle" })).unwrap();
        assert!(matches!(request.validate(), Err(HearthError::InvalidInput(_))));
    }

    #[test]
    fn test_aliases() {
        let request = FilterRequest::from_json(&json!({
            "rent_per_week": 800,
            "is_pathroom_solo": true,
            "start_date": "2024-09-01",
            "duration_len": 4
        }))
        .unwrap();
        assert_eq!(request.max_price, Some(800));
        assert_eq!(request.is_bathroom_solo, Some(true));
        assert_eq!(request.start_date_from.as_deref(), Some("2024-09-01"));
        assert_eq!(request.min_duration_weeks, Some(4));
    }

    #[test]
    fn test_filters_match_document() {
        let (doc, exact) = doc_and_exact(zamalek());
        let request = FilterRequest::from_json(&json!({
            "apartment_type": "2bhk",
            "min_price": 600,
            "max_price": 800,
            "location": "zamalek"
        }))
        .unwrap();
        assert!(request.validate().unwrap().matches(&doc, &exact));

        let request = FilterRequest::from_json(&json!({ "location": "maadi" })).unwrap();
        assert!(!request.validate().unwrap().matches(&doc, &exact));
    }

    #[test]
    fn test_location_needs_every_term() {
        let (doc, exact) = doc_and_exact(zamalek());
        let both = FilterRequest::from_json(&json!({ "location": "Cairo, Zamalek" })).unwrap();
        assert!(both.validate().unwrap().matches(&doc, &exact));
        let one_wrong = FilterRequest::from_json(&json!({ "location": "Zamalek Giza" })).unwrap();
        assert!(!one_wrong.validate().unwrap().matches(&doc, &exact));
    }

    #[test]
    fn test_missing_duration_never_matches() {
        let (doc, exact) = doc_and_exact(zamalek());
        let request = FilterRequest {
            min_duration_weeks: Some(1),
            ..Default::default()
        };
        assert!(!request.validate().unwrap().matches(&doc, &exact));

        let mut record = zamalek();
        record.duration_len = Some(12);
        let (doc, exact) = doc_and_exact(record);
        assert!(request.validate().unwrap().matches(&doc, &exact));
    }

    #[test]
    fn test_keyword_modes() {
        let (doc, exact) = doc_and_exact(zamalek());

        let any = FilterRequest::from_json(&json!({ "keywords": ["balcony", "pool"] })).unwrap();
        assert!(any.validate().unwrap().matches(&doc, &exact));

        let all = FilterRequest::from_json(&json!({
            "keywords": ["balcony", "pool"],
            "keywords_mode": "all"
        }))
        .unwrap();
        assert!(!all.validate().unwrap().matches(&doc, &exact));

        let joined = FilterRequest::from_json(&json!({
            "keywords": "BALCONY, nile view",
            "keywords_mode": "all"
        }))
        .unwrap();
        assert!(joined.validate().unwrap().matches(&doc, &exact));
    }

    #[test]
    fn test_visibility_always_injected() {
        let (doc, exact) = doc_and_exact(zamalek().with_status(crate::document::ListingStatus::Draft));
        let filters = FilterRequest::default().validate().unwrap();
        assert_eq!(filters.len(), 1);
        assert!(!filters.matches(&doc, &exact));
    }

    #[test]
    fn test_blank_strings_are_absent() {
        let request = FilterRequest::from_json(&json!({ "location": "  ", "parking_type": "" })).unwrap();
        assert_eq!(request.validate().unwrap(), FilterSet::visible_only());
    }
}
