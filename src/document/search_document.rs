//! The indexed projection of an apartment.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::document::apartment::{
    ApartmentRecord, ApartmentType, FurnishingType, GenderPreference, ListingStatus, ParkingType,
};
use crate::error::{HearthError, Result};

/// The tokenized text fields of a [`SearchDocument`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, Display, AsRefStr, EnumIter,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TextField {
    Title,
    Description,
    Location,
    Keywords,
}

impl TextField {
    pub const ALL: [TextField; 4] = [
        TextField::Title,
        TextField::Description,
        TextField::Location,
        TextField::Keywords,
    ];

    /// Dense index, for per-field arrays.
    pub fn ordinal(self) -> usize {
        match self {
            TextField::Title => 0,
            TextField::Description => 1,
            TextField::Location => 2,
            TextField::Keywords => 3,
        }
    }
}

/// What the index stores for one apartment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    pub id: u64,

    // Text fields
    pub title: String,
    pub description: String,
    pub location: String,
    pub keywords: Vec<String>,

    // Filter fields
    pub apartment_type: ApartmentType,
    pub furnishing_type: FurnishingType,
    pub parking_type: ParkingType,
    pub gender_preference: GenderPreference,
    pub is_bathroom_solo: bool,
    pub rent_per_week: u32,
    pub start_date: NaiveDate,
    pub duration_weeks: Option<u32>,

    // Ranking fields
    pub is_featured: bool,
    pub featured_priority: i32,
    pub featured_until: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub status: ListingStatus,
    pub is_active: bool,
}

impl SearchDocument {
    /// Validate a source record and project it.
    pub fn from_record(record: &ApartmentRecord) -> Result<Self> {
        let title = record.title.trim();
        if title.is_empty() {
            return Err(HearthError::invalid_input(format!(
                "apartment {} has an empty title",
                record.id
            )));
        }
        if record.rent_per_week == 0 {
            return Err(HearthError::invalid_input(format!(
                "apartment {} must have a positive rent_per_week",
                record.id
            )));
        }
        if record.featured_priority < 0 {
            return Err(HearthError::invalid_input(format!(
                "apartment {} has a negative featured_priority",
                record.id
            )));
        }
        if record.duration_len == Some(0) {
            return Err(HearthError::invalid_input(format!(
                "apartment {} has a zero duration_len",
                record.id
            )));
        }

        Ok(SearchDocument {
            id: record.id,
            title: title.to_string(),
            description: record.description.trim().to_string(),
            location: record.location.trim().to_string(),
            keywords: normalize_keywords(&record.keywords),
            apartment_type: record.apartment_type,
            furnishing_type: record.furnishing_type,
            parking_type: record.parking_type,
            gender_preference: record.place_accept,
            is_bathroom_solo: record.is_bathroom_solo,
            rent_per_week: record.rent_per_week,
            start_date: record.start_date,
            duration_weeks: record.duration_len,
            is_featured: record.is_featured,
            featured_priority: record.featured_priority,
            featured_until: record.featured_until,
            view_count: record.view_count,
            created_at: record.created_at,
            updated_at: record.revision(),
            status: record.status,
            is_active: record.is_active,
        })
    }

    /// Published and active. Nothing else is ever returned to a caller.
    pub fn is_visible(&self) -> bool {
        self.status == ListingStatus::Published && self.is_active
    }

    /// Whether the featured boost applies at `now`. An open-ended window
    /// never expires.
    pub fn is_featured_at(&self, now: DateTime<Utc>) -> bool {
        self.is_featured && self.featured_until.is_none_or(|until| until > now)
    }

    /// Featured flag set but the window is over.
    pub fn featured_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.is_featured && !self.is_featured_at(now)
    }

    /// The raw values of a text field; keywords yield one value each.
    pub fn field_values(&self, field: TextField) -> Vec<&str> {
        match field {
            TextField::Title => vec![self.title.as_str()],
            TextField::Description => vec![self.description.as_str()],
            TextField::Location => vec![self.location.as_str()],
            TextField::Keywords => self.keywords.iter().map(String::as_str).collect(),
        }
    }
}

/// Trim, split comma-joined entries, drop blanks and case-insensitive duplicates.
fn normalize_keywords(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|keyword| !keyword.is_empty())
        .filter(|keyword| seen.insert(keyword.to_lowercase()))
        .map(str::to_string)
        .collect()
}
