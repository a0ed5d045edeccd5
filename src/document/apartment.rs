//! The canonical apartment record and its closed value sets.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::error::{HearthError, Result};

/// Gives a strum enum case-insensitive parsing into [`HearthError::InvalidInput`]
/// and string-based serde.
macro_rules! closed_value_set {
    ($ty:ident, $what:literal) => {
        impl $ty {
            /// Parse a value, ignoring ASCII case and surrounding whitespace.
            pub fn parse(value: &str) -> Result<Self> {
                value.trim().parse::<$ty>().map_err(|_| {
                    let expected: Vec<String> = $ty::iter().map(|v| v.to_string()).collect();
                    HearthError::invalid_input(format!(
                        "unknown {} `{}` (expected one of: {})",
                        $what,
                        value,
                        expected.join(", ")
                    ))
                })
            }
        }

        impl TryFrom<String> for $ty {
            type Error = HearthError;

            fn try_from(value: String) -> Result<Self> {
                $ty::parse(&value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> String {
                value.to_string()
            }
        }
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum ApartmentType {
    Studio,
    #[strum(to_string = "1BHK")]
    OneBhk,
    #[strum(to_string = "2BHK")]
    TwoBhk,
    #[strum(to_string = "3BHK")]
    ThreeBhk,
    #[strum(to_string = "4BHK")]
    FourBhk,
    Shared,
    Penthouse,
}

closed_value_set!(ApartmentType, "apartment_type");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum FurnishingType {
    Furnished,
    #[strum(
        to_string = "Semi-furnished",
        serialize = "semi_furnished",
        serialize = "semifurnished"
    )]
    SemiFurnished,
    Unfurnished,
}

closed_value_set!(FurnishingType, "furnishing_type");

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum ParkingType {
    Private,
    Street,
    Garage,
    #[strum(to_string = "None")]
    NoParking,
}

closed_value_set!(ParkingType, "parking_type");

/// Which tenants a listing accepts. Callers filter on it as `place_accept`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display, AsRefStr, EnumIter, Serialize, Deserialize,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum GenderPreference {
    Male,
    Female,
    Both,
}

closed_value_set!(GenderPreference, "place_accept");

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
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
#[serde(try_from = "String", into = "String")]
pub enum ListingStatus {
    #[default]
    Published,
    Draft,
    Archived,
}

closed_value_set!(ListingStatus, "status");

/// An apartment as supplied by the source of truth.
///
/// Field names follow the source: `duration_len` is in weeks, `place_accept`
/// is the tenant preference, and the long-standing `is_pathroom_solo`
/// spelling is accepted for `is_bathroom_solo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApartmentRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub location: String,
    pub apartment_type: ApartmentType,
    pub rent_per_week: u32,
    #[serde(deserialize_with = "deserialize_date")]
    pub start_date: NaiveDate,
    #[serde(default)]
    pub duration_len: Option<u32>,
    pub place_accept: GenderPreference,
    pub furnishing_type: FurnishingType,
    #[serde(default, alias = "is_pathroom_solo")]
    pub is_bathroom_solo: bool,
    pub parking_type: ParkingType,
    #[serde(default, deserialize_with = "deserialize_keywords")]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub status: ListingStatus,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub featured_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub featured_priority: i32,
    #[serde(default)]
    pub view_count: u64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_opt_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ApartmentRecord {
    /// A published, active, unfeatured studio with the given id and title.
    /// The remaining fields are plain placeholders meant to be overwritten.
    pub fn new<S: Into<String>>(id: u64, title: S) -> Self {
        let now = Utc::now();
        ApartmentRecord {
            id,
            title: title.into(),
            description: String::new(),
            location: String::new(),
            apartment_type: ApartmentType::Studio,
            rent_per_week: 100,
            start_date: now.date_naive(),
            duration_len: None,
            place_accept: GenderPreference::Both,
            furnishing_type: FurnishingType::Furnished,
            is_bathroom_solo: false,
            parking_type: ParkingType::NoParking,
            keywords: Vec::new(),
            status: ListingStatus::Published,
            is_active: true,
            is_featured: false,
            featured_until: None,
            featured_priority: 0,
            view_count: 0,
            created_at: now,
            updated_at: None,
        }
    }

    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_rent(mut self, rent_per_week: u32) -> Self {
        self.rent_per_week = rent_per_week;
        self
    }

    pub fn with_type(mut self, apartment_type: ApartmentType) -> Self {
        self.apartment_type = apartment_type;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_status(mut self, status: ListingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_featured(mut self, priority: i32, until: Option<DateTime<Utc>>) -> Self {
        self.is_featured = true;
        self.featured_priority = priority;
        self.featured_until = until;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// When this version of the record was written.
    pub fn revision(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }
}

fn default_true() -> bool {
    true
}

/// Parse a calendar date given either as `YYYY-MM-DD` or as a timestamp.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(value).ok().map(|ts| ts.date_naive()))
        .ok_or_else(|| HearthError::invalid_input(format!("invalid date `{value}`")))
}

/// Parse an RFC 3339 timestamp, or a naive `YYYY-MM-DDTHH:MM:SS` one taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| HearthError::invalid_input(format!("invalid timestamp `{value}`")))
}

fn deserialize_date<'de, D>(deserializer: D) -> std::result::Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_opt_timestamp<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_timestamp(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// Keywords arrive either as a list or as one comma-separated string.
fn deserialize_keywords<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
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
        Some(RawKeywords::Joined(joined)) => joined.split(',').map(str::to_string).collect(),
    })
}
