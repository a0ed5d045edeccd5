//! Listing records and their searchable projection.
//!
//! An [`ApartmentRecord`] is what the source of truth hands over. The index
//! never stores it directly: [`SearchDocument::from_record`] validates and
//! normalizes it into the shape the index and the filters work with.

pub mod apartment;
pub mod jsonl;
pub mod search_document;

pub use apartment::{
    ApartmentRecord, ApartmentType, FurnishingType, GenderPreference, ListingStatus, ParkingType,
    parse_date, parse_timestamp,
};
pub use jsonl::{load_records, read_records};
pub use search_document::{SearchDocument, TextField};
