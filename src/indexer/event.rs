//! Change notifications from the source of truth.

use serde::{Deserialize, Serialize};

use crate::document::{ApartmentRecord, ListingStatus};

/// A change to one apartment. Every event except `Deleted` carries the full
/// record as it stands after the change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ApartmentEvent {
    Created(ApartmentRecord),
    Updated(ApartmentRecord),
    Published(ApartmentRecord),
    Archived(ApartmentRecord),
    Featured(ApartmentRecord),
    Unfeatured(ApartmentRecord),
    Viewed(ApartmentRecord),
    Deleted { id: u64 },
}

impl ApartmentEvent {
    pub fn id(&self) -> u64 {
        match self {
            ApartmentEvent::Deleted { id } => *id,
            ApartmentEvent::Created(record)
            | ApartmentEvent::Updated(record)
            | ApartmentEvent::Published(record)
            | ApartmentEvent::Archived(record)
            | ApartmentEvent::Featured(record)
            | ApartmentEvent::Unfeatured(record)
            | ApartmentEvent::Viewed(record) => record.id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ApartmentEvent::Created(_) => "created",
            ApartmentEvent::Updated(_) => "updated",
            ApartmentEvent::Published(_) => "published",
            ApartmentEvent::Archived(_) => "archived",
            ApartmentEvent::Featured(_) => "featured",
            ApartmentEvent::Unfeatured(_) => "unfeatured",
            ApartmentEvent::Viewed(_) => "viewed",
            ApartmentEvent::Deleted { .. } => "deleted",
        }
    }

    /// The record to index, with the state the event implies applied on top.
    /// `None` for a deletion.
    pub fn into_record(self) -> Option<ApartmentRecord> {
        match self {
            ApartmentEvent::Deleted { .. } => None,
            ApartmentEvent::Published(mut record) => {
                record.status = ListingStatus::Published;
                Some(record)
            }
            ApartmentEvent::Archived(mut record) => {
                record.status = ListingStatus::Archived;
                Some(record)
            }
            ApartmentEvent::Featured(mut record) => {
                record.is_featured = true;
                Some(record)
            }
            ApartmentEvent::Unfeatured(mut record) => {
                record.is_featured = false;
                record.featured_until = None;
                Some(record)
            }
            ApartmentEvent::Created(record)
            | ApartmentEvent::Updated(record)
            | ApartmentEvent::Viewed(record) => Some(record),
        }
    }
}
