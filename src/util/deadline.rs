//! Deadlines for read operations.

use std::time::{Duration, Instant};

use crate::error::{HearthError, Result};

/// A point in time after which an operation must give up.
///
/// A timeout too large to represent as an [`Instant`] yields a deadline that
/// never expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Deadline {
            at: Instant::now().checked_add(timeout),
        }
    }

    /// A deadline at a fixed instant.
    pub fn at(at: Instant) -> Self {
        Deadline { at: Some(at) }
    }

    /// `None` when the deadline never expires.
    pub fn instant(&self) -> Option<Instant> {
        self.at
    }

    pub fn remaining(&self) -> Duration {
        self.at
            .map_or(Duration::MAX, |at| at.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.at.is_some_and(|at| Instant::now() >= at)
    }

    /// Fail with [`HearthError::Timeout`] naming `stage` once expired.
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_expired() {
            return Err(HearthError::timeout(format!("deadline exceeded during {stage}")));
        }
        Ok(())
    }
}
