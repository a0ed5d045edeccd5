//! Shared utility modules used across Hearth components.

pub mod deadline;
pub mod levenshtein;
