//! Query building.
//!
//! A caller's request is split into two parts that never mix:
//!
//! - the optional free-text phrase, turned into scored [`QueryTerm`]s with a
//!   per-term fuzziness bound, and
//! - structured [`Filter`]s that narrow the candidate set without touching
//!   the score.
//!
//! [`QueryBuilder::build`] composes both into a [`StructuredQuery`] and
//! always adds the visibility filter.

pub mod builder;
pub mod filter;
pub mod fuzziness;

pub use builder::{QueryBuilder, QueryTerm, StructuredQuery, TextQuery};
pub use filter::{Bound, Filter, FilterRequest, FilterSet, KeywordMode, RangeFilter};
pub use fuzziness::Fuzziness;
