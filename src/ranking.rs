//! Result ordering.
//!
//! Ordering is a pure function of the candidates, the [`SortMode`], the
//! featured opt-out and the clock: currently featured listings first (by
//! priority), then the sort mode's key, then id ascending. The id tie-break
//! makes every order total, which is what keeps offset pagination stable.

pub mod policy;
pub mod sort_mode;

pub use policy::{RankedHit, RankedPage, RankingPolicy};
pub use sort_mode::SortMode;
