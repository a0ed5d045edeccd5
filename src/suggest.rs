//! Suggestions: prefix autocomplete and "did you mean" corrections.
//!
//! Both read the index store directly and only ever propose terms that
//! occur in visible documents.

pub mod autocomplete;
pub mod spelling;

use serde::{Deserialize, Serialize};

pub use autocomplete::{Autocompleter, GroupedSuggestions, SuggestField};
pub use spelling::{Correction, SpellChecker};

/// Suggested strings plus how many existed before the limit was applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub items: Vec<String>,
    pub total_count: usize,
}

impl Suggestions {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
