//! Prefix completion over indexed tokens.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::config::SuggestConfig;
use crate::document::TextField;
use crate::error::{HearthError, Result};
use crate::index::InvertedIndex;
use crate::suggest::Suggestions;
use crate::util::deadline::Deadline;

/// Which field autocomplete draws tokens from.
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
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(try_from = "String", into = "String")]
pub enum SuggestField {
    Title,
    Location,
    Keywords,
    /// Title, location and keywords merged, each token once.
    #[default]
    All,
}

impl SuggestField {
    pub fn parse(value: &str) -> Result<Self> {
        value.trim().parse().map_err(|_| {
            let expected: Vec<String> = SuggestField::iter().map(|f| f.to_string()).collect();
            HearthError::invalid_input(format!(
                "unknown autocomplete field `{value}` (expected one of: {})",
                expected.join(", ")
            ))
        })
    }

    pub fn text_fields(&self) -> &'static [TextField] {
        match self {
            SuggestField::Title => &[TextField::Title],
            SuggestField::Location => &[TextField::Location],
            SuggestField::Keywords => &[TextField::Keywords],
            SuggestField::All => &[TextField::Title, TextField::Location, TextField::Keywords],
        }
    }
}

impl TryFrom<String> for SuggestField {
    type Error = HearthError;

    fn try_from(value: String) -> Result<Self> {
        SuggestField::parse(&value)
    }
}

impl From<SuggestField> for String {
    fn from(value: SuggestField) -> String {
        value.to_string()
    }
}

/// Completions per field, in the shape of a grouped autocomplete response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedSuggestions {
    pub titles: Vec<String>,
    pub locations: Vec<String>,
    pub keywords: Vec<String>,
}

/// Prefix completion against one index snapshot.
pub struct Autocompleter<'a> {
    index: &'a InvertedIndex,
    config: &'a SuggestConfig,
}

impl<'a> Autocompleter<'a> {
    pub fn new(index: &'a InvertedIndex, config: &'a SuggestConfig) -> Self {
        Autocompleter { index, config }
    }

    /// Normalized prefix, or `None` when it is too short to look up.
    fn normalize(&self, prefix: &str) -> Option<String> {
        let prefix = prefix.trim().to_lowercase();
        (prefix.chars().count() >= self.config.autocomplete_min_prefix).then_some(prefix)
    }

    /// Up to `limit` distinct tokens of `field` starting with `prefix`, most
    /// common first, then alphabetical.
    pub fn suggest(
        &self,
        prefix: &str,
        field: SuggestField,
        limit: usize,
        deadline: &Deadline,
    ) -> Result<Suggestions> {
        let Some(normalized) = self.normalize(prefix) else {
            return Ok(Suggestions::empty());
        };
        let prefix = normalized.as_str();

        let fields = field.text_fields();
        let mut ranked: Vec<(String, usize)> = if let [single] = fields {
            self.index
                .field(*single)
                .visible_terms_with_prefix(prefix)
                .map(|(term, count)| (term.clone(), count as usize))
                .collect()
        } else {
            let terms: BTreeSet<&String> = fields
                .iter()
                .flat_map(|f| self.index.field(*f).visible_terms_with_prefix(prefix))
                .map(|(term, _)| term)
                .collect();

            let mut ranked = Vec::with_capacity(terms.len());
            for (checked, term) in terms.into_iter().enumerate() {
                if checked % 256 == 0 {
                    deadline.check("autocomplete")?;
                }
                let count = self.index.visible_docs_with_term(term, fields).len();
                ranked.push((term.clone(), count));
            }
            ranked
        };
        deadline.check("autocomplete")?;

        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let total_count = ranked.len();
        let items = ranked.into_iter().take(limit).map(|(term, _)| term).collect();
        Ok(Suggestions { items, total_count })
    }

    /// Title, location and keyword completions side by side.
    pub fn suggest_grouped(
        &self,
        prefix: &str,
        limit: usize,
        deadline: &Deadline,
    ) -> Result<GroupedSuggestions> {
        Ok(GroupedSuggestions {
            titles: self.suggest(prefix, SuggestField::Title, limit, deadline)?.items,
            locations: self.suggest(prefix, SuggestField::Location, limit, deadline)?.items,
            keywords: self.suggest(prefix, SuggestField::Keywords, limit, deadline)?.items,
        })
    }
}
