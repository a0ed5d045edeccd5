//! Query execution over an index snapshot.

use std::sync::Arc;

use ahash::AHashMap;

use crate::document::{SearchDocument, TextField};
use crate::error::Result;
use crate::index::bm25::Bm25;
use crate::index::inverted::{FieldIndex, InvertedIndex};
use crate::query::{QueryTerm, StructuredQuery, TextQuery};
use crate::util::deadline::Deadline;
use crate::util::levenshtein::{bounded_distance, char_prefix};

/// How many candidates are processed between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 256;

/// A matching document with its text score (0 for browse queries).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: u64,
    pub score: f32,
    pub document: Arc<SearchDocument>,
}

/// An indexed term a query term expanded to, and how far it is.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Expansion<'a> {
    term: &'a str,
    distance: usize,
}

/// Executes queries against one consistent view of the index.
pub struct IndexSearcher<'a> {
    index: &'a InvertedIndex,
    bm25: Bm25,
}

impl<'a> IndexSearcher<'a> {
    pub fn new(index: &'a InvertedIndex, bm25: Bm25) -> Self {
        IndexSearcher { index, bm25 }
    }

    /// Every document matching `query`, unordered.
    pub fn search(&self, query: &StructuredQuery, deadline: &Deadline) -> Result<Vec<Candidate>> {
        match &query.text {
            Some(text) => self.search_text(text, query, deadline),
            None => self.browse(query, deadline),
        }
    }

    fn browse(&self, query: &StructuredQuery, deadline: &Deadline) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::new();
        for (checked, id) in self.index.visible_ids().enumerate() {
            if checked % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check("browse")?;
            }
            let Some(analyzed) = self.index.get_analyzed(id) else {
                continue;
            };
            if query.filters.matches(&analyzed.document, &analyzed.exact) {
                candidates.push(Candidate {
                    id,
                    score: 0.0,
                    document: Arc::clone(&analyzed.document),
                });
            }
        }
        Ok(candidates)
    }

    fn search_text(
        &self,
        text: &TextQuery,
        query: &StructuredQuery,
        deadline: &Deadline,
    ) -> Result<Vec<Candidate>> {
        let term_count = text.terms.len();
        let doc_count = self.index.len();

        // Best field score per (document, query term).
        let mut scores: AHashMap<u64, Vec<f32>> = AHashMap::new();

        for (term_idx, term) in text.terms.iter().enumerate() {
            for field in TextField::ALL {
                let boost = field_boost(text, field);
                if boost <= 0.0 {
                    continue;
                }
                let field_index = self.index.field(field);
                let avg_len = self.index.avg_field_length(field);

                for expansion in self.expand(term, field, text.max_expansions, deadline)? {
                    let Some(postings) = field_index.postings(expansion.term) else {
                        continue;
                    };
                    let doc_freq = postings.len();
                    let penalty = 1.0 / (1.0 + expansion.distance as f32);

                    for (&doc_id, &term_freq) in postings {
                        let field_len = self
                            .index
                            .get_analyzed(doc_id)
                            .map_or(0, |a| a.field(field).length);
                        let score = self.bm25.score(term_freq, doc_freq, doc_count, field_len, avg_len)
                            * boost
                            * penalty;
                        let slot = &mut scores.entry(doc_id).or_insert_with(|| vec![0.0; term_count])
                            [term_idx];
                        if score > *slot {
                            *slot = score;
                        }
                    }
                }
            }
        }

        let mut candidates = Vec::new();
        for (checked, (doc_id, term_scores)) in scores.into_iter().enumerate() {
            if checked % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check("search")?;
            }
            let matched = term_scores.iter().filter(|s| **s > 0.0).count();
            if matched < text.minimum_should_match {
                continue;
            }
            let Some(analyzed) = self.index.get_analyzed(doc_id) else {
                continue;
            };
            if !query.filters.matches(&analyzed.document, &analyzed.exact) {
                continue;
            }

            let mut score: f32 = term_scores.iter().sum();
            if contains_phrase(&analyzed.exact.title, &text.phrase)
                || contains_phrase(&analyzed.exact.location, &text.phrase)
            {
                score += text.exact_phrase_boost;
            }

            candidates.push(Candidate {
                id: doc_id,
                score,
                document: Arc::clone(&analyzed.document),
            });
        }

        Ok(candidates)
    }

    /// Indexed terms of `field` within `term.max_edits` of the query term,
    /// closest first, at most `max_expansions`.
    fn expand(
        &self,
        term: &QueryTerm,
        field: TextField,
        max_expansions: usize,
        deadline: &Deadline,
    ) -> Result<Vec<Expansion<'a>>> {
        let field_index: &'a FieldIndex = self.index.field(field);

        if term.is_exact() {
            return Ok(field_index
                .term_entry(&term.text)
                .map(|(indexed, _)| Expansion {
                    term: indexed.as_str(),
                    distance: 0,
                })
                .into_iter()
                .collect());
        }

        let prefix = char_prefix(&term.text, term.prefix_length);
        let mut expansions = Vec::new();
        for (scanned, (indexed, _)) in field_index.terms_with_prefix(prefix).enumerate() {
            if scanned % DEADLINE_CHECK_INTERVAL == 0 {
                deadline.check("fuzzy expansion")?;
            }
            if let Some(distance) = bounded_distance(&term.text, indexed, term.max_edits, true) {
                expansions.push(Expansion {
                    term: indexed.as_str(),
                    distance,
                });
            }
        }

        expansions.sort_by(|a, b| a.distance.cmp(&b.distance).then_with(|| a.term.cmp(b.term)));
        expansions.truncate(max_expansions);
        Ok(expansions)
    }
}

fn field_boost(text: &TextQuery, field: TextField) -> f32 {
    match field {
        TextField::Title => text.boosts.title,
        TextField::Description => text.boosts.description,
        TextField::Location => text.boosts.location,
        TextField::Keywords => text.boosts.keywords,
    }
}

/// Whether `phrase` occurs in `haystack` on word boundaries. Both are in
/// exact-copy form: words separated by single spaces.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    haystack.match_indices(phrase).any(|(start, _)| {
        let end = start + phrase.len();
        let before_ok = start == 0 || haystack.as_bytes()[start - 1] == b' ';
        let after_ok = end == haystack.len() || haystack.as_bytes()[end] == b' ';
        before_ok && after_ok
    })
}
