//! "Did you mean" corrections for whole queries.
//!
//! Each unknown word of the query gets a short list of vocabulary terms
//! within a small edit distance. Whole-query combinations are then checked
//! against the index, and only those matching at least one visible document
//! are offered.

use std::cmp::Ordering;

use ahash::{AHashMap, AHashSet};

use crate::analysis::FieldAnalyzers;
use crate::config::SuggestConfig;
use crate::document::TextField;
use crate::error::Result;
use crate::index::InvertedIndex;
use crate::query::Fuzziness;
use crate::suggest::Suggestions;
use crate::util::deadline::Deadline;
use crate::util::levenshtein::{bounded_distance, char_prefix};

/// Whole-query combinations checked against the index at most.
const MAX_COMBINATIONS: usize = 256;

/// A verified whole-query correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Correction {
    pub text: String,
    /// Sum of the per-word edit distances.
    pub distance: usize,
    /// Visible documents containing every word.
    pub frequency: usize,
}

impl Ord for Correction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Closest first, then most common, then alphabetical
        self.distance
            .cmp(&other.distance)
            .then_with(|| other.frequency.cmp(&self.frequency))
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl PartialOrd for Correction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One way to spell a query word.
#[derive(Debug, Clone)]
struct WordOption {
    term: String,
    distance: usize,
}

/// Spelling correction against one index snapshot.
pub struct SpellChecker<'a> {
    index: &'a InvertedIndex,
    config: &'a SuggestConfig,
    analyzers: &'a FieldAnalyzers,
}

impl<'a> SpellChecker<'a> {
    pub fn new(
        index: &'a InvertedIndex,
        config: &'a SuggestConfig,
        analyzers: &'a FieldAnalyzers,
    ) -> Self {
        SpellChecker {
            index,
            config,
            analyzers,
        }
    }

    /// Is `term` in the visible vocabulary of any text field?
    fn is_known(&self, term: &str) -> bool {
        TextField::ALL
            .iter()
            .any(|f| self.index.field(*f).visible_doc_freq(term) > 0)
    }

    fn docs_with(&self, term: &str) -> AHashSet<u64> {
        self.index.visible_docs_with_term(term, &TextField::ALL)
    }

    /// Closest vocabulary terms for an unknown word.
    fn candidates(&self, word: &str, deadline: &Deadline) -> Result<Vec<WordOption>> {
        let max_edits = self
            .config
            .max_edit_distance
            .min(Fuzziness::auto_edits(word.chars().count()));
        if max_edits == 0 {
            return Ok(Vec::new());
        }

        let prefix = char_prefix(word, self.config.spellcheck_prefix_length);
        let mut found: AHashMap<&str, usize> = AHashMap::new();
        for field in TextField::ALL {
            for (scanned, (term, _)) in self
                .index
                .field(field)
                .visible_terms_with_prefix(prefix)
                .enumerate()
            {
                if scanned % 256 == 0 {
                    deadline.check("spellcheck")?;
                }
                if found.contains_key(term.as_str()) {
                    continue;
                }
                if let Some(distance) = bounded_distance(word, term, max_edits, true) {
                    found.insert(term.as_str(), distance);
                }
            }
        }

        let mut options: Vec<(WordOption, usize)> = found
            .into_iter()
            .map(|(term, distance)| {
                let frequency = self.docs_with(term).len();
                (
                    WordOption {
                        term: term.to_string(),
                        distance,
                    },
                    frequency,
                )
            })
            .collect();
        options.sort_by(|(a, fa), (b, fb)| {
            a.distance
                .cmp(&b.distance)
                .then_with(|| fb.cmp(fa))
                .then_with(|| a.term.cmp(&b.term))
        });
        options.truncate(self.config.candidates_per_word);
        Ok(options.into_iter().map(|(option, _)| option).collect())
    }

    /// Ranked whole-query corrections. Empty when the query is too short,
    /// when every word is already known, or when nothing verifies.
    pub fn correct(&self, query: &str, deadline: &Deadline) -> Result<Suggestions> {
        let corrections = self.corrections(query, deadline)?;
        Ok(Suggestions {
            total_count: corrections.len(),
            items: corrections
                .into_iter()
                .take(self.config.max_corrections)
                .map(|c| c.text)
                .collect(),
        })
    }

    /// Every verified correction, best first.
    pub fn corrections(&self, query: &str, deadline: &Deadline) -> Result<Vec<Correction>> {
        let query = query.trim();
        if query.chars().count() < self.config.spellcheck_min_query {
            return Ok(Vec::new());
        }

        let words = self.analyzers.analyze_query(query)?;
        let mut slots: Vec<Vec<WordOption>> = Vec::with_capacity(words.len());
        let mut needs_correction = false;

        for word in &words {
            let keep = WordOption {
                term: word.clone(),
                distance: 0,
            };
            if word.chars().count() < self.config.spellcheck_min_word || self.is_known(word) {
                slots.push(vec![keep]);
                continue;
            }
            needs_correction = true;
            let options = self.candidates(word, deadline)?;
            if options.is_empty() {
                return Ok(Vec::new());
            }
            slots.push(options);
        }

        if !needs_correction {
            return Ok(Vec::new());
        }

        let mut doc_sets: AHashMap<String, AHashSet<u64>> = AHashMap::new();
        let mut corrections = Vec::new();
        let mut seen = AHashSet::new();

        for (checked, choice) in Combinations::new(&slots).take(MAX_COMBINATIONS).enumerate() {
            if checked % 32 == 0 {
                deadline.check("spellcheck")?;
            }

            let mut matching: Option<AHashSet<u64>> = None;
            for option in &choice {
                let docs = doc_sets
                    .entry(option.term.clone())
                    .or_insert_with(|| self.docs_with(&option.term));
                matching = Some(match matching {
                    None => docs.clone(),
                    Some(acc) => acc.intersection(docs).copied().collect(),
                });
                if matching.as_ref().is_some_and(|m| m.is_empty()) {
                    break;
                }
            }

            let frequency = matching.map_or(0, |m| m.len());
            if frequency == 0 {
                continue;
            }
            let text = choice
                .iter()
                .map(|o| o.term.as_str())
                .collect::<Vec<_>>()
                .join(" ");
            if !seen.insert(text.clone()) {
                continue;
            }
            corrections.push(Correction {
                distance: choice.iter().map(|o| o.distance).sum(),
                frequency,
                text,
            });
        }

        corrections.sort();
        Ok(corrections)
    }
}

/// Cartesian product of per-word options, first option of each slot first.
struct Combinations<'s> {
    slots: &'s [Vec<WordOption>],
    cursor: Option<Vec<usize>>,
}

impl<'s> Combinations<'s> {
    fn new(slots: &'s [Vec<WordOption>]) -> Self {
        let cursor = (!slots.is_empty() && slots.iter().all(|s| !s.is_empty()))
            .then(|| vec![0; slots.len()]);
        Combinations { slots, cursor }
    }
}

impl<'s> Iterator for Combinations<'s> {
    type Item = Vec<&'s WordOption>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        let item = cursor
            .iter()
            .zip(self.slots)
            .map(|(&i, slot)| &slot[i])
            .collect();

        // Advance like an odometer, last slot fastest.
        let mut pos = cursor.len();
        loop {
            if pos == 0 {
                self.cursor = None;
                break;
            }
            pos -= 1;
            cursor[pos] += 1;
            if cursor[pos] < self.slots[pos].len() {
                break;
            }
            cursor[pos] = 0;
        }

        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::document::{ApartmentRecord, ListingStatus, SearchDocument};
    use crate::index::AnalyzedDocument;

    fn index_of(records: Vec<ApartmentRecord>) -> InvertedIndex {
        let analyzers = FieldAnalyzers::new();
        let mut index = InvertedIndex::new();
        for record in records {
            let doc = SearchDocument::from_record(&record).unwrap();
            index.insert(AnalyzedDocument::analyze(doc, &analyzers).unwrap());
        }
        index
    }

    fn corpus() -> InvertedIndex {
        index_of(vec![
            ApartmentRecord::new(1, "Spacious 2BHK in Zamalek").with_location("Zamalek"),
            ApartmentRecord::new(2, "Zamalek studio").with_location("Zamalek"),
            ApartmentRecord::new(3, "Studio in Maadi").with_location("Maadi"),
            ApartmentRecord::new(4, "Garden flat").with_location("Zayed"),
            ApartmentRecord::new(5, "Secret listing")
                .with_location("Zamalak")
                .with_status(ListingStatus::Draft),
        ])
    }

    fn correct(index: &InvertedIndex, query: &str) -> Suggestions {
        let config = SuggestConfig::default();
        let analyzers = FieldAnalyzers::new();
        SpellChecker::new(index, &config, &analyzers)
            .correct(query, &Deadline::after(Duration::from_secs(1)))
            .unwrap()
    }

    #[test]
    fn test_single_word_correction() {
        let index = corpus();
        let result = correct(&index, "zamalak");
        assert_eq!(result.items, vec!["zamalek"]);
    }

    #[test]
    fn test_multi_word_query_is_verified() {
        let index = corpus();
        assert_eq!(correct(&index, "studoi maadi").items, vec!["studio maadi"]);
        // "garden" never appears with "zamalek", so no suggestion matches.
        assert!(correct(&index, "gardn zamalek").is_empty());
    }

    #[test]
    fn test_known_words_need_no_correction() {
        let index = corpus();
        assert!(correct(&index, "zamalek studio").is_empty());
    }

    #[test]
    fn test_short_queries_are_empty() {
        let index = corpus();
        assert!(correct(&index, "za").is_empty());
    }

    #[test]
    fn test_first_letter_must_match() {
        let index = corpus();
        assert!(correct(&index, "xamalek").is_empty());
    }

    #[test]
    fn test_ranking_prefers_closer_then_more_common() {
        let index = index_of(vec![
            ApartmentRecord::new(1, "Garden"),
            ApartmentRecord::new(2, "Garden"),
            ApartmentRecord::new(3, "Warden"),
            ApartmentRecord::new(4, "Gordon"),
        ]);
        let config = SuggestConfig::default();
        let analyzers = FieldAnalyzers::new();
        let corrections = SpellChecker::new(&index, &config, &analyzers)
            .corrections("gardon", &Deadline::after(Duration::from_secs(1)))
            .unwrap();

        let texts: Vec<&str> = corrections.iter().map(|c| c.text.as_str()).collect();
        // "warden" fails the shared first letter.
        assert_eq!(texts, vec!["garden", "gordon"]);
        assert_eq!(corrections[0].frequency, 2);
    }

    #[test]
    fn test_combinations() {
        let slots = vec![
            vec![
                WordOption { term: "a".into(), distance: 0 },
                WordOption { term: "b".into(), distance: 1 },
            ],
            vec![WordOption { term: "c".into(), distance: 0 }],
        ];
        let combos: Vec<String> = Combinations::new(&slots)
            .map(|c| c.iter().map(|o| o.term.as_str()).collect::<String>())
            .collect();
        assert_eq!(combos, vec!["ac", "bc"]);
        assert_eq!(Combinations::new(&[]).count(), 0);
    }
}
