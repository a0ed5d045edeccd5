//! Term dictionaries, postings and stored documents.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use serde::Serialize;

use crate::document::{SearchDocument, TextField};
use crate::index::analyzed::AnalyzedDocument;

/// Document id to term frequency.
pub type Postings = AHashMap<u64, u32>;

/// Iterate the entries of an ordered string map whose keys start with `prefix`.
fn prefix_range<'a, V>(
    map: &'a BTreeMap<String, V>,
    prefix: &str,
) -> impl Iterator<Item = (&'a String, &'a V)> {
    map.range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .take_while(move |(term, _)| term.starts_with(prefix))
}

/// One text field's dictionary.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    /// Ordered, so prefix scans are range scans.
    terms: BTreeMap<String, Postings>,
    /// Per term, how many visible documents contain it.
    visible_terms: BTreeMap<String, u32>,
    /// Sum of field lengths over all documents.
    total_length: u64,
}

impl FieldIndex {
    pub fn postings(&self, term: &str) -> Option<&Postings> {
        self.terms.get(term)
    }

    pub fn doc_freq(&self, term: &str) -> usize {
        self.terms.get(term).map_or(0, |p| p.len())
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// The dictionary entry for exactly `term`.
    pub fn term_entry(&self, term: &str) -> Option<(&String, &Postings)> {
        self.terms.get_key_value(term)
    }

    /// Terms starting with `prefix`, in order.
    pub fn terms_with_prefix<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = (&'a String, &'a Postings)> {
        prefix_range(&self.terms, prefix)
    }

    /// Terms of visible documents starting with `prefix`, with their
    /// visible document counts.
    pub fn visible_terms_with_prefix<'a>(
        &'a self,
        prefix: &str,
    ) -> impl Iterator<Item = (&'a String, u32)> {
        prefix_range(&self.visible_terms, prefix).map(|(term, count)| (term, *count))
    }

    pub fn visible_doc_freq(&self, term: &str) -> u32 {
        self.visible_terms.get(term).copied().unwrap_or(0)
    }

    /// All terms of visible documents.
    pub fn visible_terms(&self) -> impl Iterator<Item = (&String, u32)> {
        self.visible_terms.iter().map(|(term, count)| (term, *count))
    }

    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    fn add(&mut self, doc_id: u64, analyzed: &AnalyzedDocument, field: TextField) {
        let terms = analyzed.field(field);
        let visible = analyzed.is_visible();
        for (term, freq) in &terms.frequencies {
            self.terms
                .entry(term.clone())
                .or_default()
                .insert(doc_id, *freq);
            if visible {
                *self.visible_terms.entry(term.clone()).or_insert(0) += 1;
            }
        }
        self.total_length += terms.length as u64;
    }

    fn remove(&mut self, doc_id: u64, analyzed: &AnalyzedDocument, field: TextField) {
        let terms = analyzed.field(field);
        let visible = analyzed.is_visible();
        for term in terms.frequencies.keys() {
            if let Some(postings) = self.terms.get_mut(term) {
                postings.remove(&doc_id);
                if postings.is_empty() {
                    self.terms.remove(term);
                }
            }
            if visible && let Some(count) = self.visible_terms.get_mut(term) {
                *count -= 1;
                if *count == 0 {
                    self.visible_terms.remove(term);
                }
            }
        }
        self.total_length -= terms.length as u64;
    }
}

/// Counts reported by [`InvertedIndex::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub documents: usize,
    pub visible_documents: usize,
    pub featured_documents: usize,
    pub title_terms: usize,
    pub description_terms: usize,
    pub location_terms: usize,
    pub keyword_terms: usize,
}

/// The searchable state: one [`FieldIndex`] per text field plus the
/// analyzed documents themselves.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    fields: [FieldIndex; 4],
    docs: AHashMap<u64, AnalyzedDocument>,
    visible: AHashSet<u64>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a document, returning the replaced one.
    pub fn insert(&mut self, analyzed: AnalyzedDocument) -> Option<AnalyzedDocument> {
        let id = analyzed.id();
        let previous = self.remove(id);

        for field in TextField::ALL {
            self.fields[field.ordinal()].add(id, &analyzed, field);
        }
        if analyzed.is_visible() {
            self.visible.insert(id);
        }
        self.docs.insert(id, analyzed);

        previous
    }

    /// Drop a document entirely. `None` if it was not indexed.
    pub fn remove(&mut self, id: u64) -> Option<AnalyzedDocument> {
        let analyzed = self.docs.remove(&id)?;
        for field in TextField::ALL {
            self.fields[field.ordinal()].remove(id, &analyzed, field);
        }
        self.visible.remove(&id);
        Some(analyzed)
    }

    pub fn get(&self, id: u64) -> Option<&Arc<SearchDocument>> {
        self.docs.get(&id).map(|a| &a.document)
    }

    pub fn get_analyzed(&self, id: u64) -> Option<&AnalyzedDocument> {
        self.docs.get(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.docs.contains_key(&id)
    }

    pub fn field(&self, field: TextField) -> &FieldIndex {
        &self.fields[field.ordinal()]
    }

    /// Average length of `field` over all documents.
    pub fn avg_field_length(&self, field: TextField) -> f32 {
        if self.docs.is_empty() {
            return 0.0;
        }
        self.fields[field.ordinal()].total_length as f32 / self.docs.len() as f32
    }

    /// Number of documents, visible or not.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_visible(&self, id: u64) -> bool {
        self.visible.contains(&id)
    }

    pub fn visible_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.visible.iter().copied()
    }

    pub fn documents(&self) -> impl Iterator<Item = &AnalyzedDocument> {
        self.docs.values()
    }

    /// Visible documents containing `term` in any of `fields`.
    pub fn visible_docs_with_term(&self, term: &str, fields: &[TextField]) -> AHashSet<u64> {
        let mut docs = AHashSet::new();
        for field in fields {
            if let Some(postings) = self.field(*field).postings(term) {
                docs.extend(postings.keys().copied().filter(|id| self.visible.contains(id)));
            }
        }
        docs
    }

    pub fn stats(&self) -> IndexStats {
        let now = chrono::Utc::now();
        IndexStats {
            documents: self.docs.len(),
            visible_documents: self.visible.len(),
            featured_documents: self
                .visible
                .iter()
                .filter_map(|id| self.docs.get(id))
                .filter(|a| a.document.is_featured_at(now))
                .count(),
            title_terms: self.field(TextField::Title).term_count(),
            description_terms: self.field(TextField::Description).term_count(),
            location_terms: self.field(TextField::Location).term_count(),
            keyword_terms: self.field(TextField::Keywords).term_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::FieldAnalyzers;
    use crate::document::{ApartmentRecord, ListingStatus};

    fn analyzed(record: ApartmentRecord) -> AnalyzedDocument {
        let doc = SearchDocument::from_record(&record).unwrap();
        AnalyzedDocument::analyze(doc, &FieldAnalyzers::new()).unwrap()
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut index = InvertedIndex::new();
        index.insert(analyzed(ApartmentRecord::new(1, "Cairo Studio").with_location("Cairo")));
        index.insert(analyzed(ApartmentRecord::new(2, "Cairo Loft").with_location("Camp Caesar")));

        let title = index.field(TextField::Title);
        assert_eq!(title.doc_freq("cairo"), 2);
        assert_eq!(title.postings("loft").unwrap().get(&2), Some(&1));
        assert_eq!(index.len(), 2);
        assert_eq!(index.visible_len(), 2);
        assert_eq!(index.avg_field_length(TextField::Title), 2.0);
    }

    #[test]
    fn test_replace_cleans_old_terms() {
        let mut index = InvertedIndex::new();
        index.insert(analyzed(ApartmentRecord::new(1, "Garden Flat")));
        let previous = index.insert(analyzed(ApartmentRecord::new(1, "Roof Flat")));

        assert!(previous.is_some());
        let title = index.field(TextField::Title);
        assert!(!title.contains_term("garden"));
        assert_eq!(title.doc_freq("flat"), 1);
        assert_eq!(index.len(), 1);
        assert_eq!(index.avg_field_length(TextField::Title), 2.0);
    }

    #[test]
    fn test_remove_missing_is_none() {
        let mut index = InvertedIndex::new();
        assert!(index.remove(42).is_none());
    }

    #[test]
    fn test_prefix_scans() {
        let mut index = InvertedIndex::new();
        index.insert(analyzed(ApartmentRecord::new(1, "t").with_location("Cairo")));
        index.insert(analyzed(ApartmentRecord::new(2, "t").with_location("Camp Caesar")));
        index.insert(analyzed(ApartmentRecord::new(3, "t").with_location("Cairo Festival")));

        let location = index.field(TextField::Location);
        let terms: Vec<(&String, u32)> = location.visible_terms_with_prefix("ca").collect();
        let names: Vec<&str> = terms.iter().map(|(t, _)| t.as_str()).collect();
        assert_eq!(names, vec!["caesar", "cairo", "camp"]);
        assert_eq!(terms[1].1, 2);
        assert_eq!(location.terms_with_prefix("cai").count(), 1);
        assert_eq!(location.terms_with_prefix("x").count(), 0);
    }

    #[test]
    fn test_hidden_documents_stay_out_of_visible_counts() {
        let mut index = InvertedIndex::new();
        index.insert(analyzed(ApartmentRecord::new(1, "Hidden Gem").with_status(ListingStatus::Draft)));
        index.insert(analyzed(ApartmentRecord::new(2, "Open Gem")));

        let title = index.field(TextField::Title);
        assert_eq!(title.doc_freq("gem"), 2);
        assert_eq!(title.visible_doc_freq("gem"), 1);
        assert_eq!(title.visible_doc_freq("hidden"), 0);
        assert_eq!(index.visible_docs_with_term("gem", &TextField::ALL).len(), 1);

        index.insert(analyzed(ApartmentRecord::new(2, "Open Gem").with_status(ListingStatus::Archived)));
        assert_eq!(index.field(TextField::Title).visible_doc_freq("gem"), 0);
        assert_eq!(index.visible_len(), 0);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_stats() {
        let mut index = InvertedIndex::new();
        index.insert(analyzed(ApartmentRecord::new(1, "Featured Flat").with_featured(3, None)));
        index.insert(analyzed(ApartmentRecord::new(2, "Plain Flat")));
        let stats = index.stats();
        assert_eq!(stats.documents, 2);
        assert_eq!(stats.featured_documents, 1);
        assert_eq!(stats.title_terms, 3);
    }
}
