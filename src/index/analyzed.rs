//! Analysis output for one document.

use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::FieldAnalyzers;
use crate::document::{SearchDocument, TextField};
use crate::error::Result;

/// Untokenized copies used for exact matching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExactFields {
    /// Normalized title phrase.
    pub title: String,
    /// Normalized location phrase; its words double as location filter terms.
    pub location: String,
    /// Normalized keywords, one per listing keyword.
    pub keywords: Vec<String>,
}

impl ExactFields {
    pub fn from_document(doc: &SearchDocument, analyzers: &FieldAnalyzers) -> Result<Self> {
        let mut keywords = Vec::with_capacity(doc.keywords.len());
        for keyword in &doc.keywords {
            if let Some(normalized) = analyzers.exact_copy(TextField::Keywords, keyword)? {
                keywords.push(normalized);
            }
        }

        Ok(ExactFields {
            title: analyzers
                .exact_copy(TextField::Title, &doc.title)?
                .unwrap_or_default(),
            location: analyzers
                .exact_copy(TextField::Location, &doc.location)?
                .unwrap_or_default(),
            keywords,
        })
    }
}

/// Term frequencies and length of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTerms {
    pub frequencies: AHashMap<String, u32>,
    /// Number of tokens in the field.
    pub length: u32,
}

impl FieldTerms {
    fn from_terms(terms: impl IntoIterator<Item = String>) -> Self {
        let mut field = FieldTerms::default();
        for term in terms {
            *field.frequencies.entry(term).or_insert(0) += 1;
            field.length += 1;
        }
        field
    }
}

/// A document ready to be applied to an [`InvertedIndex`](super::InvertedIndex).
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzedDocument {
    pub document: Arc<SearchDocument>,
    /// Indexed by [`TextField::ordinal`].
    pub fields: [FieldTerms; 4],
    pub exact: ExactFields,
}

impl AnalyzedDocument {
    pub fn analyze(document: SearchDocument, analyzers: &FieldAnalyzers) -> Result<Self> {
        let mut fields: [FieldTerms; 4] = Default::default();
        for field in TextField::ALL {
            let mut terms = Vec::new();
            for value in document.field_values(field) {
                terms.extend(analyzers.analyze_field(field, value)?);
            }
            fields[field.ordinal()] = FieldTerms::from_terms(terms);
        }

        let exact = ExactFields::from_document(&document, analyzers)?;
        Ok(AnalyzedDocument {
            document: Arc::new(document),
            fields,
            exact,
        })
    }

    pub fn id(&self) -> u64 {
        self.document.id
    }

    pub fn field(&self, field: TextField) -> &FieldTerms {
        &self.fields[field.ordinal()]
    }

    pub fn is_visible(&self) -> bool {
        self.document.is_visible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ApartmentRecord;

    #[test]
    fn test_analyze_document() {
        let record = ApartmentRecord::new(3, "Sunny Studio, sunny balcony")
            .with_description("Close to the metro.")
            .with_location("Maadi, Cairo")
            .with_keywords(["Sea View", "balcony"]);
        let doc = SearchDocument::from_record(&record).unwrap();
        let analyzed = AnalyzedDocument::analyze(doc, &FieldAnalyzers::new()).unwrap();

        let title = analyzed.field(TextField::Title);
        assert_eq!(title.length, 4);
        assert_eq!(title.frequencies.get("sunny"), Some(&2));

        let keywords = analyzed.field(TextField::Keywords);
        assert_eq!(keywords.length, 3);
        assert!(keywords.frequencies.contains_key("sea"));

        assert_eq!(analyzed.exact.title, "sunny studio sunny balcony");
        assert_eq!(analyzed.exact.location, "maadi cairo");
        assert_eq!(analyzed.exact.keywords, vec!["sea view", "balcony"]);
        assert_eq!(analyzed.id(), 3);
    }
}
