//! Field-to-analyzer mapping shared by indexing and querying.

use std::sync::Arc;

use ahash::AHashMap;

use crate::analysis::analyzer::{Analyzer, KeywordAnalyzer, StandardAnalyzer};
use crate::document::TextField;
use crate::error::Result;

/// Decides how each text field is analyzed.
///
/// Every field defaults to [`StandardAnalyzer`]; individual fields can be
/// overridden. Untokenized copies go through [`FieldAnalyzers::exact_copy`].
///
/// ```
/// use hearth::analysis::FieldAnalyzers;
/// use hearth::document::TextField;
///
/// let analyzers = FieldAnalyzers::new();
/// let terms = analyzers.analyze_field(TextField::Title, "Sunny Studio").unwrap();
/// assert_eq!(terms, vec!["sunny", "studio"]);
/// assert_eq!(analyzers.normalize_exact("Sunny,  Studio!").unwrap(), "sunny studio");
/// ```
#[derive(Clone)]
pub struct FieldAnalyzers {
    default_analyzer: Arc<dyn Analyzer>,
    keyword_analyzer: Arc<dyn Analyzer>,
    field_analyzers: AHashMap<TextField, Arc<dyn Analyzer>>,
}

impl FieldAnalyzers {
    pub fn new() -> Self {
        FieldAnalyzers {
            default_analyzer: Arc::new(StandardAnalyzer::new()),
            keyword_analyzer: Arc::new(KeywordAnalyzer::new()),
            field_analyzers: AHashMap::new(),
        }
    }

    /// Use `analyzer` for `field` instead of the default.
    pub fn with_analyzer(mut self, field: TextField, analyzer: Arc<dyn Analyzer>) -> Self {
        self.field_analyzers.insert(field, analyzer);
        self
    }

    pub fn get_analyzer(&self, field: TextField) -> &Arc<dyn Analyzer> {
        self.field_analyzers
            .get(&field)
            .unwrap_or(&self.default_analyzer)
    }

    /// Terms of `text` as indexed in (and looked up against) `field`.
    pub fn analyze_field(&self, field: TextField, text: &str) -> Result<Vec<String>> {
        self.get_analyzer(field).terms(text)
    }

    /// Terms of a free-text query. Queries span every field, so they use the
    /// default analyzer.
    pub fn analyze_query(&self, text: &str) -> Result<Vec<String>> {
        self.default_analyzer.terms(text)
    }

    /// Lowercased words joined by single spaces, punctuation dropped.
    ///
    /// Exact title and location copies, and the phrase compared against
    /// them, both use this form.
    pub fn normalize_exact(&self, text: &str) -> Result<String> {
        Ok(self.default_analyzer.terms(text)?.join(" "))
    }

    /// A keyword's exact, case-insensitive form: trimmed and lowercased,
    /// inner punctuation preserved. `None` for a blank keyword.
    pub fn normalize_keyword(&self, keyword: &str) -> Result<Option<String>> {
        Ok(self.keyword_analyzer.terms(keyword)?.into_iter().next())
    }

    /// The untokenized copy of `text` kept for `field`.
    pub fn exact_copy(&self, field: TextField, text: &str) -> Result<Option<String>> {
        match field {
            TextField::Keywords => self.normalize_keyword(text),
            _ => {
                let normalized = self.normalize_exact(text)?;
                Ok((!normalized.is_empty()).then_some(normalized))
            }
        }
    }
}

impl Default for FieldAnalyzers {
    fn default() -> Self {
        Self::new()
    }
}
