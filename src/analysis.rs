//! Text analysis for the searchable fields of a listing.
//!
//! Analysis turns a field value into the terms stored in the inverted index
//! and into the terms looked up at query time. Both sides must go through the
//! same analyzer or matches are silently lost, so [`FieldAnalyzers`] is the
//! single place that decides which analyzer a field uses.

pub mod analyzer;
pub mod per_field;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, KeywordAnalyzer, PipelineAnalyzer, StandardAnalyzer};
pub use per_field::FieldAnalyzers;
pub use token::{Token, TokenStream};
pub use token_filter::{Filter, LowercaseFilter};
pub use tokenizer::{Tokenizer, UnicodeWordTokenizer, WholeTokenizer};
