//! Token filters transform a token stream.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// One step applied to every token after tokenization.
pub trait Filter: Send + Sync {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    fn name(&self) -> &'static str;
}

/// Lowercases every token.
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    pub fn new() -> Self {
        LowercaseFilter
    }
}

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(tokens.map(|token| {
            let lower = token.text.to_lowercase();
            token.with_text(lower)
        })))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
