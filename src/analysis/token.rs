//! Token types for text analysis.
//!
//! ```
//! use hearth::analysis::token::Token;
//!
//! let token = Token::with_offsets("zamalek", 3, 18, 25);
//! assert_eq!(token.text, "zamalek");
//! assert_eq!(token.position, 3);
//! assert_eq!(token.len(), 7);
//! ```

/// A single unit of text after tokenization.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    /// Token text, possibly rewritten by filters.
    pub text: String,

    /// Position in the token stream (0-based)
    pub position: usize,

    /// Byte offset where this token starts in the original text
    pub start_offset: usize,

    /// Byte offset where this token ends in the original text
    pub end_offset: usize,
}

impl Token {
    /// Create a token without offset information.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Token {
            text,
            position,
            start_offset: 0,
            end_offset,
        }
    }

    /// Create a token spanning `start_offset..end_offset` of the source text.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Replace the text, keeping position and offsets.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = text.into();
        self
    }

    /// Length of the token text in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A stream of tokens produced by a tokenizer and transformed by filters.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;
