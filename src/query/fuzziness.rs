//! Typo tolerance policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, Result};

/// Largest edit distance any policy allows.
pub const MAX_EDITS: u8 = 2;

/// How many character edits a query term may be away from an indexed term.
///
/// ```
/// use hearth::query::Fuzziness;
///
/// let auto: Fuzziness = "auto".parse().unwrap();
/// assert_eq!(auto.max_edits("in"), 0);
/// assert_eq!(auto.max_edits("maadi"), 1);
/// assert_eq!(auto.max_edits("zamalek"), 2);
/// assert_eq!(Fuzziness::Edits(1).max_edits("zamalek"), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Fuzziness {
    /// Exact terms only.
    None,
    /// Scale with term length: 0 edits up to 2 chars, 1 up to 5, else 2.
    #[default]
    Auto,
    /// A fixed bound for every term (at most 2).
    Edits(u8),
}

impl Fuzziness {
    /// The `Auto` bound for a term of `len` characters.
    pub fn auto_edits(len: usize) -> usize {
        match len {
            0..=2 => 0,
            3..=5 => 1,
            _ => 2,
        }
    }

    /// Edit bound for `term` under this policy.
    pub fn max_edits(&self, term: &str) -> usize {
        match *self {
            Fuzziness::None => 0,
            Fuzziness::Auto => Self::auto_edits(term.chars().count()),
            Fuzziness::Edits(n) => n as usize,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Fuzziness::None | Fuzziness::Edits(0))
    }
}

impl FromStr for Fuzziness {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("auto") {
            return Ok(Fuzziness::Auto);
        }
        if trimmed.eq_ignore_ascii_case("none") {
            return Ok(Fuzziness::None);
        }
        match trimmed.parse::<u8>() {
            Ok(0) => Ok(Fuzziness::None),
            Ok(n) if n <= MAX_EDITS => Ok(Fuzziness::Edits(n)),
            _ => Err(HearthError::invalid_input(format!(
                "invalid fuzziness `{s}` (expected none, auto, 0, 1 or 2)"
            ))),
        }
    }
}

impl fmt::Display for Fuzziness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fuzziness::None => write!(f, "none"),
            Fuzziness::Auto => write!(f, "auto"),
            Fuzziness::Edits(n) => write!(f, "{n}"),
        }
    }
}

impl TryFrom<String> for Fuzziness {
    type Error = HearthError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Fuzziness> for String {
    fn from(value: Fuzziness) -> String {
        value.to_string()
    }
}
