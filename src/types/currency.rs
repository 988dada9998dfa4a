//! Currency codes
//!
//! Currencies are carried around as upper-cased three-letter codes. The
//! engine never hardcodes which codes exist; support for a code is decided
//! by the configured rate table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A currency code such as `USD` or `EUR`
///
/// Codes are normalized to upper case on construction so that `usd` and
/// `USD` compare equal and hash to the same group key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Create a currency code without validating its shape
    ///
    /// Used for arbitrary lookups against the rate table, where an
    /// unknown or malformed code should surface as an unsupported pair
    /// rather than a parse failure.
    pub fn new(code: &str) -> Self {
        Currency(code.trim().to_ascii_uppercase())
    }

    /// Parse a currency code, requiring exactly three ASCII letters
    ///
    /// # Errors
    ///
    /// Returns a description of the problem if the trimmed input is not
    /// three ASCII alphabetic characters.
    pub fn parse(code: &str) -> Result<Self, String> {
        let trimmed = code.trim();
        if trimmed.len() == 3 && trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Currency::new(trimmed))
        } else {
            Err(format!("Invalid currency code '{}'", code))
        }
    }

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Currency {
    fn from(code: &str) -> Self {
        Currency::new(code)
    }
}
