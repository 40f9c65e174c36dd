//! Product identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`ProductId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductIdError {
    /// The input is empty (or only whitespace).
    #[error("product id cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("product id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A storefront product identifier, e.g. `pump-1`.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed
/// - Length: 1-128 characters after trimming
///
/// Any other character is allowed. Identity comparisons never rely on
/// separators, so ids containing `?`, `&` or `=` are fine.
///
/// ## Examples
///
/// ```
/// use storecart_core::ProductId;
///
/// assert!(ProductId::parse("pump-1").is_ok());
/// assert_eq!(ProductId::parse("  pump-1 ").unwrap().as_str(), "pump-1");
/// assert!(ProductId::parse("   ").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Maximum length of a product id, in characters.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `ProductId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or longer than
    /// [`Self::MAX_LENGTH`] characters.
    pub fn parse(s: &str) -> Result<Self, ProductIdError> {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return Err(ProductIdError::Empty);
        }

        if trimmed.chars().count() > Self::MAX_LENGTH {
            return Err(ProductIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `ProductId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = ProductIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductId {
    type Error = ProductIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let id = ProductId::parse("pump-1").unwrap();
        assert_eq!(id.as_str(), "pump-1");
        assert_eq!(id.to_string(), "pump-1");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id = ProductId::parse("\tpump-1  ").unwrap();
        assert_eq!(id.as_str(), "pump-1");
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(ProductId::parse(""), Err(ProductIdError::Empty));
        assert_eq!(ProductId::parse("   "), Err(ProductIdError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "p".repeat(ProductId::MAX_LENGTH + 1);
        assert_eq!(
            ProductId::parse(&long),
            Err(ProductIdError::TooLong {
                max: ProductId::MAX_LENGTH
            })
        );

        let max = "p".repeat(ProductId::MAX_LENGTH);
        assert!(ProductId::parse(&max).is_ok());
    }

    #[test]
    fn test_separators_allowed() {
        let id = ProductId::parse("pump?head=10&x").unwrap();
        assert_eq!(id.as_str(), "pump?head=10&x");
    }

    #[test]
    fn test_serde_roundtrip() {
        let id = ProductId::parse("pump-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"pump-1\"");
        let back: ProductId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_serde_rejects_empty() {
        let result: Result<ProductId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
