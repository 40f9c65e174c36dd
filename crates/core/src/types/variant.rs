//! Variant attributes selected for a configurable product.

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building [`VariantAttributes`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AttributeError {
    /// The attribute name is empty (or only whitespace).
    #[error("attribute name cannot be empty")]
    EmptyName,
}

/// Attribute name → value pairs, e.g. `{head: "10", capacity: "40"}`.
///
/// Pairs are kept sorted by name so two maps built in a different order
/// compare (and key) equal. Simple products carry an empty map.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct VariantAttributes(BTreeMap<String, String>);

impl VariantAttributes {
    /// An empty attribute set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build an attribute set from name/value pairs.
    ///
    /// Later pairs overwrite earlier ones with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::EmptyName`] if any name is blank.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AttributeError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut attributes = Self::new();
        for (name, value) in pairs {
            attributes.insert(name, value)?;
        }
        Ok(attributes)
    }

    /// Builder-style insert.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::EmptyName`] if `name` is blank.
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, AttributeError> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Insert an attribute, returning the previous value for that name.
    ///
    /// Names are trimmed; values are stored as given.
    ///
    /// # Errors
    ///
    /// Returns [`AttributeError::EmptyName`] if `name` is blank.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Option<String>, AttributeError> {
        let name = name.into();
        let name = name.trim();
        if name.is_empty() {
            return Err(AttributeError::EmptyName);
        }
        Ok(self.0.insert(name.to_owned(), value.into()))
    }

    /// Value for an attribute name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterate pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Renders as `capacity: 40, head: 10`.
impl fmt::Display for VariantAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}

impl TryFrom<BTreeMap<String, String>> for VariantAttributes {
    type Error = AttributeError;

    fn try_from(map: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(map)
    }
}

impl From<VariantAttributes> for BTreeMap<String, String> {
    fn from(attributes: VariantAttributes) -> Self {
        attributes.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_independent_equality() {
        let a = VariantAttributes::from_pairs([("head", "10"), ("capacity", "40")]).unwrap();
        let b = VariantAttributes::from_pairs([("capacity", "40"), ("head", "10")]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = VariantAttributes::new().with("  ", "10");
        assert_eq!(result, Err(AttributeError::EmptyName));
    }

    #[test]
    fn test_names_trimmed() {
        let attrs = VariantAttributes::new().with(" head ", "10").unwrap();
        assert_eq!(attrs.get("head"), Some("10"));
    }

    #[test]
    fn test_insert_overwrites() {
        let mut attrs = VariantAttributes::new();
        assert_eq!(attrs.insert("head", "10").unwrap(), None);
        assert_eq!(attrs.insert("head", "20").unwrap(), Some("10".to_string()));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_display() {
        let attrs = VariantAttributes::from_pairs([("head", "10"), ("capacity", "40")]).unwrap();
        assert_eq!(attrs.to_string(), "capacity: 40, head: 10");
        assert_eq!(VariantAttributes::new().to_string(), "");
    }

    #[test]
    fn test_serde_as_map() {
        let attrs = VariantAttributes::new().with("head", "10").unwrap();
        let json = serde_json::to_string(&attrs).unwrap();
        assert_eq!(json, r#"{"head":"10"}"#);
        let back: VariantAttributes = serde_json::from_str(&json).unwrap();
        assert_eq!(back, attrs);

        let bad: Result<VariantAttributes, _> = serde_json::from_str(r#"{"":"x"}"#);
        assert!(bad.is_err());
    }
}
