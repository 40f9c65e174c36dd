//! Structured cart line keys.
//!
//! A [`LineKey`] is the identity of a cart line: the product id plus the
//! sorted variant attributes. Keys are compared by value, never by a joined
//! string, so attribute values containing separators cannot collide.
//!
//! Keys also have a canonical text form used wherever a plain string is
//! required (the persisted JSON object, DOM control ids, CLI arguments):
//!
//! ```text
//! pump-1
//! pump-1?capacity=40&head=10
//! ```
//!
//! Every component is percent-encoded, so `?`, `&`, `=` and `%` only ever
//! appear as structure. A key without attributes encodes to the bare product
//! id, which keeps slots written before variant support readable.

use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::id::{ProductId, ProductIdError};
use super::variant::{AttributeError, VariantAttributes};

/// Errors that can occur when decoding a [`LineKey`] from its text form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    /// The product id component is invalid.
    #[error("invalid product id: {0}")]
    ProductId(#[from] ProductIdError),
    /// An attribute component is invalid.
    #[error("invalid attribute: {0}")]
    Attribute(#[from] AttributeError),
    /// A component is not valid percent-encoded UTF-8.
    #[error("invalid encoding in {0:?}")]
    Encoding(String),
    /// An attribute pair is missing its `=`.
    #[error("malformed attribute pair {0:?}")]
    MalformedPair(String),
    /// The same attribute name appears twice.
    #[error("duplicate attribute {0:?}")]
    DuplicateAttribute(String),
}

/// Identity of one purchasable configuration in the cart.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineKey {
    product_id: ProductId,
    attributes: VariantAttributes,
}

impl LineKey {
    /// Derive the key for a product and its selected variant attributes.
    ///
    /// Identical inputs always produce equal keys; any difference in the
    /// product id or in the attribute map produces a different key.
    #[must_use]
    pub const fn derive(product_id: ProductId, attributes: VariantAttributes) -> Self {
        Self {
            product_id,
            attributes,
        }
    }

    /// Key for a simple product with no variant attributes.
    #[must_use]
    pub const fn simple(product_id: ProductId) -> Self {
        Self::derive(product_id, VariantAttributes::new())
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        &self.product_id
    }

    #[must_use]
    pub const fn attributes(&self) -> &VariantAttributes {
        &self.attributes
    }

    /// Canonical text form of the key.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut out = urlencoding::encode(self.product_id.as_str()).into_owned();
        for (i, (name, value)) in self.attributes.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            out.push_str(&urlencoding::encode(name));
            out.push('=');
            out.push_str(&urlencoding::encode(value));
        }
        out
    }

    /// Parse a key from its text form.
    ///
    /// Attribute pairs may appear in any order.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError`] if a component fails to decode, the product id is
    /// invalid, or an attribute pair is malformed or repeated.
    pub fn decode(s: &str) -> Result<Self, KeyError> {
        let (id_part, query) = match s.split_once('?') {
            Some((id, query)) => (id, Some(query)),
            None => (s, None),
        };

        let product_id = ProductId::parse(&decode_component(id_part)?)?;
        let mut attributes = VariantAttributes::new();

        if let Some(query) = query {
            for pair in query.split('&') {
                let (name, value) = pair
                    .split_once('=')
                    .ok_or_else(|| KeyError::MalformedPair(pair.to_owned()))?;
                let name = decode_component(name)?;
                let value = decode_component(value)?;
                if attributes.get(name.trim()).is_some() {
                    return Err(KeyError::DuplicateAttribute(name));
                }
                attributes.insert(name, value)?;
            }
        }

        Ok(Self::derive(product_id, attributes))
    }
}

fn decode_component(raw: &str) -> Result<String, KeyError> {
    urlencoding::decode(raw)
        .map(std::borrow::Cow::into_owned)
        .map_err(|_| KeyError::Encoding(raw.to_owned()))
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for LineKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl Serialize for LineKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for LineKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::decode(&raw).map_err(serde::de::Error::custom)
    }
}
