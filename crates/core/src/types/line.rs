//! A single cart line.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::key::LineKey;
use super::variant::VariantAttributes;

/// One purchasable configuration the shopper selected, with its quantity.
///
/// Lines only exist with `quantity >= 1`; the [`Cart`](super::Cart) deletes a
/// line instead of keeping it at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    key: LineKey,
    display_name: String,
    image: Option<String>,
    quantity: u32,
    added_at: DateTime<Utc>,
}

impl CartLine {
    pub(crate) const fn new(
        key: LineKey,
        display_name: String,
        image: Option<String>,
        quantity: u32,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            display_name,
            image,
            quantity,
            added_at,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &LineKey {
        &self.key
    }

    #[must_use]
    pub const fn product_id(&self) -> &ProductId {
        self.key.product_id()
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Variant attributes this line was added with.
    #[must_use]
    pub const fn variant_attributes(&self) -> &VariantAttributes {
        self.key.attributes()
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Always at least 1.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Time of first insertion. Increments never change it.
    #[must_use]
    pub const fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

/// Persisted shape of a line, keyed by the encoded [`LineKey`].
///
/// Matches the record the storefront script has always written:
/// `{"name", "image", "quantity", "addedAt"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Signed so that corrupt zero/negative counts parse and can be dropped.
    pub quantity: i64,
    #[serde(default = "epoch")]
    pub added_at: DateTime<Utc>,
}

const fn epoch() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH
}

impl From<&CartLine> for StoredLine {
    fn from(line: &CartLine) -> Self {
        Self {
            name: line.display_name.clone(),
            image: line.image.clone(),
            quantity: i64::from(line.quantity),
            added_at: line.added_at,
        }
    }
}
