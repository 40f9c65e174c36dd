//! The cart state machine.
//!
//! [`Cart`] holds the lines in insertion order and implements every state
//! transition the store performs: add, increment, decrement, remove, clear.
//! It has no notion of storage or time; the caller supplies `now` and
//! persists the result through [`Cart::to_json`] / [`Cart::from_json`].

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use super::id::ProductId;
use super::key::LineKey;
use super::line::{CartLine, StoredLine};

/// Errors that can occur when decoding a persisted cart.
#[derive(thiserror::Error, Debug)]
pub enum CartFormatError {
    /// The value is not a JSON object of line records.
    #[error("cart is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result of [`Cart::decrement`] on a present line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decrement {
    /// The line is still present with the new quantity.
    Decremented {
        /// Quantity after the decrement (at least 1).
        quantity: u32,
    },
    /// The quantity reached zero and the line was deleted.
    Removed,
}

/// A cart decoded from its persisted form.
#[derive(Debug, Clone, Default)]
pub struct DecodedCart {
    pub cart: Cart,
    /// Entries skipped because their key or record was unusable.
    pub dropped: usize,
}

/// Insertion-ordered mapping from [`LineKey`] to [`CartLine`].
///
/// ## Invariants
///
/// - Keys are unique
/// - No line has a quantity below 1
///
/// ## Examples
///
/// ```
/// use chrono::Utc;
/// use storecart_core::{Cart, LineKey, ProductId};
///
/// let key = LineKey::simple(ProductId::parse("pump-1").unwrap());
/// let mut cart = Cart::new();
/// cart.add(key.clone(), "Pump A", None, Utc::now());
/// cart.add(key.clone(), "Pump A", None, Utc::now());
///
/// assert_eq!(cart.len(), 1);
/// assert_eq!(cart.total_quantity(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: IndexMap<LineKey, CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &LineKey) -> bool {
        self.lines.contains_key(key)
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &CartLine> {
        self.lines.values()
    }

    /// Sum of all line quantities; 0 for an empty cart.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.lines.values().map(|line| u64::from(line.quantity())).sum()
    }

    #[must_use]
    pub fn has_items(&self) -> bool {
        self.total_quantity() > 0
    }

    /// Add one unit of `key`.
    ///
    /// An existing line is incremented and keeps its name, image and
    /// `added_at`. A new line starts at quantity 1 with `added_at = now`.
    pub fn add(
        &mut self,
        key: LineKey,
        display_name: impl Into<String>,
        image: Option<String>,
        now: DateTime<Utc>,
    ) -> &CartLine {
        let line = self
            .lines
            .entry(key)
            .and_modify(|line| line.set_quantity(line.quantity().saturating_add(1)))
            .or_insert_with_key(|key| {
                CartLine::new(key.clone(), display_name.into(), image, 1, now)
            });
        &*line
    }

    /// Add one unit to an existing line. Returns the new quantity, or `None`
    /// if the key is absent (the cart is unchanged).
    pub fn increment(&mut self, key: &LineKey) -> Option<u32> {
        let line = self.lines.get_mut(key)?;
        line.set_quantity(line.quantity().saturating_add(1));
        Some(line.quantity())
    }

    /// Remove one unit from an existing line, deleting it at zero.
    ///
    /// Returns `None` if the key is absent (the cart is unchanged).
    pub fn decrement(&mut self, key: &LineKey) -> Option<Decrement> {
        let line = self.lines.get_mut(key)?;
        let quantity = line.quantity().saturating_sub(1);
        if quantity == 0 {
            self.lines.shift_remove(key);
            return Some(Decrement::Removed);
        }
        line.set_quantity(quantity);
        Some(Decrement::Decremented { quantity })
    }

    /// Delete a line regardless of quantity. Returns the removed line.
    pub fn remove(&mut self, key: &LineKey) -> Option<CartLine> {
        self.lines.shift_remove(key)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Serialize to the persisted JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, CartFormatError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a persisted JSON object.
    ///
    /// Entries with an unusable key, a malformed record or a quantity below 1
    /// are skipped and counted in [`DecodedCart::dropped`]. Entries whose keys
    /// decode to the same [`LineKey`] are merged into the first.
    ///
    /// A key that is not a valid encoded [`LineKey`] is read as a bare product
    /// id, as written by earlier storefronts (`pump?1`, `50%off`).
    ///
    /// # Errors
    ///
    /// Returns [`CartFormatError::Json`] if `raw` is not a JSON object.
    pub fn from_json(raw: &str) -> Result<DecodedCart, CartFormatError> {
        let entries: IndexMap<String, serde_json::Value> = serde_json::from_str(raw)?;
        let mut decoded = DecodedCart::default();

        for (raw_key, value) in entries {
            let Some(key) = LineKey::decode(&raw_key)
                .ok()
                .or_else(|| ProductId::parse(&raw_key).ok().map(LineKey::simple))
            else {
                decoded.dropped += 1;
                continue;
            };
            let Ok(stored) = serde_json::from_value::<StoredLine>(value) else {
                decoded.dropped += 1;
                continue;
            };
            if stored.quantity < 1 {
                decoded.dropped += 1;
                continue;
            }
            let quantity = u32::try_from(stored.quantity).unwrap_or(u32::MAX);

            match decoded.cart.lines.get_mut(&key) {
                Some(existing) => {
                    existing.set_quantity(existing.quantity().saturating_add(quantity));
                }
                None => {
                    let line =
                        CartLine::new(key.clone(), stored.name, stored.image, quantity, stored.added_at);
                    decoded.cart.lines.insert(key, line);
                }
            }
        }

        Ok(decoded)
    }
}

impl Serialize for Cart {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.lines
                .iter()
                .map(|(key, line)| (key.encode(), StoredLine::from(line))),
        )
    }
}
