//! Inventory item and stock movement models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A unique identifier for an inventory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(Uuid);

impl ItemId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A unique identifier for a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MovementId(Uuid);

impl MovementId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for MovementId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MovementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MovementId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A tracked supply item (incense, candles, offerings, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    /// Counting unit, e.g. "box", "bundle"
    pub unit: String,
    pub quantity: i64,
    /// Restock warning threshold
    #[serde(default)]
    pub safety_stock: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl InventoryItem {
    #[must_use]
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: ItemId::new(),
            name: name.into(),
            unit: unit.into(),
            quantity: 0,
            safety_stock: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the quantity has fallen to or below the safety threshold
    #[must_use]
    pub const fn needs_restock(&self) -> bool {
        self.safety_stock > 0 && self.quantity <= self.safety_stock
    }
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    In,
    Out,
}

impl MovementKind {
    /// Signed multiplier for quantity arithmetic
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::In => 1,
            Self::Out => -1,
        }
    }
}

/// A single addition or removal of stock for an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    pub item_id: ItemId,
    pub kind: MovementKind,
    pub quantity: i64,
    /// When the stock changed hands (Unix ms)
    pub occurred_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: i64,
}

impl StockMovement {
    #[must_use]
    pub fn new(item_id: ItemId, kind: MovementKind, quantity: i64) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            id: MovementId::new(),
            item_id,
            kind,
            quantity,
            occurred_at: now,
            note: None,
            created_at: now,
        }
    }

    /// Quantity with the movement direction's sign applied
    #[must_use]
    pub const fn signed_quantity(&self) -> i64 {
        self.quantity * self.kind.sign()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_item_starts_empty() {
        let item = InventoryItem::new("Incense sticks", "box");
        assert_eq!(item.quantity, 0);
        assert!(!item.needs_restock());
    }

    #[test]
    fn test_needs_restock_threshold() {
        let mut item = InventoryItem::new("Candles", "pack");
        item.safety_stock = 5;
        item.quantity = 6;
        assert!(!item.needs_restock());
        item.quantity = 5;
        assert!(item.needs_restock());
    }

    #[test]
    fn test_movement_signed_quantity() {
        let item = InventoryItem::new("Candles", "pack");
        let inbound = StockMovement::new(item.id, MovementKind::In, 10);
        let outbound = StockMovement::new(item.id, MovementKind::Out, 4);
        assert_eq!(inbound.signed_quantity(), 10);
        assert_eq!(outbound.signed_quantity(), -4);
    }
}
