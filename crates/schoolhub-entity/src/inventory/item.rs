//! Inventory item entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stocked item. `quantity` never drops below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Unique item identifier.
    pub id: Uuid,
    /// Owning school.
    pub school_id: Uuid,
    /// Item name.
    pub name: String,
    /// Item name in Bengali.
    pub name_bn: Option<String>,
    /// Free-form category, e.g. `stationery`.
    pub category: Option<String>,
    /// Unit of measure, e.g. `pcs`.
    pub unit: String,
    /// Units in stock.
    pub quantity: i32,
    /// Stock at or below this level counts as low.
    pub reorder_level: i32,
    /// Storage location.
    pub location: Option<String>,
    /// When the item was added.
    pub created_at: DateTime<Utc>,
    /// When the stock last changed.
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Whether the item needs reordering.
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }
}

/// Data required to add an item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInventoryItem {
    /// Owning school.
    pub school_id: Uuid,
    /// Item name.
    pub name: String,
    /// Item name in Bengali.
    pub name_bn: Option<String>,
    /// Category.
    pub category: Option<String>,
    /// Unit of measure.
    pub unit: String,
    /// Opening stock.
    pub quantity: i32,
    /// Reorder threshold.
    pub reorder_level: i32,
    /// Storage location.
    pub location: Option<String>,
}

impl NewInventoryItem {
    /// Materialize the row this input produces.
    pub fn into_item(self, id: Uuid, now: DateTime<Utc>) -> InventoryItem {
        InventoryItem {
            id,
            school_id: self.school_id,
            name: self.name,
            name_bn: self.name_bn,
            category: self.category,
            unit: self.unit,
            quantity: self.quantity,
            reorder_level: self.reorder_level,
            location: self.location,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_stock_threshold() {
        let mut item = NewInventoryItem {
            school_id: Uuid::new_v4(),
            name: "Chalk".into(),
            name_bn: None,
            category: None,
            unit: "box".into(),
            quantity: 5,
            reorder_level: 5,
            location: None,
        }
        .into_item(Uuid::new_v4(), Utc::now());
        assert!(item.is_low_stock());
        item.quantity = 6;
        assert!(!item.is_low_stock());
    }
}
