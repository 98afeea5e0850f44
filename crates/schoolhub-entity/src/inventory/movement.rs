//! Stock movement log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One signed change to an item's stock. Append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    /// Unique movement identifier.
    pub id: Uuid,
    /// The item that moved.
    pub item_id: Uuid,
    /// Signed change in units.
    pub delta: i32,
    /// Why the stock moved.
    pub reason: String,
    /// Stock right after the movement.
    pub quantity_after: i32,
    /// Who recorded it.
    pub created_by: Option<Uuid>,
    /// When it was recorded.
    pub created_at: DateTime<Utc>,
}

/// Input to a stock movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockMovement {
    /// The item to move.
    pub item_id: Uuid,
    /// Signed change; must not be zero.
    pub delta: i32,
    /// Why the stock moved.
    pub reason: String,
    /// Who is recording it.
    pub created_by: Option<Uuid>,
}
