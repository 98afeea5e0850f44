//! School inventory and stock movements.

pub mod item;
pub mod movement;

pub use item::{InventoryItem, NewInventoryItem};
pub use movement::{NewStockMovement, StockMovement};
