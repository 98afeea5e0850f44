//! School record services.

pub mod inventory;
pub mod library;
pub mod roster;

pub use inventory::InventoryService;
pub use library::LibraryService;
pub use roster::RosterService;
