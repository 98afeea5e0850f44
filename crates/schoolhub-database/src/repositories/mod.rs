//! PostgreSQL implementations of the store traits.

pub mod document;
pub mod health;
pub mod inventory;
pub mod ledger;
pub mod library;
pub mod notification;
pub mod roster;
pub mod user;

pub use document::DocumentRepository;
pub use health::HealthRepository;
pub use inventory::InventoryRepository;
pub use ledger::LedgerRepository;
pub use library::LibraryRepository;
pub use notification::NotificationRepository;
pub use roster::RosterRepository;
pub use user::UserRepository;

/// `%needle%` for `ILIKE`, with the pattern metacharacters escaped.
pub(crate) fn like_pattern(needle: &str) -> String {
    let escaped = needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn test_like_pattern_escapes() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
