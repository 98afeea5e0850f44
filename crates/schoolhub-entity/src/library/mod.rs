//! Library catalogue.

pub mod model;

pub use model::{LibraryBook, NewBook};
