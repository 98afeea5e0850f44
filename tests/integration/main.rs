//! In-process API tests against the in-memory store.

mod helpers;

mod credit_test;
mod document_test;
mod error_test;
mod notification_test;
