//! SQLite-backed storage implementation.

mod config;
mod fields;
mod issues;
pub mod schema;
mod store;

pub use store::SqliteStore;
