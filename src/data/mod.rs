//! Data persistence layer
//!
//! SQLite-backed key-value storage for history and shared state, with an
//! in-memory fallback when the database is unavailable.

mod app_state;
mod database;
mod migrations;
mod store;

pub use app_state::AppStateStore;
pub use database::{Database, DatabaseError};
pub use store::{open_store, DurableStore, MemoryStore, SqliteStore, StoreError};
