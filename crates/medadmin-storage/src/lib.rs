//! MedChina Admin Storage Layer
//!
//! Persistent client storage for the admin panel: a small key/value table
//! kept in SQLite. Multi-key writes go through a single transaction.

mod database;
mod error;
mod migrations;

pub use database::Database;
pub use error::StorageError;

pub type Result<T> = std::result::Result<T, StorageError>;
