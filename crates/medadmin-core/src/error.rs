//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] medadmin_storage::StorageError),

    #[error("Session error: {0}")]
    Session(#[from] medadmin_session::SessionError),

    #[error("API error: {0}")]
    Api(#[from] medadmin_http::ApiError),

    #[error("Table error: {0}")]
    Table(#[from] medadmin_table::TableError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}
