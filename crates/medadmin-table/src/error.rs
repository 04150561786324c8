//! Table error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Table id cannot be empty")]
    EmptyTableId,

    #[error("A table needs at least one column")]
    NoColumns,

    #[error("Table endpoint cannot be empty")]
    EmptyEndpoint,

    #[error("Page length {0} is not one of the selectable sizes")]
    UnknownPageLength(usize),

    #[error("Page {0} is beyond any addressable row")]
    PageOutOfRange(usize),

    #[error("Column {0} does not exist")]
    ColumnOutOfRange(usize),

    #[error("Column {0} is not orderable")]
    ColumnNotOrderable(usize),

    #[error("API error: {0}")]
    Api(#[from] medadmin_http::ApiError),

    #[error("Malformed table response: {0}")]
    MalformedResponse(String),

    /// A newer draw was issued while this one was in flight
    #[error("Draw {0} was superseded by a newer draw")]
    Stale(u64),
}
