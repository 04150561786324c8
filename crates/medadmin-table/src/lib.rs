//! MedChina Admin Data Tables
//!
//! Binds a grid to a server-side paginated endpoint:
//! - the server does paging, search and sorting; the grid only holds one page
//! - every page change, search, length change or sort is a new fetch
//! - fetches go through the authenticated client, so a 401 during paging
//!   tears the session down exactly like any other request

mod column;
mod error;
mod grid;
mod language;
mod query;
mod response;

pub use column::{ColumnRender, ColumnSpec};
pub use error::TableError;
pub use grid::{GridHandle, TableBinding, TableConfig, DEFAULT_PAGE_LENGTH, PAGE_LENGTH_OPTIONS};
pub use language::{GridLanguage, Paginate};
pub use query::{SortDirection, SortSpec, TableQuery};
pub use response::TablePage;

pub type Result<T> = std::result::Result<T, TableError>;
