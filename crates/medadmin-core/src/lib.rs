//! MedChina Admin Core
//!
//! Coordination layer for the admin panel pages.
//! The panel owns the session, the current location, the alert area and the
//! API client; pages only describe requests and tables.

mod config;
mod error;
mod panel;

pub use config::Config;
pub use error::CoreError;
pub use panel::AdminPanel;

// Re-export core components
pub use medadmin_http::{
    ApiError, AuthErrorPolicy, AuthenticatedClient, Method, NoopPolicy, RequestDescriptor,
    TeardownPolicy, FALLBACK_MESSAGE,
};
pub use medadmin_session::{
    AdminUser, GuardOutcome, Session, SessionError, SessionManager, SessionStore, LOGIN_PATH,
    LOGOUT_PROMPT,
};
pub use medadmin_storage::{Database, StorageError};
pub use medadmin_table::{
    ColumnRender, ColumnSpec, GridHandle, SortDirection, TableBinding, TableConfig, TableError,
    TablePage,
};
pub use medadmin_ui::{
    escape_html, format_date, format_number, Alert, AlertCenter, Location, Navigator, Notifier,
    Severity,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}
