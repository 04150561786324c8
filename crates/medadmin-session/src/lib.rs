//! MedChina Admin Session Management
//!
//! - A session is the bearer token plus the admin record returned at login
//! - Token and user are written and removed together, never one without the other
//! - Every admin page except login requires a token to be present
//! - A rejected token tears the session down and sends the operator to login

mod error;
mod manager;
mod session;
mod store;

pub use error::SessionError;
pub use manager::{GuardOutcome, SessionManager, LOGIN_PATH, LOGOUT_PROMPT};
pub use session::{AdminUser, Session, TOKEN_KEY, USER_KEY};
pub use store::{MemorySessionStore, PersistentSessionStore, SessionStore};

pub type Result<T> = std::result::Result<T, SessionError>;
