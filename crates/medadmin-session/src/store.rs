//! Session stores
//!
//! `set` and `clear` always act on token and user as one unit.

use parking_lot::RwLock;
use std::sync::Arc;

use medadmin_storage::Database;

use crate::error::SessionError;
use crate::session::{AdminUser, Session, TOKEN_KEY, USER_KEY};
use crate::Result;

pub trait SessionStore: Send + Sync {
    /// The full session, `None` unless both token and user are stored
    fn get(&self) -> Result<Option<Session>>;

    fn set(&self, session: &Session) -> Result<()>;

    fn clear(&self) -> Result<()>;

    /// Token alone; an empty stored token counts as absent
    fn token(&self) -> Result<Option<String>>;

    /// Admin record alone, whether or not a token is stored
    fn user(&self) -> Result<Option<AdminUser>>;
}

/// Session kept in the panel's persistent local storage
#[derive(Clone)]
pub struct PersistentSessionStore {
    db: Database,
}

impl PersistentSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SessionStore for PersistentSessionStore {
    fn get(&self) -> Result<Option<Session>> {
        let mut values = self.db.get_items(&[TOKEN_KEY, USER_KEY])?.into_iter();
        let token = values.next().flatten().filter(|t| !t.is_empty());
        let user_json = values.next().flatten();

        match (token, user_json) {
            (Some(token), Some(user_json)) => {
                let user: AdminUser = serde_json::from_str(&user_json)?;
                Ok(Some(Session { token, user }))
            }
            (Some(_), None) => {
                tracing::warn!("Stored token has no matching admin record");
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn set(&self, session: &Session) -> Result<()> {
        if session.token.is_empty() {
            return Err(SessionError::EmptyToken);
        }

        let user_json = serde_json::to_string(&session.user)?;
        self.db.set_items(&[
            (TOKEN_KEY, session.token.as_str()),
            (USER_KEY, user_json.as_str()),
        ])?;

        tracing::info!(username = %session.user.username, "Stored admin session");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.db.remove_items(&[TOKEN_KEY, USER_KEY])?;
        tracing::info!("Cleared admin session");
        Ok(())
    }

    fn token(&self) -> Result<Option<String>> {
        Ok(self.db.get_item(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    fn user(&self) -> Result<Option<AdminUser>> {
        match self.db.get_item(USER_KEY)? {
            Some(user_json) => Ok(Some(serde_json::from_str(&user_json)?)),
            None => Ok(None),
        }
    }
}

/// Process-local session, for tools that must not touch disk and for tests
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<RwLock<Option<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(Some(session))),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<Session>> {
        Ok(self.session.read().clone())
    }

    fn set(&self, session: &Session) -> Result<()> {
        if session.token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        *self.session.write() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.session.write().take();
        Ok(())
    }

    fn token(&self) -> Result<Option<String>> {
        Ok(self.session.read().as_ref().map(|s| s.token.clone()))
    }

    fn user(&self) -> Result<Option<AdminUser>> {
        Ok(self.session.read().as_ref().map(|s| s.user.clone()))
    }
}
