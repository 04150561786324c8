//! Session Manager
//!
//! Owns the session store and the page location, and performs the three
//! session transitions the panel knows: login, logout and teardown.

use std::sync::Arc;

use medadmin_ui::Navigator;

use crate::session::{AdminUser, Session};
use crate::store::SessionStore;
use crate::Result;

pub const LOGIN_PATH: &str = "/admin/login";
pub const LOGOUT_PROMPT: &str = "确定要退出登录吗？";

/// Result of the page-load check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The login page itself, never guarded
    Public,
    /// A token is present
    Allowed,
    /// No token; the operator was sent to the login page
    Redirected,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            login_path: LOGIN_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    /// Persist a session obtained from the login endpoint
    pub fn login(&self, session: Session) -> Result<()> {
        self.store.set(&session)?;
        tracing::info!(
            username = %session.user.username,
            role = %session.user.role,
            "Admin logged in"
        );
        Ok(())
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.store.token()
    }

    /// The stored admin record, read on its own like the login page left it
    pub fn current_user(&self) -> Option<AdminUser> {
        match self.store.user() {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "Stored admin record is unreadable");
                None
            }
        }
    }

    /// Token presence check run when an admin page loads.
    ///
    /// Validity and expiry are not checked here; an expired token is caught
    /// by the first request that comes back 401.
    pub fn guard(&self, path: &str) -> GuardOutcome {
        if path.contains(&self.login_path) {
            return GuardOutcome::Public;
        }

        let has_token = match self.store.token() {
            Ok(token) => token.is_some(),
            Err(e) => {
                tracing::error!(error = %e, "Failed to read session token");
                false
            }
        };

        if has_token {
            GuardOutcome::Allowed
        } else {
            tracing::info!(path = %path, "No session token, redirecting to login");
            self.navigator.navigate(&self.login_path);
            GuardOutcome::Redirected
        }
    }

    /// Log out after the operator confirms. Returns whether the session ended.
    pub fn logout<F>(&self, confirm: F) -> Result<bool>
    where
        F: FnOnce(&str) -> bool,
    {
        if !confirm(LOGOUT_PROMPT) {
            return Ok(false);
        }

        self.store.clear()?;
        tracing::info!("Admin logged out");
        self.navigator.navigate(&self.login_path);
        Ok(true)
    }

    /// Drop the session after the server rejected its token and go to login.
    ///
    /// Always navigates, even when clearing storage fails.
    pub fn teardown(&self) {
        self.clear_for_teardown();
        self.navigator.navigate(&self.login_path);
    }

    /// Teardown on behalf of the page identified by `epoch`.
    ///
    /// Once that page has been navigated away from, this is a no-op, so a
    /// burst of rejected requests from one page leaves exactly one navigation.
    pub fn teardown_if_current(&self, epoch: u64) -> bool {
        if self.navigator.epoch() != epoch {
            return false;
        }
        self.clear_for_teardown();
        self.navigator.navigate_if_current(epoch, &self.login_path)
    }

    fn clear_for_teardown(&self) {
        if let Err(e) = self.store.clear() {
            tracing::error!(error = %e, "Failed to clear session during teardown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySessionStore, PersistentSessionStore};
    use medadmin_storage::Database;
    use medadmin_ui::Location;

    fn manager_with(store: Arc<dyn SessionStore>) -> (SessionManager, Location) {
        let location = Location::new("/admin/users");
        let manager = SessionManager::new(store, Arc::new(location.clone()));
        (manager, location)
    }

    fn sample() -> Session {
        Session::new("token-abc", AdminUser::new("admin", "super_admin"))
    }

    #[test]
    fn test_guard_redirects_without_token() {
        let (manager, location) = manager_with(Arc::new(MemorySessionStore::new()));

        assert_eq!(manager.guard("/admin/users"), GuardOutcome::Redirected);
        assert_eq!(location.current_path(), LOGIN_PATH);
        assert_eq!(location.epoch(), 1);
    }

    #[test]
    fn test_guard_skips_login_page() {
        let (manager, location) = manager_with(Arc::new(MemorySessionStore::new()));

        assert_eq!(manager.guard("/admin/login"), GuardOutcome::Public);
        assert_eq!(manager.guard("/admin/login?next=/admin/users"), GuardOutcome::Public);
        assert_eq!(location.epoch(), 0);
    }

    #[test]
    fn test_guard_only_checks_presence() {
        let (manager, location) =
            manager_with(Arc::new(MemorySessionStore::with_session(sample())));

        assert_eq!(manager.guard("/admin/dashboard"), GuardOutcome::Allowed);
        assert_eq!(location.epoch(), 0);
    }

    #[test]
    fn test_login_and_current_user() {
        let db = Database::open_in_memory().unwrap();
        let (manager, _) = manager_with(Arc::new(PersistentSessionStore::new(db)));

        assert!(manager.current_user().is_none());
        manager.login(sample()).unwrap();

        let user = manager.current_user().unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(manager.token().unwrap().as_deref(), Some("token-abc"));
    }

    #[test]
    fn test_current_user_tolerates_corrupt_record() {
        let db = Database::open_in_memory().unwrap();
        db.set_items(&[("admin_token", "t"), ("admin_user", "{broken")])
            .unwrap();
        let (manager, _) = manager_with(Arc::new(PersistentSessionStore::new(db)));

        assert!(manager.current_user().is_none());
    }

    #[test]
    fn test_current_user_without_token() {
        let db = Database::open_in_memory().unwrap();
        db.set_item("admin_user", r#"{"username":"editor","role":"admin"}"#)
            .unwrap();
        let (manager, _) = manager_with(Arc::new(PersistentSessionStore::new(db)));

        assert_eq!(manager.token().unwrap(), None);
        assert_eq!(manager.current_user().unwrap().username, "editor");
    }

    #[test]
    fn test_logout_declined_keeps_session() {
        let (manager, location) =
            manager_with(Arc::new(MemorySessionStore::with_session(sample())));

        let mut prompt = String::new();
        let ended = manager
            .logout(|message| {
                prompt = message.to_string();
                false
            })
            .unwrap();

        assert!(!ended);
        assert_eq!(prompt, LOGOUT_PROMPT);
        assert!(manager.token().unwrap().is_some());
        assert_eq!(location.epoch(), 0);
    }

    #[test]
    fn test_logout_confirmed_clears_and_navigates() {
        let db = Database::open_in_memory().unwrap();
        let store = PersistentSessionStore::new(db.clone());
        store.set(&sample()).unwrap();
        let (manager, location) = manager_with(Arc::new(store));

        assert!(manager.logout(|_| true).unwrap());
        assert!(db.get_item("admin_token").unwrap().is_none());
        assert!(db.get_item("admin_user").unwrap().is_none());
        assert_eq!(location.visited(), vec![LOGIN_PATH]);
    }

    #[test]
    fn test_teardown_if_current_runs_once_per_page() {
        let (manager, location) =
            manager_with(Arc::new(MemorySessionStore::with_session(sample())));
        let epoch = location.epoch();

        assert!(manager.teardown_if_current(epoch));
        assert!(!manager.teardown_if_current(epoch));
        assert!(manager.token().unwrap().is_none());
        assert_eq!(location.visited(), vec![LOGIN_PATH]);
    }

    #[test]
    fn test_teardown_uses_custom_login_path() {
        let location = Location::new("/panel/orders");
        let manager = SessionManager::new(
            Arc::new(MemorySessionStore::with_session(sample())),
            Arc::new(location.clone()),
        )
        .with_login_path("/panel/login");

        manager.teardown();
        assert!(manager.token().unwrap().is_none());
        assert_eq!(location.current_path(), "/panel/login");
    }
}
