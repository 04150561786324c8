//! What happens when the server rejects the session token

use medadmin_session::SessionManager;
use url::Url;

pub trait AuthErrorPolicy: Send + Sync {
    /// Called once for a 401 response. `page_epoch` identifies the page the
    /// request was issued from.
    fn on_unauthorized(&self, url: &Url, page_epoch: u64);
}

/// Clear token and user, then send the operator to the login page
#[derive(Clone)]
pub struct TeardownPolicy {
    sessions: SessionManager,
}

impl TeardownPolicy {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }
}

impl AuthErrorPolicy for TeardownPolicy {
    fn on_unauthorized(&self, url: &Url, page_epoch: u64) {
        if self.sessions.teardown_if_current(page_epoch) {
            tracing::warn!(url = %url, "Session rejected by server, returned to login");
        } else {
            tracing::debug!(url = %url, "Session already torn down for this page");
        }
    }
}

/// Leaves the session alone; for tests and tools that handle 401 themselves
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPolicy;

impl AuthErrorPolicy for NoopPolicy {
    fn on_unauthorized(&self, url: &Url, _page_epoch: u64) {
        tracing::debug!(url = %url, "Ignoring 401");
    }
}
