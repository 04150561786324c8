//! Admin panel state container
//!
//! One panel per operator window. Pages go through it for the guard check,
//! API calls, tables, alerts and logout.

use serde_json::Value;
use std::sync::Arc;

use medadmin_http::{AuthenticatedClient, Method, RequestDescriptor};
use medadmin_session::{AdminUser, GuardOutcome, PersistentSessionStore, Session, SessionManager};
use medadmin_storage::Database;
use medadmin_table::{ColumnSpec, GridHandle, TableBinding, TableConfig};
use medadmin_ui::{Alert, AlertCenter, Location, Navigator, Notifier, Severity};

use crate::config::Config;
use crate::error::CoreError;
use crate::Result;

pub struct AdminPanel {
    config: Config,
    db: Database,
    /// Current page; every hard navigation bumps its epoch
    location: Location,
    alerts: AlertCenter,
    sessions: SessionManager,
    client: AuthenticatedClient,
    tables: TableBinding,
}

impl AdminPanel {
    /// Open the panel's database and wire everything to it.
    /// `initial_path` is the page being loaded.
    pub fn new(config: Config, initial_path: &str) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db, initial_path)
    }

    pub fn with_database(config: Config, db: Database, initial_path: &str) -> Result<Self> {
        let location = Location::new(initial_path);
        let alerts = AlertCenter::with_ttl(config.alert_ttl());

        let store = PersistentSessionStore::new(db.clone());
        let sessions = SessionManager::new(Arc::new(store), Arc::new(location.clone()))
            .with_login_path(config.login_path.clone());

        let mut builder = AuthenticatedClient::builder(sessions.clone())
            .base_url(config.base_url()?)
            .notifier(Arc::new(alerts.clone()));
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let tables = TableBinding::with_config(
            client.clone(),
            TableConfig::default().with_page_length(config.page_length),
        );

        tracing::info!(
            base_url = %config.base_url,
            path = %initial_path,
            "Admin panel initialized"
        );

        Ok(Self {
            config,
            db,
            location,
            alerts,
            sessions,
            client,
            tables,
        })
    }

    // === Session ===

    /// Token check for the current page
    pub fn guard(&self) -> GuardOutcome {
        self.sessions.guard(&self.location.current_path())
    }

    /// Load `path` as the current page and run the guard for it
    pub fn enter(&self, path: &str) -> GuardOutcome {
        self.location.set_path(path);
        self.guard()
    }

    pub fn login(&self, token: &str, user: AdminUser) -> Result<()> {
        self.sessions.login(Session::new(token, user))?;
        Ok(())
    }

    /// Store the session from a login response, either the bare payload or
    /// wrapped in the `{success, data}` envelope
    pub fn login_with_response(&self, body: &Value) -> Result<AdminUser> {
        let data = body.get("data").filter(|d| d.is_object()).unwrap_or(body);
        let session = Session::from_login_response(data).ok_or_else(|| {
            CoreError::Config("login response has no access token or user".to_string())
        })?;
        let user = session.user.clone();
        self.sessions.login(session)?;
        Ok(user)
    }

    pub fn current_user(&self) -> Option<AdminUser> {
        self.sessions.current_user()
    }

    pub fn logout<F>(&self, confirm: F) -> Result<bool>
    where
        F: FnOnce(&str) -> bool,
    {
        Ok(self.sessions.logout(confirm)?)
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    // === Requests ===

    pub async fn request(&self, descriptor: RequestDescriptor) {
        self.client.request(descriptor).await
    }

    pub fn spawn_request(&self, descriptor: RequestDescriptor) -> tokio::task::JoinHandle<()> {
        self.client.spawn(descriptor)
    }

    pub async fn send(&self, method: Method, url: &str, payload: Option<&Value>) -> Result<Value> {
        Ok(self.client.send(method, url, payload).await?)
    }

    pub fn client(&self) -> &AuthenticatedClient {
        &self.client
    }

    // === Tables ===

    pub fn initialize_table(
        &self,
        table_id: &str,
        columns: Vec<ColumnSpec>,
        endpoint: &str,
    ) -> Result<GridHandle> {
        Ok(self.tables.initialize(table_id, columns, endpoint)?)
    }

    // === Alerts ===

    pub fn show_alert(&self, message: &str, severity: Severity) {
        self.alerts.show(message, severity);
    }

    pub fn current_alert(&self) -> Option<Alert> {
        self.alerts.current()
    }

    pub fn alerts(&self) -> &AlertCenter {
        &self.alerts
    }

    // === Config ===

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Clone for AdminPanel {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            db: self.db.clone(),
            location: self.location.clone(),
            alerts: self.alerts.clone(),
            sessions: self.sessions.clone(),
            client: self.client.clone(),
            tables: self.tables.clone(),
        }
    }
}
