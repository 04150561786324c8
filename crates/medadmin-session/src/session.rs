//! Session data structure

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TOKEN_KEY: &str = "admin_token";
pub const USER_KEY: &str = "admin_user";

/// The admin record handed out by the login endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub username: String,
    #[serde(default)]
    pub role: String,
    /// Fields the panel does not interpret, kept so they survive a round trip
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdminUser {
    pub fn new(username: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: role.into(),
            extra: Map::new(),
        }
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == "super_admin"
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque bearer token
    pub token: String,
    pub user: AdminUser,
}

impl Session {
    pub fn new(token: impl Into<String>, user: AdminUser) -> Self {
        Self {
            token: token.into(),
            user,
        }
    }

    /// Build a session from the login endpoint's `data` payload:
    /// `{"access_token": "...", "token_type": "bearer", "admin": {...}}`
    pub fn from_login_response(data: &Value) -> Option<Self> {
        let token = data.get("access_token")?.as_str()?;
        let user: AdminUser = serde_json::from_value(data.get("admin")?.clone()).ok()?;
        Some(Self::new(token, user))
    }
}
