//! Alert / toast notices
//!
//! At most one alert is visible. Showing a new one removes the old one, and
//! every alert dismisses itself after the configured TTL.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::format::escape_html;

pub const DEFAULT_ALERT_TTL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Danger,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Danger => "danger",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "success" => Ok(Severity::Success),
            "warning" => Ok(Severity::Warning),
            "danger" => Ok(Severity::Danger),
            _ => Err(format!("Unknown alert severity: {}", s)),
        }
    }
}

/// Anything that can put a notice in front of the operator
pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, severity: Severity);
}

#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: String,
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    shown_at: Instant,
}

impl Alert {
    fn new(message: &str, severity: Severity) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            message: message.to_string(),
            severity,
            created_at: Utc::now(),
            shown_at: Instant::now(),
        }
    }

    /// Dismissible alert markup; the message is escaped
    pub fn render_html(&self) -> String {
        format!(
            concat!(
                "<div class=\"alert alert-{} alert-dismissible fade show\" role=\"alert\">",
                "{}",
                "<button type=\"button\" class=\"btn-close\" data-bs-dismiss=\"alert\"></button>",
                "</div>"
            ),
            self.severity.as_str(),
            escape_html(Some(&self.message)),
        )
    }
}

#[derive(Clone)]
pub struct AlertCenter {
    current: Arc<RwLock<Option<Alert>>>,
    ttl: Duration,
}

impl AlertCenter {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_ALERT_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            current: Arc::new(RwLock::new(None)),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The visible alert, if any and not yet expired
    pub fn current(&self) -> Option<Alert> {
        self.current
            .read()
            .as_ref()
            .filter(|alert| alert.shown_at.elapsed() < self.ttl)
            .cloned()
    }

    pub fn dismiss(&self) {
        if let Some(alert) = self.current.write().take() {
            tracing::debug!(alert_id = %alert.id, "Dismissed alert");
        }
    }

    fn schedule_expiry(&self, alert_id: String) {
        // Without a runtime the lazy check in `current` still hides the alert
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let current = Arc::clone(&self.current);
        let ttl = self.ttl;
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            let mut slot = current.write();
            if slot.as_ref().is_some_and(|alert| alert.id == alert_id) {
                *slot = None;
                tracing::debug!(alert_id = %alert_id, "Alert expired");
            }
        });
    }
}

impl Default for AlertCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for AlertCenter {
    fn show(&self, message: &str, severity: Severity) {
        let alert = Alert::new(message, severity);
        let alert_id = alert.id.clone();

        let replaced = self.current.write().replace(alert);
        if let Some(previous) = replaced {
            tracing::debug!(alert_id = %previous.id, "Removed previous alert");
        }

        match severity {
            Severity::Danger | Severity::Warning => {
                tracing::warn!(severity = %severity, message = %message, "Showing alert")
            }
            _ => tracing::info!(severity = %severity, message = %message, "Showing alert"),
        }

        self.schedule_expiry(alert_id);
    }
}
