//! MedChina Admin UI collaborators
//!
//! The headless stand-ins for what a browser page provides to the panel:
//! - `Location`: the current route, with hard navigation that retires the page
//! - `AlertCenter`: a single dismissible, auto-expiring notice
//! - `format`: date, number and HTML-escaping helpers used by tables and alerts

mod alert;
pub mod format;
mod navigation;

pub use alert::{Alert, AlertCenter, Notifier, Severity, DEFAULT_ALERT_TTL};
pub use format::{escape_html, format_date, format_number};
pub use navigation::{Location, Navigator};
