//! API error types

use serde_json::Value;
use thiserror::Error;

/// Shown when the server gives no usable `detail`
pub const FALLBACK_MESSAGE: &str = "操作失败";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// 401. Already handled by the auth policy when this is returned.
    #[error("Unauthorized")]
    Unauthorized,

    #[error("HTTP {status}: {detail}")]
    Application { status: u16, detail: String },

    #[error("HTTP {status}")]
    Unknown { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The page that issued the request was navigated away from before it finished
    #[error("Request outlived its page")]
    Superseded,
}

impl ApiError {
    /// Build the error for a non-2xx, non-401 response from its raw body
    pub fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|json| json.get("detail").cloned());

        match detail {
            Some(Value::String(s)) if !s.trim().is_empty() => {
                ApiError::Application { status, detail: s }
            }
            Some(Value::Null) | Some(Value::String(_)) | None => ApiError::Unknown { status },
            // e.g. a list of validation errors
            Some(other) => ApiError::Application {
                status,
                detail: other.to_string(),
            },
        }
    }

    /// The text an operator should see for this failure
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Application { detail, .. } => detail.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized => Some(401),
            ApiError::Application { status, .. } | ApiError::Unknown { status } => Some(*status),
            _ => None,
        }
    }

    /// Errors that are handled inside the client and must not reach callbacks
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::Superseded)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}
