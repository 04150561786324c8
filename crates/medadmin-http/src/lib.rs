//! MedChina Admin API client
//!
//! Every request carries the session's bearer token. Outcomes are funneled
//! three ways:
//! - 2xx: the success handler gets the decoded body
//! - 401: the injected `AuthErrorPolicy` takes over; callers never see it
//! - anything else: the error handler gets a readable message, or an alert is shown

mod client;
mod error;
mod policy;
mod request;

pub use client::{AuthenticatedClient, ClientBuilder};
pub use error::{ApiError, FALLBACK_MESSAGE};
pub use policy::{AuthErrorPolicy, NoopPolicy, TeardownPolicy};
pub use request::{ErrorHandler, RequestDescriptor, SuccessHandler};

pub use reqwest::Method;

pub type Result<T> = std::result::Result<T, ApiError>;
