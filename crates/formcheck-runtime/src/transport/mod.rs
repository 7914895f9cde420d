//! Transport adapters around [`ValidationService`](crate::service::ValidationService).

#[cfg(feature = "client")]
mod client;
#[cfg(feature = "server")]
mod http;

#[cfg(feature = "client")]
pub use client::{ValidationClient, DEFAULT_CLIENT_TIMEOUT};
#[cfg(feature = "server")]
pub use http::{router, serve, ErrorBody, HealthBody};

pub const VALIDATE_PATH: &str = "/validate";
pub const API_VALIDATE_PATH: &str = "/api/validate";
pub const HEALTH_PATH: &str = "/health";

/// Body error for requests that never reached the service.
pub const INVALID_REQUEST_MESSAGE: &str = "Invalid validation request";
