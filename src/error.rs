//! Error types for data fetching and orchestration
//!
//! [`FetchError`] is what providers return. The orchestrator never lets it
//! escape: it is classified through [`FetchErrorKind`] into a transient or
//! terminal failure and surfaced as a user message in the published state.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when fetching data from a provider
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Provider-side internal failure (5xx)
    #[error("Server error: {0}")]
    Server(String),

    /// Provider briefly down (503)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The provider does not know the requested location
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    /// The request did not complete in time
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Any other failure
    #[error("{0}")]
    Unknown(String),
}

/// Classification tag of a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    ServerError,
    ServiceUnavailable,
    LocationNotFound,
    Timeout,
    Unknown,
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Server(_) => FetchErrorKind::ServerError,
            FetchError::ServiceUnavailable(_) => FetchErrorKind::ServiceUnavailable,
            FetchError::LocationNotFound(_) => FetchErrorKind::LocationNotFound,
            FetchError::Timeout(_) => FetchErrorKind::Timeout,
            FetchError::Unknown(_) => FetchErrorKind::Unknown,
        }
    }

    /// Whether the failure is expected to resolve on retry
    pub fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }

    /// Message shown to the user for this failure
    pub fn user_message(&self) -> &'static str {
        self.kind().user_message()
    }
}

impl FetchErrorKind {
    pub fn is_transient(self) -> bool {
        match self {
            FetchErrorKind::ServerError | FetchErrorKind::ServiceUnavailable | FetchErrorKind::Timeout => {
                true
            }
            FetchErrorKind::LocationNotFound | FetchErrorKind::Unknown => false,
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            FetchErrorKind::ServerError => {
                "Server temporarily unavailable. Retrying automatically..."
            }
            FetchErrorKind::ServiceUnavailable => "Data service briefly unavailable. Retrying...",
            FetchErrorKind::LocationNotFound => {
                "Location not found. Please select a different location."
            }
            FetchErrorKind::Timeout => "Request timed out. Retrying...",
            FetchErrorKind::Unknown => "Failed to load data. Please try again.",
        }
    }
}

impl FetchError {
    /// Map a client error; `timeout` is the limit the client was built with
    pub fn from_reqwest(error: reqwest::Error, timeout: Duration) -> Self {
        if error.is_timeout() {
            return FetchError::Timeout(timeout);
        }
        if let Some(status) = error.status() {
            return FetchError::from_status(status.as_u16(), error.to_string());
        }
        FetchError::Unknown(error.to_string())
    }
}

impl FetchError {
    /// Map an HTTP status code to a fetch error
    pub fn from_status(status: u16, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        match status {
            404 => FetchError::LocationNotFound(detail),
            503 => FetchError::ServiceUnavailable(detail),
            500..=599 => FetchError::Server(detail),
            _ => FetchError::Unknown(detail),
        }
    }
}

/// Errors returned by orchestrator control operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrchestratorError {
    /// A refresh interval must be strictly positive
    #[error("Refresh interval must be greater than zero")]
    InvalidRefreshInterval,
}
