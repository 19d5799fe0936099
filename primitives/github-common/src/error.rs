//! Error types for GitHub API calls.
//!
//! Neither type carries response bodies or credentials. Failures are reported
//! by category and HTTP status only.

use thiserror::Error;

/// Failure to resolve an organization or list its repositories.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("authentication failed (HTTP {status})")]
    Auth { status: u16 },

    #[error("organization not found")]
    NotFound,

    #[error("network error: {0}")]
    Network(String),

    #[error("GitHub API returned HTTP {status}")]
    Api { status: u16 },

    #[error("failed to decode GitHub response")]
    Decode,

    #[error("failed to build GitHub client: {0}")]
    Setup(String),
}

impl ClientError {
    /// Maps a non-success HTTP status to an error.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth { status },
            404 => Self::NotFound,
            _ => Self::Api { status },
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Network("request timed out".into())
        } else if err.is_decode() {
            Self::Decode
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else {
            // Request URLs may appear here, the token never does.
            Self::Network(err.to_string())
        }
    }
}

/// Failure of a single custom property update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpdateFailure {
    #[error("HTTP {0} (client error)")]
    ClientError(u16),

    #[error("HTTP {0} (server error)")]
    ServerError(u16),

    #[error("HTTP {0} (unexpected status)")]
    UnexpectedStatus(u16),

    #[error("connection error")]
    Connection,

    #[error("request timed out")]
    Timeout,

    #[error("request error")]
    Request,
}

impl UpdateFailure {
    /// Classifies a non-success HTTP status.
    pub fn from_status(status: u16) -> Self {
        match status {
            400..=499 => Self::ClientError(status),
            500..=599 => Self::ServerError(status),
            _ => Self::UnexpectedStatus(status),
        }
    }
}

impl From<reqwest::Error> for UpdateFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connection
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else {
            Self::Request
        }
    }
}
