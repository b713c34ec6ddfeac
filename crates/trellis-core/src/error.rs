//! Error types for Trellis operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Trellis crates, plus [`HttpError`], the transport error every
//! [`DataProvider`](crate::providers::DataProvider) reports.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Transport or data error returned by a data provider.
///
/// Carries an HTTP-like status code when the backend supplied one, and an
/// optional per-field error map for validation failures.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct HttpError {
    /// Human-readable message.
    pub message: String,

    /// HTTP-like status code, when known.
    pub status_code: Option<u16>,

    /// Field-level errors keyed by field name.
    #[serde(default)]
    pub errors: BTreeMap<String, String>,
}

impl HttpError {
    /// Create an error with a message and no status code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: None,
            errors: BTreeMap::new(),
        }
    }

    /// Set the status code.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Add a field-level error.
    pub fn with_field_error(
        mut self,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.errors.insert(field.into(), message.into());
        self
    }

    /// Status code rendered for messages; `"unknown"` when absent.
    pub fn status_label(&self) -> String {
        self.status_code
            .map(|code| code.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Rejection reported by an auth provider.
///
/// `name` and `message` feed the login-error notification; `redirect_to`
/// lets a provider steer the logout redirect after a session check fails.
#[derive(Error, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[error("{}", .message.as_deref().unwrap_or("authentication failed"))]
pub struct AuthError {
    /// Short error name, e.g. `"Unauthorized"`.
    pub name: Option<String>,

    /// Human-readable message.
    pub message: Option<String>,

    /// Where to send the user after this rejection.
    pub redirect_to: Option<String>,
}

impl AuthError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Set the error name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the redirect target.
    pub fn with_redirect(mut self, path: impl Into<String>) -> Self {
        self.redirect_to = Some(path.into());
        self
    }
}

/// Errors that can occur in Trellis operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport or data error from a provider.
    #[error("HTTP error (status code: {}): {}", .0.status_label(), .0.message)]
    Http(#[from] HttpError),

    /// Authentication rejected the current session.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resource or record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data or format.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An undoable mutation was cancelled inside its undo window.
    #[error("Mutation on {resource}/{id} was cancelled")]
    Cancelled {
        /// Resource name.
        resource: String,
        /// Record id.
        id: String,
    },

    /// A provider is missing or failed outside the transport layer.
    #[error("Provider error: {0}")]
    Provider(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid data error.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidData(msg.into())
    }

    /// Create an authentication error.
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Create a provider error.
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Status code of the underlying transport error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(err) => err.status_code,
            _ => None,
        }
    }

    /// Whether this error came from the authentication layer.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Whether this error is an undo-window cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl From<AuthError> for Error {
    fn from(err: AuthError) -> Self {
        Self::Auth(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Trellis's Error type.
pub type Result<T> = std::result::Result<T, Error>;
