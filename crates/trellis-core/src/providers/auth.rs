//! Auth provider abstraction.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AuthError, HttpError};

/// Result type for auth provider calls.
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Authentication and session management.
///
/// Route gating calls [`check_auth`](AuthProvider::check_auth); every failed
/// data call is first handed to [`check_error`](AuthProvider::check_error) so
/// the provider can decide whether the session is gone.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Log in with form values. `Ok(Some(path))` overrides the post-login
    /// redirect.
    async fn login(&self, params: Value) -> AuthResult<Option<String>>;

    /// Log out. `Ok(Some(path))` overrides the default `/login` redirect.
    async fn logout(&self, params: Value) -> AuthResult<Option<String>>;

    /// Resolve when the current session is valid.
    async fn check_auth(&self, params: Value) -> AuthResult<()>;

    /// Inspect a failed data call; `Err` means the session is invalid.
    async fn check_error(&self, error: &HttpError) -> AuthResult<()>;

    /// Permissions of the current user.
    async fn get_permissions(&self) -> AuthResult<Value>;

    /// Identity of the current user.
    async fn get_user_identity(&self) -> AuthResult<Value> {
        Ok(Value::Null)
    }
}
