//! In-memory auth provider.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Value, json};
use std::collections::BTreeMap;

use trellis_core::providers::{AuthProvider, AuthResult};
use trellis_core::{AuthError, HttpError};

/// Username/password table with a single session slot.
///
/// `login` expects `{"username": .., "password": ..}`. A failed data call
/// with status 401 ends the session.
#[derive(Debug, Default)]
pub struct MemoryAuthProvider {
    users: BTreeMap<String, String>,
    session: RwLock<Option<String>>,
    permissions: Value,
}

impl MemoryAuthProvider {
    /// Provider with no users and no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user.
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    /// Start with `username` logged in.
    pub fn logged_in_as(self, username: impl Into<String>) -> Self {
        *self.session.write() = Some(username.into());
        self
    }

    /// Permissions returned for any logged-in user.
    pub fn with_permissions(mut self, permissions: Value) -> Self {
        self.permissions = permissions;
        self
    }

    /// Logged-in username.
    pub fn current_user(&self) -> Option<String> {
        self.session.read().clone()
    }

    fn require_session(&self) -> AuthResult<String> {
        self.current_user()
            .ok_or_else(|| AuthError::new("Not authenticated").with_name("Unauthorized"))
    }
}

#[async_trait]
impl AuthProvider for MemoryAuthProvider {
    async fn login(&self, params: Value) -> AuthResult<Option<String>> {
        let username = params.get("username").and_then(Value::as_str).unwrap_or_default();
        let password = params.get("password").and_then(Value::as_str).unwrap_or_default();
        match self.users.get(username) {
            Some(expected) if expected == password => {
                *self.session.write() = Some(username.to_string());
                tracing::debug!(username, "logged in");
                Ok(None)
            }
            _ => Err(AuthError::new("Invalid username or password").with_name("Login Error")),
        }
    }

    async fn logout(&self, _params: Value) -> AuthResult<Option<String>> {
        self.session.write().take();
        Ok(None)
    }

    async fn check_auth(&self, _params: Value) -> AuthResult<()> {
        self.require_session().map(|_| ())
    }

    async fn check_error(&self, error: &HttpError) -> AuthResult<()> {
        if error.status_code == Some(401) {
            return Err(AuthError::new("Session expired").with_name("Unauthorized"));
        }
        Ok(())
    }

    async fn get_permissions(&self) -> AuthResult<Value> {
        self.require_session()?;
        Ok(self.permissions.clone())
    }

    async fn get_user_identity(&self) -> AuthResult<Value> {
        let username = self.require_session()?;
        Ok(json!({ "username": username }))
    }
}
