//! Auth hooks: login, logout and session checks with their navigation and
//! notification side effects.

use serde_json::Value;
use std::sync::Arc;

use trellis_core::providers::AuthProvider;
use trellis_core::{AuthError, HttpError, NotificationArgs, Result};

use crate::env::Env;

/// Notification key of the login error.
pub const LOGIN_ERROR_KEY: &str = "login-error";

const LOGIN_PATH: &str = "/login";

/// Session operations bound to an [`Env`].
#[derive(Debug, Clone)]
pub struct AuthHooks {
    env: Arc<Env>,
}

impl AuthHooks {
    /// Hooks over `env`.
    pub fn new(env: Arc<Env>) -> Self {
        Self { env }
    }

    fn provider(&self) -> Option<&Arc<dyn AuthProvider>> {
        self.env.auth.as_ref()
    }

    /// Log in with form values.
    ///
    /// On success the router replaces the location with the `to` query
    /// parameter, the provider's redirect, or `/`, and any login-error
    /// notification is closed. On failure a login-error notification is
    /// shown.
    pub async fn login(&self, values: Value) -> Result<()> {
        let redirect = match self.provider() {
            Some(provider) => match provider.login(values).await {
                Ok(redirect) => redirect,
                Err(err) => {
                    self.env.notifier.show(
                        NotificationArgs::error(err.name.as_deref().unwrap_or("Login Error"))
                            .with_description(
                                err.message.as_deref().unwrap_or("Invalid credentials"),
                            )
                            .with_key(LOGIN_ERROR_KEY),
                    );
                    return Err(err.into());
                }
            },
            None => None,
        };

        let target = self
            .env
            .router
            .location()
            .query_param("to")
            .filter(|to| !to.is_empty())
            .or(redirect)
            .unwrap_or_else(|| "/".to_string());
        tracing::debug!(target = %target, "login succeeded");
        self.env.router.replace(&target);
        self.env.notifier.close(LOGIN_ERROR_KEY);
        Ok(())
    }

    /// Log out and navigate to the provider's redirect or `/login`.
    pub async fn logout(&self, values: Value) -> Result<()> {
        self.logout_to(values, None).await
    }

    async fn logout_to(&self, values: Value, redirect_to: Option<String>) -> Result<()> {
        let redirect = match self.provider() {
            Some(provider) => provider.logout(values).await?,
            None => None,
        };
        let target = redirect_to
            .or(redirect)
            .unwrap_or_else(|| LOGIN_PATH.to_string());
        tracing::debug!(target = %target, "logged out");
        self.env.router.push(&target);
        Ok(())
    }

    /// Whether the current session is valid. Always true without a provider.
    pub async fn is_authenticated(&self) -> bool {
        self.check_auth(Value::Null).await.is_ok()
    }

    /// The provider's session check.
    pub async fn check_auth(&self, params: Value) -> std::result::Result<(), AuthError> {
        match self.provider() {
            Some(provider) => provider.check_auth(params).await,
            None => Ok(()),
        }
    }

    /// Hand a failed data call to the provider. When it rejects, log out and
    /// redirect; returns whether that happened.
    pub async fn check_error(&self, error: &HttpError) -> bool {
        let Some(provider) = self.provider() else {
            return false;
        };
        match provider.check_error(error).await {
            Ok(()) => false,
            Err(rejection) => {
                tracing::warn!(
                    status = %error.status_label(),
                    reason = %rejection,
                    "session rejected; logging out"
                );
                if let Err(err) = self.logout_to(Value::Null, rejection.redirect_to).await {
                    tracing::warn!(error = %err, "logout after rejected session failed");
                }
                true
            }
        }
    }

    /// Permissions of the current user.
    pub async fn permissions(&self) -> Result<Value> {
        match self.provider() {
            Some(provider) => Ok(provider.get_permissions().await?),
            None => Ok(Value::Null),
        }
    }

    /// Identity of the current user.
    pub async fn identity(&self) -> Result<Value> {
        match self.provider() {
            Some(provider) => Ok(provider.get_user_identity().await?),
            None => Ok(Value::Null),
        }
    }
}
