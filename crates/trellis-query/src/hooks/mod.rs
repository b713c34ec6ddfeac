//! Data-access hooks.
//!
//! Every hook follows the same contract: build a [`QueryKey`], call the data
//! provider (through the cache for reads), and on success show the success
//! notification. Writes additionally invalidate the resource's cached keys and
//! publish a live event. Errors always go through the auth provider's session
//! check before the error notification is shown.
//!
//! [`QueryKey`]: crate::key::QueryKey

mod read;
mod write;

use std::sync::Arc;
use std::time::Duration;

use trellis_core::naming::singularize;
use trellis_core::{Error, HttpError, MutationMode, NotificationArgs, NotificationOverride};

use crate::auth::AuthHooks;
use crate::env::Env;

/// Per-call notification overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Shown when the call succeeds.
    pub success: NotificationOverride,
    /// Shown when the call fails.
    pub error: NotificationOverride,
}

impl NotifyConfig {
    /// No notifications either way.
    pub fn silent() -> Self {
        Self {
            success: NotificationOverride::Suppressed,
            error: NotificationOverride::Suppressed,
        }
    }

    /// Show `args` on success.
    pub fn with_success(mut self, args: impl Into<NotificationOverride>) -> Self {
        self.success = args.into();
        self
    }

    /// Show `args` on failure.
    pub fn with_error(mut self, args: impl Into<NotificationOverride>) -> Self {
        self.error = args.into();
        self
    }
}

/// Per-call options of a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutationConfig {
    /// Notification overrides.
    pub notify: NotifyConfig,
    /// Overrides the application's mutation mode.
    pub mutation_mode: Option<MutationMode>,
    /// Overrides the application's undo window.
    pub undoable_timeout: Option<Duration>,
}

impl MutationConfig {
    /// Use `mode` for this call.
    pub fn with_mode(mut self, mode: MutationMode) -> Self {
        self.mutation_mode = Some(mode);
        self
    }

    /// Use an undo window of `timeout` for this call.
    pub fn with_undoable_timeout(mut self, timeout: Duration) -> Self {
        self.undoable_timeout = Some(timeout);
        self
    }

    /// Use these notification overrides.
    pub fn with_notify(mut self, notify: NotifyConfig) -> Self {
        self.notify = notify;
        self
    }
}

/// Read and write hooks bound to an [`Env`].
#[derive(Debug, Clone)]
pub struct DataHooks {
    env: Arc<Env>,
    auth: AuthHooks,
}

impl DataHooks {
    /// Hooks over `env`.
    pub fn new(env: Arc<Env>) -> Self {
        let auth = AuthHooks::new(Arc::clone(&env));
        Self { env, auth }
    }

    /// The environment the hooks run in.
    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Translated singular name of `resource`.
    fn singular(&self, resource: &str) -> String {
        self.env.translate(
            &format!("{resource}.{resource}"),
            &[],
            &singularize(resource),
        )
    }

    /// Session check, then the error notification. Returns the error to hand
    /// back to the caller.
    async fn fail(
        &self,
        error: HttpError,
        choice: &NotificationOverride,
        fallback: NotificationArgs,
    ) -> Error {
        self.auth.check_error(&error).await;
        tracing::warn!(
            status = %error.status_label(),
            message = %error.message,
            "data call failed"
        );
        self.env.notifier.open(choice, Some(fallback));
        Error::Http(error)
    }
}
