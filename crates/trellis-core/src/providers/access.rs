//! Access-control provider abstraction.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Question asked of the access-control provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanParams {
    /// Resource name (`"dashboard"` for the dashboard page).
    pub resource: String,

    /// Action name: `list`, `create`, `edit`, `show`, `delete`, ...
    pub action: String,

    /// Extra context such as `{"id": "3"}`.
    #[serde(default)]
    pub params: Value,
}

/// Answer of the access-control provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanResponse {
    /// Whether the action is allowed.
    pub can: bool,

    /// Why it was denied, when the provider says.
    pub reason: Option<String>,
}

impl CanResponse {
    /// Allowed.
    pub fn allow() -> Self {
        Self {
            can: true,
            reason: None,
        }
    }

    /// Denied with a reason.
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            can: false,
            reason: Some(reason.into()),
        }
    }
}

/// Authorisation for (resource, action) pairs.
#[async_trait]
pub trait AccessControlProvider: Send + Sync {
    /// Decide whether the current user may perform the action.
    async fn can(&self, params: CanParams) -> CanResponse;
}

/// Provider that allows everything; used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl AccessControlProvider for AllowAll {
    async fn can(&self, _params: CanParams) -> CanResponse {
        CanResponse::allow()
    }
}
