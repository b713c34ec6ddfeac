//! Live (realtime) provider abstraction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Event-type filter that matches every event.
pub const WILDCARD: &str = "*";

/// Callback invoked for each delivered event.
pub type LiveCallback = Arc<dyn Fn(&LiveEvent) + Send + Sync>;

/// Kind of change a live event reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveEventType {
    /// Records were created.
    Created,
    /// Records were updated.
    Updated,
    /// Records were deleted.
    Deleted,
    /// Application-defined event.
    #[serde(untagged)]
    Custom(String),
}

impl LiveEventType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Custom(name) => name,
        }
    }
}

impl fmt::Display for LiveEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a live event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiveEventPayload {
    /// Ids of the affected records, when known.
    pub ids: Option<Vec<String>>,

    /// Extra event data.
    #[serde(default)]
    pub data: Value,
}

/// A push notification about a resource change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveEvent {
    /// Channel, e.g. `resources/posts`.
    pub channel: String,

    /// What happened.
    #[serde(rename = "type")]
    pub event_type: LiveEventType,

    /// Affected ids and extra data.
    pub payload: LiveEventPayload,

    /// When it happened.
    pub date: DateTime<Utc>,
}

impl LiveEvent {
    /// Channel name for a resource.
    pub fn resource_channel(resource: &str) -> String {
        format!("resources/{resource}")
    }

    /// Whether the event passes a type filter (`"*"` matches everything).
    pub fn matches_types(&self, types: &[String]) -> bool {
        types
            .iter()
            .any(|t| t == WILDCARD || t == self.event_type.as_str())
    }
}

/// Opaque handle of a live subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters for [`LiveProvider::subscribe`].
#[derive(Clone)]
pub struct SubscribeParams {
    /// Channel to listen on.
    pub channel: String,

    /// Event types to deliver; `["*"]` for all.
    pub types: Vec<String>,

    /// Query parameters the subscriber is interested in.
    pub params: Value,

    /// Delivery callback.
    pub callback: LiveCallback,
}

impl fmt::Debug for SubscribeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeParams")
            .field("channel", &self.channel)
            .field("types", &self.types)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Realtime transport.
pub trait LiveProvider: Send + Sync {
    /// Start delivering matching events to the callback.
    fn subscribe(&self, params: SubscribeParams) -> SubscriptionId;

    /// Stop a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: &SubscriptionId);

    /// Broadcast an event to subscribers.
    fn publish(&self, _event: LiveEvent) {}
}
