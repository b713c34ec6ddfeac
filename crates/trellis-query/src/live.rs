//! Live updates: resource subscriptions and event publishing.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use trellis_core::LiveMode;
use trellis_core::providers::{
    LiveCallback, LiveEvent, LiveProvider, SubscribeParams, SubscriptionId, WILDCARD,
};

use crate::cache::QueryCache;

/// Active subscription; unsubscribes when dropped.
pub struct LiveSubscription {
    provider: Arc<dyn LiveProvider>,
    id: SubscriptionId,
}

impl LiveSubscription {
    /// Provider-assigned id.
    pub fn id(&self) -> &SubscriptionId {
        &self.id
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        tracing::debug!(subscription = %self.id, "live subscription closed");
        self.provider.unsubscribe(&self.id);
    }
}

impl fmt::Debug for LiveSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSubscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Binds an optional live provider to the query cache.
#[derive(Clone)]
pub struct Live {
    provider: Option<Arc<dyn LiveProvider>>,
    cache: QueryCache,
    mode: LiveMode,
}

impl Live {
    /// `mode` is the application default, overridable per subscription.
    pub fn new(provider: Option<Arc<dyn LiveProvider>>, cache: QueryCache, mode: LiveMode) -> Self {
        Self {
            provider,
            cache,
            mode,
        }
    }

    /// Application-wide live mode.
    pub fn mode(&self) -> LiveMode {
        self.mode
    }

    /// Subscribe to every event on the resource's channel.
    ///
    /// Returns `None` when there is no provider or the effective mode is
    /// [`LiveMode::Off`]. In [`LiveMode::Auto`] each event invalidates the
    /// resource's cached queries; `on_event` sees every event in either
    /// enabled mode.
    pub fn subscribe_resource(
        &self,
        resource: &str,
        params: Value,
        mode: Option<LiveMode>,
        on_event: Option<LiveCallback>,
    ) -> Option<LiveSubscription> {
        let mode = mode.unwrap_or(self.mode);
        if !mode.is_enabled() {
            return None;
        }
        let provider = self.provider.as_ref()?;

        let cache = self.cache.clone();
        let resource_name = resource.to_string();
        let callback: LiveCallback = Arc::new(move |event: &LiveEvent| {
            if mode == LiveMode::Auto {
                cache.invalidate_resource(&resource_name);
            }
            if let Some(on_event) = &on_event {
                on_event(event);
            }
        });

        let id = provider.subscribe(SubscribeParams {
            channel: LiveEvent::resource_channel(resource),
            types: vec![WILDCARD.to_string()],
            params,
            callback,
        });
        tracing::debug!(resource, subscription = %id, ?mode, "live subscription opened");
        Some(LiveSubscription {
            provider: Arc::clone(provider),
            id,
        })
    }

    /// Broadcast an event; does nothing without a provider.
    pub fn publish(&self, event: LiveEvent) {
        if let Some(provider) = &self.provider {
            provider.publish(event);
        }
    }
}

impl fmt::Debug for Live {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Live")
            .field("enabled", &self.provider.is_some())
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

struct Subscriber {
    channel: String,
    types: Vec<String>,
    callback: LiveCallback,
}

/// In-process live provider: `publish` delivers synchronously to every
/// subscriber on the channel whose type filter accepts the event.
#[derive(Default)]
pub struct LocalLiveProvider {
    subscribers: Mutex<BTreeMap<SubscriptionId, Subscriber>>,
}

impl LocalLiveProvider {
    /// Provider with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

impl LiveProvider for LocalLiveProvider {
    fn subscribe(&self, params: SubscribeParams) -> SubscriptionId {
        let id = SubscriptionId(uuid::Uuid::new_v4().to_string());
        self.subscribers.lock().insert(
            id.clone(),
            Subscriber {
                channel: params.channel,
                types: params.types,
                callback: params.callback,
            },
        );
        id
    }

    fn unsubscribe(&self, id: &SubscriptionId) {
        self.subscribers.lock().remove(id);
    }

    fn publish(&self, event: LiveEvent) {
        let targets: Vec<LiveCallback> = self
            .subscribers
            .lock()
            .values()
            .filter(|s| s.channel == event.channel && event.matches_types(&s.types))
            .map(|s| Arc::clone(&s.callback))
            .collect();
        tracing::debug!(
            channel = %event.channel,
            event = %event.event_type,
            targets = targets.len(),
            "live event"
        );
        for callback in targets {
            callback(&event);
        }
    }
}

impl fmt::Debug for LocalLiveProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalLiveProvider")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
