//! Reducer over in-flight undoable mutations.
//!
//! State is an ordered set of [`MutationNotification`]s with identity
//! `(id, resource)`. The reducer is pure: the countdown tick and the
//! commit/cancel side effects are driven by whoever dispatches.

use std::fmt;
use std::sync::Arc;

/// Countdown step, in milliseconds, applied by [`NotificationAction::DecreaseSecond`].
pub const TICK_MS: u64 = 1000;

/// Commit or cancel callback attached to a notification.
pub type MutationCallback = Arc<dyn Fn() + Send + Sync>;

/// Identity of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationKey {
    /// Record id.
    pub id: String,
    /// Resource name.
    pub resource: String,
}

impl NotificationKey {
    /// Build a key.
    pub fn new(id: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resource: resource.into(),
        }
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.resource, self.id)
    }
}

/// A pending undoable mutation.
#[derive(Clone)]
pub struct MutationNotification {
    /// Record id.
    pub id: String,
    /// Resource name.
    pub resource: String,
    /// Remaining undo window in milliseconds.
    pub seconds: u64,
    /// Whether the countdown is active.
    pub is_running: bool,
    /// Suppress the on-screen countdown.
    pub is_silent: bool,
    /// Abort the deferred mutation.
    pub cancel: MutationCallback,
    /// Run the deferred mutation now.
    pub commit: MutationCallback,
}

impl MutationNotification {
    /// New notification with no-op callbacks.
    pub fn new(id: impl Into<String>, resource: impl Into<String>, seconds: u64) -> Self {
        Self {
            id: id.into(),
            resource: resource.into(),
            seconds,
            is_running: false,
            is_silent: false,
            cancel: Arc::new(|| {}),
            commit: Arc::new(|| {}),
        }
    }

    /// Attach the cancel callback.
    pub fn with_cancel(mut self, cancel: impl Fn() + Send + Sync + 'static) -> Self {
        self.cancel = Arc::new(cancel);
        self
    }

    /// Attach the commit callback.
    pub fn with_commit(mut self, commit: impl Fn() + Send + Sync + 'static) -> Self {
        self.commit = Arc::new(commit);
        self
    }

    /// Mark as silent.
    pub fn silent(mut self) -> Self {
        self.is_silent = true;
        self
    }

    /// Identity of this notification.
    pub fn key(&self) -> NotificationKey {
        NotificationKey::new(self.id.clone(), self.resource.clone())
    }

    fn is(&self, key: &NotificationKey) -> bool {
        self.id == key.id && self.resource == key.resource
    }
}

impl fmt::Debug for MutationNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutationNotification")
            .field("id", &self.id)
            .field("resource", &self.resource)
            .field("seconds", &self.seconds)
            .field("is_running", &self.is_running)
            .field("is_silent", &self.is_silent)
            .finish_non_exhaustive()
    }
}

/// Transitions of the notification state.
#[derive(Debug, Clone)]
pub enum NotificationAction {
    /// Insert, replacing any entry with the same identity; forces `is_running`.
    Add(MutationNotification),
    /// Delete the entry with exactly this identity.
    Remove(NotificationKey),
    /// Set the matching entry's remaining time to `seconds - TICK_MS`.
    DecreaseSecond {
        /// Target entry.
        key: NotificationKey,
        /// Remaining time the dispatcher observed.
        seconds: u64,
    },
}

/// Ordered set of pending notifications.
#[derive(Debug, Clone, Default)]
pub struct NotificationState {
    entries: Vec<MutationNotification>,
}

impl NotificationState {
    /// Entry with the given identity.
    pub fn get(&self, key: &NotificationKey) -> Option<&MutationNotification> {
        self.entries.iter().find(|n| n.is(key))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, MutationNotification> {
        self.entries.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no mutation is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply one action, returning the next state.
pub fn reduce(state: &NotificationState, action: NotificationAction) -> NotificationState {
    match action {
        NotificationAction::Add(mut notification) => {
            let key = notification.key();
            notification.is_running = true;
            let mut entries: Vec<_> = state
                .entries
                .iter()
                .filter(|n| !n.is(&key))
                .cloned()
                .collect();
            entries.push(notification);
            tracing::debug!(notification = %key, "undo window opened");
            NotificationState { entries }
        }
        NotificationAction::Remove(key) => {
            if state.get(&key).is_none() {
                tracing::debug!(notification = %key, "remove ignored; no such notification");
                return state.clone();
            }
            NotificationState {
                entries: state.entries.iter().filter(|n| !n.is(&key)).cloned().collect(),
            }
        }
        NotificationAction::DecreaseSecond { key, seconds } => {
            if state.get(&key).is_none() {
                tracing::debug!(notification = %key, "tick ignored; no such notification");
                return state.clone();
            }
            let entries = state
                .entries
                .iter()
                .map(|n| {
                    if n.is(&key) {
                        MutationNotification {
                            seconds: seconds.saturating_sub(TICK_MS),
                            ..n.clone()
                        }
                    } else {
                        n.clone()
                    }
                })
                .collect();
            NotificationState { entries }
        }
    }
}
