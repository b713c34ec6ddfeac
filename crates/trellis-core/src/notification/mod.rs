//! Notifications: the undo-window reducer and the user-facing notifier.

mod api;
mod reducer;

pub use api::{NotificationArgs, NotificationKind, NotificationOverride, Notifier};
pub use reducer::{
    MutationCallback, MutationNotification, NotificationAction, NotificationKey,
    NotificationState, TICK_MS, reduce,
};

/// Store holding the in-flight undoable mutations.
pub type NotificationStore = crate::store::Store<NotificationState, NotificationAction>;

impl NotificationStore {
    /// Empty notification store driven by [`reduce`].
    pub fn notifications() -> Self {
        Self::new(NotificationState::default(), reduce)
    }
}
