//! Notification provider abstraction.

use crate::notification::NotificationArgs;

/// Displays user-facing notifications (toasts, banners, ...).
pub trait NotificationProvider: Send + Sync {
    /// Show a notification; a notification with the same key replaces it.
    fn open(&self, args: NotificationArgs);

    /// Dismiss the notification with `key`.
    fn close(&self, key: &str);
}

/// Provider used when the application supplies none.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifications;

impl NotificationProvider for NoopNotifications {
    fn open(&self, _args: NotificationArgs) {}

    fn close(&self, _key: &str) {}
}
