//! Notification provider that records what it was asked to show.

use parking_lot::Mutex;

use trellis_core::NotificationArgs;
use trellis_core::providers::NotificationProvider;

/// Records opened and closed notifications.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    opened: Mutex<Vec<NotificationArgs>>,
    closed: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications opened, oldest first.
    pub fn opened(&self) -> Vec<NotificationArgs> {
        self.opened.lock().clone()
    }

    /// Most recent notification.
    pub fn last(&self) -> Option<NotificationArgs> {
        self.opened.lock().last().cloned()
    }

    /// Keys closed, oldest first.
    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().clone()
    }

    /// Forget everything recorded.
    pub fn clear(&self) {
        self.opened.lock().clear();
        self.closed.lock().clear();
    }
}

impl NotificationProvider for RecordingNotifier {
    fn open(&self, args: NotificationArgs) {
        self.opened.lock().push(args);
    }

    fn close(&self, key: &str) {
        self.closed.lock().push(key.to_string());
    }
}
