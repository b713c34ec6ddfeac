//! User-facing notifications and per-call overrides.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::providers::NotificationProvider;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Informational.
    #[default]
    Info,
    /// Needs attention.
    Warning,
}

/// What to show.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationArgs {
    /// Headline.
    pub message: String,

    /// Body text.
    pub description: Option<String>,

    /// Severity.
    #[serde(rename = "type")]
    pub kind: NotificationKind,

    /// Dedup key; a later notification with the same key replaces this one.
    pub key: Option<String>,

    /// Display time in milliseconds.
    pub duration: Option<u64>,
}

impl NotificationArgs {
    /// Notification of `kind` with a headline.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            ..Self::default()
        }
    }

    /// Success notification.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    /// Error notification.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    /// Set the body text.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the dedup key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Per-call choice for a hook's success or error notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NotificationOverride {
    /// Use the hook's built-in notification, if it has one.
    #[default]
    Default,
    /// Show these args instead.
    Custom(NotificationArgs),
    /// Show nothing.
    Suppressed,
}

impl NotificationOverride {
    /// Resolve against the hook's built-in notification.
    pub fn resolve(&self, fallback: Option<NotificationArgs>) -> Option<NotificationArgs> {
        match self {
            Self::Default => fallback,
            Self::Custom(args) => Some(args.clone()),
            Self::Suppressed => None,
        }
    }
}

impl From<NotificationArgs> for NotificationOverride {
    fn from(args: NotificationArgs) -> Self {
        Self::Custom(args)
    }
}

/// Thin front over a [`NotificationProvider`] that understands overrides.
#[derive(Clone)]
pub struct Notifier {
    provider: Arc<dyn NotificationProvider>,
}

impl Notifier {
    /// Wrap a provider.
    pub fn new(provider: Arc<dyn NotificationProvider>) -> Self {
        Self { provider }
    }

    /// Show the resolved notification, if any.
    pub fn open(&self, choice: &NotificationOverride, fallback: Option<NotificationArgs>) {
        if let Some(args) = choice.resolve(fallback) {
            self.provider.open(args);
        }
    }

    /// Show a notification unconditionally.
    pub fn show(&self, args: NotificationArgs) {
        self.provider.open(args);
    }

    /// Show a success notification.
    pub fn success(&self, message: impl Into<String>) {
        self.show(NotificationArgs::success(message));
    }

    /// Show an error notification.
    pub fn error(&self, message: impl Into<String>) {
        self.show(NotificationArgs::error(message));
    }

    /// Show an info notification.
    pub fn info(&self, message: impl Into<String>) {
        self.show(NotificationArgs::new(NotificationKind::Info, message));
    }

    /// Show a warning notification.
    pub fn warning(&self, message: impl Into<String>) {
        self.show(NotificationArgs::new(NotificationKind::Warning, message));
    }

    /// Dismiss by key.
    pub fn close(&self, key: &str) {
        self.provider.close(key);
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture {
        opened: Mutex<Vec<NotificationArgs>>,
        closed: Mutex<Vec<String>>,
    }

    impl NotificationProvider for Capture {
        fn open(&self, args: NotificationArgs) {
            self.opened.lock().push(args);
        }

        fn close(&self, key: &str) {
            self.closed.lock().push(key.to_string());
        }
    }

    #[test]
    fn test_override_resolution() {
        let fallback = NotificationArgs::success("Saved");
        assert_eq!(
            NotificationOverride::Default.resolve(Some(fallback.clone())),
            Some(fallback.clone())
        );
        assert_eq!(NotificationOverride::Default.resolve(None), None);
        assert_eq!(NotificationOverride::Suppressed.resolve(Some(fallback.clone())), None);

        let custom = NotificationArgs::success("Custom");
        assert_eq!(
            NotificationOverride::from(custom.clone()).resolve(Some(fallback)),
            Some(custom)
        );
    }

    #[test]
    fn test_notifier_open_and_close() {
        let capture = Arc::new(Capture::default());
        let notifier = Notifier::new(capture.clone());

        notifier.open(
            &NotificationOverride::Default,
            Some(NotificationArgs::error("Failed").with_key("k")),
        );
        notifier.open(&NotificationOverride::Suppressed, Some(NotificationArgs::success("x")));
        notifier.warning("careful");
        notifier.close("k");

        let opened = capture.opened.lock();
        assert_eq!(opened.len(), 2);
        assert_eq!(opened[0].kind, NotificationKind::Error);
        assert_eq!(opened[0].key.as_deref(), Some("k"));
        assert_eq!(opened[1].kind, NotificationKind::Warning);
        assert_eq!(capture.closed.lock().as_slice(), ["k".to_string()]);
    }
}
