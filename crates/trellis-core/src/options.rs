//! Application-wide options.
//!
//! These are the knobs the composition root hands to every hook: how writes
//! are reflected (mutation mode), how long the undo window lasts, whether
//! live events refresh cached views, and query-cache defaults.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::menu::DashboardMenuOptions;

/// How a write is reflected in cached views relative to server confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationMode {
    /// Apply after the server confirms.
    #[default]
    Pessimistic,
    /// Apply immediately; roll back if the server rejects.
    Optimistic,
    /// Apply immediately and defer the server call behind an undo window.
    Undoable,
}

/// How live events affect subscribed views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveMode {
    /// Do not subscribe.
    #[default]
    Off,
    /// Subscribe and hand events to the caller only.
    Manual,
    /// Subscribe and invalidate the resource's cached queries on every event.
    Auto,
}

impl LiveMode {
    /// Whether this mode subscribes at all.
    pub fn is_enabled(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// Query-cache defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryOptions {
    /// How long a cached result stays fresh; zero means always refetch.
    pub stale_time_ms: u64,
}

impl QueryOptions {
    /// Stale time as a duration.
    pub fn stale_time(&self) -> Duration {
        Duration::from_millis(self.stale_time_ms)
    }
}

/// Options shared by every hook of one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppOptions {
    /// Default mutation mode for update and delete.
    pub mutation_mode: MutationMode,

    /// Undo window length in milliseconds.
    pub undoable_timeout_ms: u64,

    /// Mirror list state (pagination, sort, filters) into the location.
    pub sync_with_location: bool,

    /// Warn before navigating away from a dirty form.
    pub warn_when_unsaved_changes: bool,

    /// Default live mode for read hooks.
    pub live_mode: LiveMode,

    /// Options for the synthetic dashboard menu entry.
    pub dashboard_menu: DashboardMenuOptions,

    /// Query-cache defaults.
    pub query: QueryOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            mutation_mode: MutationMode::Pessimistic,
            undoable_timeout_ms: 5000,
            sync_with_location: false,
            warn_when_unsaved_changes: false,
            live_mode: LiveMode::Off,
            dashboard_menu: DashboardMenuOptions::default(),
            query: QueryOptions::default(),
        }
    }
}

impl AppOptions {
    /// Undo window as a duration.
    pub fn undoable_timeout(&self) -> Duration {
        Duration::from_millis(self.undoable_timeout_ms)
    }

    /// Set the mutation mode.
    pub fn with_mutation_mode(mut self, mode: MutationMode) -> Self {
        self.mutation_mode = mode;
        self
    }

    /// Set the undo window in milliseconds.
    pub fn with_undoable_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.undoable_timeout_ms = timeout_ms;
        self
    }

    /// Set the live mode.
    pub fn with_live_mode(mut self, mode: LiveMode) -> Self {
        self.live_mode = mode;
        self
    }
}
