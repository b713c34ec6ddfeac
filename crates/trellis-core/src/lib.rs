//! Trellis Core: shared types, provider traits, and pure derivations.
//!
//! This crate provides the foundational types used across all Trellis crates.
//! It has no internal Trellis dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`providers`]: Traits for the user-supplied data, auth, live, router,
//!   access-control, translation and notification providers
//! - [`resource`]: Resource specifications and the ordered registry
//! - [`notification`]: Mutation-notification reducer and notifier
//! - [`store`]: Reducer store with change listeners
//! - [`clock`]: Injected time source
//! - [`naming`]: Human-readable resource names
//! - [`menu`]: Menu items and selected-key derivation
//! - [`routes`]: Route table generation, matching and access guarding
//! - [`options`]: Application-wide options

#![doc = include_str!("../README.md")]

pub mod clock;
pub mod error;
pub mod menu;
pub mod naming;
pub mod notification;
pub mod options;
pub mod providers;
pub mod resource;
pub mod routes;
pub mod store;

// Re-export key types at crate root for convenience
pub use clock::{Clock, SystemClock};
pub use error::{AuthError, Error, HttpError, Result};
pub use menu::{
    DashboardMenuOptions, MenuItem, NOT_FOUND_KEY, derive_menu_items, derive_selected_key,
};
pub use notification::{
    MutationNotification, NotificationAction, NotificationArgs, NotificationKey,
    NotificationKind, NotificationOverride, NotificationState, NotificationStore, Notifier,
    TICK_MS, reduce,
};
pub use options::{AppOptions, LiveMode, MutationMode, QueryOptions};
pub use resource::{PageRef, ResourceDescriptor, ResourceRegistry, ResourceSpec};
pub use routes::{
    AccessGuard, CustomRoute, Fallbacks, PageProps, Route, RouteAction, RouteEntry, RouteMatch,
    RouteTable, View, derive_route_table,
};
pub use store::{ListenerId, Store};
