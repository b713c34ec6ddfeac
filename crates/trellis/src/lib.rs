//! Trellis: headless scaffolding for CRUD admin applications.
//!
//! This crate composes the pieces from [`trellis_core`] and
//! [`trellis_query`] into one application handle.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use trellis::{ResourceSpec, Trellis, View};
//! use trellis::providers::Location;
//! use trellis::query::MemoryDataProvider;
//!
//! let app = Trellis::builder()
//!     .data_provider(Arc::new(MemoryDataProvider::new()))
//!     .resource(ResourceSpec::new("posts").with_list("PostList"))
//!     .build()
//!     .unwrap();
//!
//! let menu = app.menu(&Location::parse("/posts"));
//! assert_eq!(menu.selected_key, "/posts");
//!
//! let view = tokio_test::block_on(app.render(&Location::parse("/")));
//! assert_eq!(view, View::Redirect { to: "/posts".to_string() });
//! ```

#![doc = include_str!("../README.md")]

pub mod app;

pub use app::{App, Menu, Trellis, TrellisBuilder};

pub use trellis_core::providers;
pub use trellis_core::{
    AppOptions, AuthError, CustomRoute, Error, HttpError, LiveMode, MenuItem, MutationMode,
    PageProps, PageRef, ResourceDescriptor, ResourceRegistry, ResourceSpec, Result, Route,
    RouteTable, View,
};

/// Cache, hooks and in-memory providers.
pub mod query {
    pub use trellis_query::*;
}
