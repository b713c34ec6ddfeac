//! Trellis Query: cache keys, the shared query cache and the data-access hooks.
//!
//! Depends on `trellis-core` (dependency level 1).
//!
//! # Modules
//!
//! - [`key`]: Normalised cache keys
//! - [`cache`]: Shared query cache with change listeners
//! - [`env`]: Per-application environment handed to every hook
//! - [`hooks`]: Read and write hooks with notifications, invalidation and
//!   mutation modes
//! - [`undo`]: Undo windows for undoable mutations
//! - [`live`]: Resource subscriptions and the in-process live provider
//! - [`auth`]: Login, logout and session checks
//! - [`form`]: Form submission and redirection
//! - [`memory`]: In-memory providers

#![doc = include_str!("../README.md")]

pub mod auth;
pub mod cache;
pub mod env;
pub mod form;
pub mod hooks;
pub mod key;
pub mod live;
pub mod memory;
pub mod undo;

pub use auth::{AuthHooks, LOGIN_ERROR_KEY};
pub use cache::{CacheEntry, CacheEvent, CacheListenerId, CacheSnapshot, QueryCache};
pub use env::{Env, EnvBuilder};
pub use form::{FormAction, FormController, RedirectionType, redirect_path};
pub use hooks::{DataHooks, MutationConfig, NotifyConfig};
pub use key::QueryKey;
pub use live::{Live, LiveSubscription, LocalLiveProvider};
pub use memory::{MemoryAuthProvider, MemoryDataProvider, MemoryRouter, RecordingNotifier};
pub use undo::{UndoOutcome, UndoRegistry, UndoWindow};
