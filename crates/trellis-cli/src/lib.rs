//! Command-line inspection of Trellis application manifests.
//!
//! # Key Abstractions
//!
//! - [`TrellisConfig`]: the TOML manifest (resources, custom routes, pages,
//!   options) loaded with file, env and default layers
//! - [`TrellisCli`]: composes the manifest and prints routes, menus and
//!   resolved views

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::TrellisCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand};
pub use config::{PagesConfig, TrellisConfig};
