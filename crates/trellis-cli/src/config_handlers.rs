//! Handler functions for config CLI commands.
//!
//! Implements `trellis config {path,show,env}`.

use std::fmt::Write as _;

use trellis::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::TrellisConfig;

/// Handle a config subcommand, returning what to print.
///
/// Receives the raw `--config` path as well as the loaded manifest because
/// `path` reports where the manifest is expected even when it is missing.
pub fn handle_config_command(
    config_path: Option<&str>,
    config: &TrellisConfig,
    action: ConfigAction,
) -> Result<String> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Show => config.to_toml_string(),
        ConfigAction::Env { docker_env } => cmd_config_env(config, docker_env),
    }
}

fn cmd_config_path(config_path: Option<&str>) -> Result<String> {
    let path = TrellisConfig::resolve_config_path(config_path).ok_or_else(|| {
        Error::config("Could not determine config directory for this platform")
    })?;
    if !path.exists() {
        tracing::warn!(path = %path.display(), "manifest does not exist");
    }
    Ok(format!("{}\n", path.display()))
}

fn cmd_config_env(config: &TrellisConfig, docker_env: bool) -> Result<String> {
    let mut out = String::new();
    for (key, value) in config.to_env_vars()? {
        let _ = if docker_env {
            writeln!(out, "--env {key}={value}")
        } else {
            writeln!(out, "{key}={value}")
        };
    }
    Ok(out)
}
