//! Application manifest.
//!
//! [`TrellisConfig`] declares resources, custom routes, the special pages and
//! the application options. It loads from TOML files, environment variables
//! and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `TRELLIS_CONFIG` environment variable
//! 3. XDG default: `~/.config/trellis/config.toml`
//! 4. Built-in defaults
//!
//! # Example manifest
//!
//! ```toml
//! title = "Blog admin"
//!
//! [options]
//! mutation_mode = "undoable"
//!
//! [pages]
//! dashboard = "Dashboard"
//! login = "Login"
//!
//! [[resources]]
//! name = "posts"
//! list = "PostList"
//! edit = "PostEdit"
//! can_delete = true
//!
//! [[custom_routes]]
//! path = "/reports"
//! page = "Reports"
//! ```

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use trellis::{AppOptions, CustomRoute, Error, PageRef, ResourceSpec, Result, TrellisBuilder};

const ENV_PREFIX: &str = "TRELLIS";

// ============================================================================
// Configuration structs
// ============================================================================

/// Everything an application is composed from, minus its providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrellisConfig {
    /// Application title, shown in CLI output.
    pub title: String,

    /// Options shared by every hook.
    pub options: AppOptions,

    /// Special pages.
    pub pages: PagesConfig,

    /// Resources in menu and route order.
    pub resources: Vec<ResourceSpec>,

    /// Routes matched before the generated ones.
    pub custom_routes: Vec<CustomRoute>,
}

/// Page references for the routes that are not resource pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagesConfig {
    /// Rendered at `/`.
    pub dashboard: Option<PageRef>,

    /// Rendered at `/` and `/login` before login.
    pub login: Option<PageRef>,

    /// Rendered when no resources are declared.
    pub ready: Option<PageRef>,

    /// Rendered for denied or unmatched routes.
    pub error: Option<PageRef>,

    /// Rendered instead of the error page when set.
    pub catch_all: Option<PageRef>,
}

impl Default for TrellisConfig {
    fn default() -> Self {
        Self {
            title: "Trellis".to_string(),
            options: AppOptions::default(),
            pages: PagesConfig::default(),
            resources: Vec::new(),
            custom_routes: Vec::new(),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl TrellisConfig {
    /// Load the manifest from file, environment and defaults.
    ///
    /// A path that does not exist yields the defaults plus the environment
    /// overlay.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading manifest");
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            } else {
                tracing::debug!(path = %path.display(), "manifest not found, using defaults");
            }
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("options");
        env_opts.add_section("pages");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the manifest path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("TRELLIS_CONFIG") {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// The XDG default manifest path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("trellis").join("config.toml"))
    }

    /// Application builder carrying this manifest's resources, routes,
    /// pages and options. Providers are left to the caller.
    pub fn to_builder(&self) -> TrellisBuilder {
        let mut builder = trellis::Trellis::builder()
            .resources(self.resources.iter().cloned())
            .custom_routes(self.custom_routes.iter().cloned())
            .options(self.options.clone());

        let pages = &self.pages;
        if let Some(page) = &pages.dashboard {
            builder = builder.dashboard(page.clone());
        }
        if let Some(page) = &pages.login {
            builder = builder.login_page(page.clone());
        }
        if let Some(page) = &pages.ready {
            builder = builder.ready_page(page.clone());
        }
        if let Some(page) = &pages.error {
            builder = builder.error_page(page.clone());
        }
        if let Some(page) = &pages.catch_all {
            builder = builder.catch_all(page.clone());
        }
        builder
    }

    /// Pretty-printed TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten into `TRELLIS_`-prefixed environment variable pairs. Arrays
    /// (resources, custom routes) are rendered as JSON.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        collect_env_pairs(ENV_PREFIX, &value, &mut vars)?;
        Ok(vars)
    }
}

fn collect_env_pairs(
    name: &str,
    value: &toml::Value,
    out: &mut Vec<(String, String)>,
) -> Result<()> {
    let rendered = match value {
        toml::Value::Table(table) => {
            for (key, nested) in table {
                collect_env_pairs(&format!("{name}_{}", key.to_uppercase()), nested, out)?;
            }
            return Ok(());
        }
        toml::Value::Array(items) => serde_json::to_string(items)?,
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    out.push((name.to_string(), rendered));
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
