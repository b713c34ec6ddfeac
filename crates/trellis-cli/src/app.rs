//! The `trellis` command-line application.
//!
//! Composes the manifest into an [`App`] backed by in-memory providers and
//! prints what it derives: routes, menus and resolved views.

use std::fmt::Write as _;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use trellis::providers::Location;
use trellis::query::{MemoryAuthProvider, MemoryDataProvider};
use trellis::{App, Menu, Result, RouteTable, View};

use crate::cli::{CliArgs, Command};
use crate::config::TrellisConfig;
use crate::config_handlers;

// ============================================================================
// TrellisCli
// ============================================================================

/// CLI application over one manifest.
#[derive(Debug, Clone)]
pub struct TrellisCli {
    config: TrellisConfig,
    version: String,
}

impl TrellisCli {
    /// Create from CLI args, loading the manifest from file and env.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let config = TrellisConfig::load(args.config.as_deref())?;
        Ok(Self::new(config))
    }

    /// CLI over an already loaded manifest.
    pub fn new(config: TrellisConfig) -> Self {
        Self {
            config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// The manifest.
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Compose the manifest. Sessions are logged in unless `unauthenticated`,
    /// in which case an auth provider with no session is installed.
    pub fn compose(&self, unauthenticated: bool) -> Result<App> {
        let mut builder = self
            .config
            .to_builder()
            .data_provider(Arc::new(MemoryDataProvider::new()));
        if unauthenticated {
            builder = builder.auth_provider(Arc::new(MemoryAuthProvider::new()));
        }
        builder.build()
    }

    /// Run one command, writing its output to stdout.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        let output = match args.command {
            Some(Command::Routes { unauthenticated }) => {
                let app = self.compose(unauthenticated)?;
                let table = if unauthenticated {
                    app.unauthenticated_routes()
                } else {
                    app.routes()
                };
                format_routes(table)
            }
            Some(Command::Menu { path }) => {
                let app = self.compose(false)?;
                format_menu(&app.menu(&Location::parse(&path)))
            }
            Some(Command::Resolve {
                path,
                unauthenticated,
            }) => {
                let app = self.compose(unauthenticated)?;
                let view = app.render(&Location::parse(&path)).await;
                tracing::debug!(%path, unauthenticated, "resolved");
                format_view(&view)?
            }
            Some(Command::Config(config_cmd)) => config_handlers::handle_config_command(
                args.config.as_deref(),
                &self.config,
                config_cmd.command,
            )?,
            None => format!(
                "{} ({} {}): use --help for usage\n",
                self.config.title,
                env!("CARGO_PKG_NAME"),
                self.version
            ),
        };
        print!("{output}");
        Ok(())
    }
}

// ============================================================================
// Output formatting
// ============================================================================

/// One line per route, in match order.
pub fn format_routes(table: &RouteTable) -> String {
    let rows: Vec<(String, String)> = table.iter().map(|r| (r.path(), r.describe())).collect();
    let width = rows.iter().map(|(path, _)| path.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (path, description) in rows {
        let _ = writeln!(out, "{path:<width$}  {description}");
    }
    out
}

/// Selected key, then one line per item with a marker on the selected one.
pub fn format_menu(menu: &Menu) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "selected: {}", menu.selected_key);
    let width = menu
        .items
        .iter()
        .map(|item| item.label.len())
        .max()
        .unwrap_or(0);
    for item in &menu.items {
        let marker = if item.key == menu.selected_key { '*' } else { ' ' };
        let _ = writeln!(out, "{marker} {:<width$}  {}", item.label, item.route);
    }
    out
}

/// Pretty JSON of the view.
pub fn format_view(view: &View) -> Result<String> {
    let mut json = serde_json::to_string_pretty(view)?;
    json.push('\n');
    Ok(json)
}

// ============================================================================
// Tests
// ============================================================================
