//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Inspect a Trellis application manifest.
#[derive(Parser, Debug)]
#[command(name = "trellis", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the manifest.
    #[arg(short, long, env = "TRELLIS_CONFIG", global = true)]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the derived route table.
    Routes {
        /// Print the table used before login instead.
        #[arg(long)]
        unauthenticated: bool,
    },

    /// Print the menu and the entry a path selects.
    Menu {
        /// Current path.
        #[arg(short, long, default_value = "/")]
        path: String,
    },

    /// Print the view a path renders to.
    Resolve {
        /// Path, optionally with a query string.
        path: String,

        /// Resolve as a session that is not logged in.
        #[arg(long)]
        unauthenticated: bool,
    },

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved manifest path.
    Path,

    /// Print the effective configuration as TOML.
    Show,

    /// Print the effective configuration as environment variables.
    Env {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}
