//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "klokku",
    version,
    about = "Command-line client for the Klokku time budgeting service"
)]
pub struct Cli {
    /// Klokku server URL
    #[arg(long, global = true, env = "KLOKKU_URL")]
    pub url: Option<String>,

    /// Username to log in as (defaults to the last one used)
    #[arg(short, long, global = true, env = "KLOKKU_USERNAME")]
    pub username: Option<String>,

    /// Bearer token for servers behind an authenticating proxy
    #[arg(long, global = true, env = "KLOKKU_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Path to the config file
    #[arg(long, global = true, env = "KLOKKU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List users known to the server
    Users,

    /// List budgets
    Budgets {
        /// Only budgets whose date range includes today
        #[arg(long)]
        active: bool,
    },

    /// Show the event currently being tracked
    Current,

    /// Start tracking a budget
    Switch {
        /// Budget ID (see `klokku budgets`)
        budget_id: i64,
    },

    /// Show or change stored configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the stored configuration
    Show,

    /// Store a configuration value
    Set { key: ConfigKey, value: String },

    /// Remove a stored configuration value
    Unset { key: ConfigKey },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKey {
    Url,
    Username,
    Timeout,
    Retries,
    SessionTtl,
}
