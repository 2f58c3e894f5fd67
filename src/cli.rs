//! Command-line interface definitions using clap

use clap::{Parser, Subcommand};

/// linktrail - URL shortener with click limits and access logs
#[derive(Parser, Debug)]
#[command(name = "linktrail")]
#[command(version)]
#[command(about = "URL shortener with click limits and access logs", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(long, short = 'c', global = true, default_value = crate::config::DEFAULT_CONFIG_PATH)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Run one expired-link sweep and exit
    Sweep {
        /// Only count what would be retired
        #[arg(long)]
        dry_run: bool,
    },

    /// Issue a bearer token for an owner ID (signed with auth.jwt_secret)
    Token {
        /// Owner (user) ID
        #[arg(long)]
        user_id: i64,

        /// Token lifetime in hours
        #[arg(long, default_value_t = 24)]
        ttl_hours: i64,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file (prints to stdout without a path)
    Generate {
        output_path: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Serve)
    }
}
