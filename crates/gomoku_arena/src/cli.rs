//! Command-line interface for gomoku_arena.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Gomoku Arena - staked two-player gomoku server
#[derive(Parser, Debug)]
#[command(name = "gomoku_arena")]
#[command(about = "Staked gomoku session server with live events", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file (falls back to GOMOKU_ARENA_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// SQLite database file (created if it doesn't exist)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Replay every stored session and print the reconciliation report
    Audit {
        /// SQLite database file to audit
        #[arg(long)]
        database_url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_overrides_parse() {
        let cli = Cli::parse_from(["gomoku_arena", "serve", "--port", "4000", "--database-url", "arena.db"]);
        match cli.command {
            Command::Serve { host, port, database_url } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(4000));
                assert_eq!(database_url.as_deref(), Some("arena.db"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
