//! CLI argument definitions using clap
//!
//! Commands:
//! - sheetscope init --config <path>
//! - sheetscope query --config <path>
//! - sheetscope serve --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sheetscope - filter, sort and page a tabular dataset from JSON events
#[derive(Parser, Debug)]
#[command(name = "sheetscope")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data directory, writing a default config and sample dataset if missing
    Init {
        /// Path to configuration file
        #[arg(long, default_value = "./sheetscope.json")]
        config: PathBuf,
    },

    /// Apply a JSON array of events read from stdin and print one reply
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./sheetscope.json")]
        config: PathBuf,
    },

    /// Read line-delimited events from stdin, replying to each
    Serve {
        /// Path to configuration file
        #[arg(long, default_value = "./sheetscope.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["sheetscope", "serve"]).unwrap();
        match cli.command {
            Command::Serve { config } => assert_eq!(config, PathBuf::from("./sheetscope.json")),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_explicit_config_path() {
        let cli = Cli::try_parse_from(["sheetscope", "query", "--config", "/tmp/s.json"]).unwrap();
        assert!(matches!(cli.command, Command::Query { config } if config == PathBuf::from("/tmp/s.json")));
    }
}
