//! CLI module for sheetscope
//!
//! Provides command-line interface for:
//! - init: Create the data directory, default config and sample dataset
//! - query: Apply a batch of events and print the replies
//! - serve: Line-delimited event loop over stdin/stdout

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{init, query, run, run_command, serve};
pub use config::{Config, LayoutChoice};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_event_lines, read_events, write_error, write_response};
