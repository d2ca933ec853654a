//! CLI command implementations
//!
//! Every command loads and validates the config first. `query` and `serve`
//! then load the dataset, open the durable store and drive one session.

use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::json;

use crate::clock::SystemClock;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::persistence::FileStore;
use crate::records::{Dataset, RecordStore};
use crate::session::{Session, SessionReply};

use super::args::Command;
use super::config::{Config, LayoutChoice};
use super::errors::{CliError, CliErrorCode, CliResult};
use super::io::{read_event_lines, read_events, write_error, write_response};

const SAMPLE_DATASET: &str = include_str!("../../data/people.json");
const DEFAULT_DATA_DIR: &str = "sheetscope-data";

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Init { config } => init(&config, io::stdout().lock()),
        Command::Query { config } => query(&config, io::stdin().lock(), io::stdout().lock()),
        Command::Serve { config } => serve(&config, io::stdin().lock(), io::stdout().lock()),
    }
}

/// Initialize a data directory
///
/// - Writes a default config if `config_path` does not exist
/// - Creates the durable store directory
/// - Writes the sample people dataset if the dataset file is missing
pub fn init(config_path: &Path, out: impl Write) -> CliResult<()> {
    if !config_path.exists() {
        let parent = config_path.parent().unwrap_or_else(|| Path::new(""));
        let mut config = Config::with_data_dir(parent.join(DEFAULT_DATA_DIR).to_string_lossy());
        config.layout = LayoutChoice::Named("people".to_string());
        config.save(config_path)?;
    }

    let config = Config::load(config_path)?;
    Logger::set_min_severity(config.severity()?);

    if is_initialized(&config) {
        return Err(CliError::already_initialized());
    }

    let store_dir = config.store_path();
    fs::create_dir_all(&store_dir).map_err(|e| {
        CliError::config_error(format!("Failed to create directory {:?}: {}", store_dir, e))
    })?;

    let dataset = config.dataset_path();
    let wrote_sample = !dataset.exists();
    if wrote_sample {
        fs::write(&dataset, SAMPLE_DATASET).map_err(|e| {
            CliError::dataset_error(format!("Failed to write dataset {:?}: {}", dataset, e))
        })?;
    }

    write_response(
        out,
        &json!({
            "initialized": true,
            "data_dir": config.data_dir,
            "dataset": dataset.to_string_lossy(),
            "sample_dataset": wrote_sample,
        }),
    )
}

/// Apply one event or an array of events and print every reply
///
/// The session is shut down before replying, so debounced writes land.
pub fn query(config_path: &Path, input: impl Read, mut out: impl Write) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let mut session = open_session(&config)?;

    let events = match read_events(input) {
        Ok(events) => events,
        Err(e) => {
            write_error(&mut out, e.code_str(), e.message())?;
            return Err(e);
        }
    };

    let replies: Vec<SessionReply> = events.into_iter().map(|event| session.handle(event)).collect();
    let flush_failures = session.shutdown();

    write_response(
        out,
        &json!({
            "replies": replies,
            "shutdown": flush_failures,
        }),
    )
}

/// Serving loop: one reply line per event line until end of input
///
/// Malformed events get an error line and the loop continues; an I/O
/// failure on the input ends it.
pub fn serve(config_path: &Path, input: impl BufRead, mut out: impl Write) -> CliResult<()> {
    let config = Config::load(config_path)?;
    let mut session = open_session(&config)?;

    for event in read_event_lines(input) {
        match event {
            Ok(event) => {
                let reply = session.handle(event);
                write_response(&mut out, &reply)?;
            }
            Err(e) if e.code() == &CliErrorCode::InvalidEvent => {
                log_event_with_fields(
                    Event::EventRejected,
                    &[("code", e.code_str()), ("message", e.message())],
                );
                write_error(&mut out, e.code_str(), e.message())?;
            }
            Err(e) => {
                write_error(&mut out, e.code_str(), e.message())?;
                break;
            }
        }
    }

    for failure in session.shutdown() {
        write_error(&mut out, &failure.code, &failure.message)?;
    }

    Ok(())
}

/// Loads the dataset and opens a session over the file-backed store
fn open_session(config: &Config) -> CliResult<Session> {
    Logger::set_min_severity(config.severity()?);
    log_event_with_fields(Event::ConfigLoaded, &[("data_dir", config.data_dir.as_str())]);

    if !is_initialized(config) {
        return Err(CliError::not_initialized());
    }

    let path = config.dataset_path();
    let dataset = Dataset::load(&path).map_err(|e| CliError::dataset_error(e.to_string()))?;
    let store = RecordStore::from_dataset(dataset, config.layout.resolve()?)
        .map_err(|e| CliError::dataset_error(e.to_string()))?
        .with_identity(config.identity);

    let rows = store.len().to_string();
    let dataset_name = path.to_string_lossy();
    log_event_with_fields(
        Event::DatasetLoaded,
        &[("path", &*dataset_name), ("rows", rows.as_str())],
    );

    let backend = FileStore::open(config.store_path())
        .map_err(|e| CliError::io_error(e.to_string()))?;

    Session::open(
        store,
        Arc::new(backend),
        Rc::new(SystemClock),
        config.session_options(),
    )
    .map_err(|e| CliError::config_error(e.to_string()))
}

fn is_initialized(config: &Config) -> bool {
    config.store_path().is_dir()
}
