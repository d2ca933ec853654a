//! JSON I/O handling for CLI
//!
//! - Input: one JSON value (query) or one JSON event per line (serve)
//! - Output: one JSON object per reply on stdout
//! - UTF-8 only
//!
//! The readers and writers are generic so commands can be driven from
//! memory in tests; the command entry points pass stdin and stdout.

use std::io::{BufRead, Read, Write};

use serde::Serialize;
use serde_json::Value;

use crate::session::SessionEvent;

use super::errors::{CliError, CliResult};

/// Reads the whole input as one event or an array of events
pub fn read_events(mut input: impl Read) -> CliResult<Vec<SessionEvent>> {
    let mut raw = String::new();
    input.read_to_string(&mut raw)?;

    if raw.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    match serde_json::from_str::<Value>(&raw)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(CliError::from))
            .collect(),
        single => Ok(vec![serde_json::from_value(single)?]),
    }
}

/// Line-delimited events; blank lines are skipped
pub fn read_event_lines(input: impl BufRead) -> impl Iterator<Item = CliResult<SessionEvent>> {
    input
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(CliError::from)?;
            serde_json::from_str(&line).map_err(CliError::from)
        })
}

/// Writes `{"status":"ok","data":..}`
pub fn write_response(mut out: impl Write, data: &impl Serialize) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

/// Writes `{"status":"error","code":..,"message":..}`
pub fn write_error(mut out: impl Write, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    serde_json::to_writer(&mut out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}
