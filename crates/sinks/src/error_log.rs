//! Insert error log
//!
//! Every table a sink failed to write is appended to a file as one JSON
//! record, so the rows can be inspected or replayed by hand:
//!
//! ```json
//! {"timestamp":1700000000,"timestamp_string":"2023-11-14T22:13:20+00:00",
//!  "error":"...","table":"db.events","fields":"id,name","rows":[[1,"a"]]}
//! ```

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};

use chrono::Utc;
use parking_lot::Mutex;
use rowbatch_config::ErrorLogConfig;
use rowbatch_table::{Table, Value};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

#[derive(Serialize)]
struct ErrorRecord<'a> {
    timestamp: i64,
    timestamp_string: String,
    error: String,
    table: &'a str,
    fields: String,
    rows: Vec<&'a [Value]>,
}

/// Appends failed tables to a file
///
/// A logger without a file accepts every call and writes nothing.
pub struct InsertErrorLogger {
    file: Option<Mutex<File>>,
    pretty_print: bool,
}

impl InsertErrorLogger {
    /// Open the configured file for appending, creating it if needed
    pub fn from_config(config: &ErrorLogConfig) -> io::Result<Self> {
        let Some(ref path) = config.path else {
            return Ok(Self::disabled());
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(Mutex::new(file)),
            pretty_print: config.pretty_print,
        })
    }

    /// Logger that writes nothing
    pub const fn disabled() -> Self {
        Self {
            file: None,
            pretty_print: false,
        }
    }

    /// Whether records are written anywhere
    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    /// Append one record for a table that failed to insert
    pub fn log(&self, error: &dyn Display, table: &Table) -> io::Result<()> {
        let Some(ref file) = self.file else {
            return Ok(());
        };

        let now = Utc::now();
        let signature = table.signature();
        let record = ErrorRecord {
            timestamp: now.timestamp(),
            timestamp_string: now.to_rfc3339(),
            error: error.to_string(),
            table: signature.name(),
            fields: signature.field_list(),
            rows: table.rows().collect(),
        };

        let mut buf = Vec::with_capacity(256);
        if self.pretty_print {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
            record.serialize(&mut ser)?;
        } else {
            serde_json::to_writer(&mut buf, &record)?;
        }
        buf.push(b'\n');

        file.lock().write_all(&buf)
    }
}

impl Default for InsertErrorLogger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for InsertErrorLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsertErrorLogger")
            .field("enabled", &self.is_enabled())
            .field("pretty_print", &self.pretty_print)
            .finish()
    }
}

#[cfg(test)]
#[path = "error_log_test.rs"]
mod error_log_test;
