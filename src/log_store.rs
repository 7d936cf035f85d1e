//! Append-only prompt log.
//!
//! Every user turn in the chat is recorded as one CSV row of
//! `(timestamp, text)` before the LLM is even contacted. The dashboard
//! reads the whole file back and derives its tables from it. Rows are
//! never rewritten or reordered, only appended.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constants::LOG_TIMESTAMP_FORMAT;

/// Errors from the prompt log store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No log file exists yet. This is a normal condition for a fresh
    /// deployment; callers treat it as an empty dataset.
    #[error("no prompt log at {0}")]
    NotFound(PathBuf),

    /// IO error while appending or reading
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A row that could not be decoded as a two-field CSV record
    #[error("malformed log row: {0}")]
    Malformed(#[from] csv::Error),
}

/// One logged user turn.
///
/// The timestamp is kept as the raw string from the file; rows written by
/// older or foreign tooling may carry timestamps we cannot parse, and the
/// dashboard must still render the rest of the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub text: String,
}

impl LogRecord {
    /// Parse the timestamp in the fixed log format.
    ///
    /// Returns `None` for malformed timestamps; time-bucketed aggregation
    /// silently skips those rows while length and word analyses keep them.
    pub fn parse_timestamp(&self) -> Option<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.timestamp.trim(), LOG_TIMESTAMP_FORMAT).ok()
    }
}

/// Handle to the on-disk prompt log.
pub struct LogStore {
    path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one `(timestamp, text)` row to the end of the log.
    ///
    /// The file is opened, written, and closed within this call. The row is
    /// RFC 4180 quoted, so free-form text containing commas, quotes, or
    /// newlines round-trips exactly through `read_all`.
    pub fn append(&self, timestamp: NaiveDateTime, text: &str) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        writer.write_record([
            timestamp.format(LOG_TIMESTAMP_FORMAT).to_string().as_str(),
            text,
        ])?;
        writer.flush()?;
        debug!(path = %self.path.display(), "Appended prompt to log");
        Ok(())
    }

    /// Read every record back, in append order.
    ///
    /// Fails with [`StoreError::NotFound`] when the log has never been
    /// written; see [`LogStore::read_all_or_empty`] for the common
    /// dashboard-side handling.
    pub fn read_all(&self) -> Result<Vec<LogRecord>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(file);
        let mut records = Vec::new();
        for row in reader.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }

    /// Like `read_all`, but a missing log is an empty dataset.
    pub fn read_all_or_empty(&self) -> Result<Vec<LogRecord>, StoreError> {
        match self.read_all() {
            Ok(records) => Ok(records),
            Err(StoreError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}
