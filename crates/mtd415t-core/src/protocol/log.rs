//! Communication log
//!
//! Bounded record of every frame written to and every line read from the
//! controller. Optionally mirrored to a sink as JSON lines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::ProtocolError;

/// Marker rendered for a read that produced no line
pub const NO_CONTENT: &str = "<none>";

/// Direction of a logged exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    /// Bytes sent to the controller
    Write,
    /// Line received from the controller (or a timed out read)
    Read,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogKind::Write => f.write_str("write"),
            LogKind::Read => f.write_str("read"),
        }
    }
}

/// One logged write or read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Write or read
    pub kind: LogKind,
    /// Wall-clock time the entry was recorded
    pub timestamp: DateTime<Utc>,
    /// Exact text sent or received; `None` for a read that timed out
    pub content: Option<String>,
}

impl LogEntry {
    /// Create an entry stamped with the current time
    pub fn new(kind: LogKind, content: Option<String>) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
            content,
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.timestamp.to_rfc3339(), self.kind)?;
        match &self.content {
            Some(content) => write!(f, "{:?}", content),
            None => f.write_str(NO_CONTENT),
        }
    }
}

/// Destination mirroring every log entry
pub type LogSink = Box<dyn Write + Send>;

/// Open (or create) a file sink, appending to existing content
pub fn open_file_sink(path: impl AsRef<Path>) -> Result<LogSink, ProtocolError> {
    let path = path.as_ref();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ProtocolError::LogSink(format!("{}: {}", path.display(), e)))?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Fixed-capacity log; the oldest entry is evicted first
pub struct CommunicationLog {
    entries: VecDeque<LogEntry>,
    max_length: usize,
    sink: Option<LogSink>,
}

impl CommunicationLog {
    /// Create a log keeping at most `max_length` entries
    pub fn new(max_length: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_length),
            max_length,
            sink: None,
        }
    }

    /// Attach a sink receiving every entry from now on
    pub fn set_sink(&mut self, sink: LogSink) {
        self.sink = Some(sink);
    }

    /// Record an entry, evicting the oldest one if the log is full
    pub fn record(&mut self, kind: LogKind, content: Option<String>) {
        let entry = LogEntry::new(kind, content);

        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = write_entry(sink, &entry) {
                tracing::warn!("failed to write communication log entry: {e}");
            }
        }

        if self.max_length == 0 {
            return;
        }
        if self.entries.len() >= self.max_length {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries, oldest first
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Number of entries currently kept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Newline-separated rendering, oldest first
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&entry.to_string());
            out.push('\n');
        }
        out
    }
}

impl Drop for CommunicationLog {
    fn drop(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            let _ = sink.flush();
        }
    }
}

fn write_entry(sink: &mut LogSink, entry: &LogEntry) -> std::io::Result<()> {
    serde_json::to_writer(&mut *sink, entry)?;
    sink.write_all(b"\n")?;
    sink.flush()
}
