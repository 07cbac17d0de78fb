//! Serial Protocol Communication
//!
//! Implements the MTD415T ASCII line protocol.
//!
//! Every command is a single newline-terminated line. Queries are `<code>?`,
//! set commands are `<code><integer>` and the device echoes the integer back
//! as confirmation.

pub mod commands;
mod error;
pub mod link;
pub mod log;
pub mod mock;
pub mod serial;
mod session;
mod throttle;

pub use commands::Command;
pub use error::ProtocolError;
pub use link::ByteLink;
pub use log::{open_file_sink, CommunicationLog, LogEntry, LogKind, LogSink};
pub use mock::{MockHandle, MockLink};
pub use serial::SerialLink;
pub use session::Session;
pub use throttle::QueryThrottler;

/// Default baud rate of the MTD415T
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Default read timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default minimal spacing between two queries in milliseconds
///
/// Faster queries make the command parser answer with "unknown command".
pub const DEFAULT_MIN_QUERY_INTERVAL_MS: u64 = 10;

/// Delay before the single retry of a failed query
pub const RETRY_DELAY_MS: u64 = 100;

/// Maximum number of attempts for a query with retry enabled
pub const MAX_QUERY_ATTEMPTS: usize = 2;

/// Default number of entries kept in the communication log
pub const DEFAULT_MAX_LOG_LENGTH: usize = 100;

/// Line the device sends back when it could not parse a command
pub const UNKNOWN_COMMAND: &str = "unknown command";

/// Line terminator appended to every command
pub const LINE_ENDING: &[u8] = b"\n";
