//! Protocol errors

use thiserror::Error;

/// Errors that can occur during protocol communication
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serial port error: {0}")]
    SerialError(String),

    #[error("Timeout while setting {code} to {value}")]
    SetTimeout { code: String, value: i64 },

    #[error("Device reported an error in '{code}' setting to {value}, error: {message}")]
    DeviceRejected {
        code: String,
        value: i64,
        message: String,
    },

    #[error("Invalid response to '{command}': {response:?}")]
    InvalidResponse { command: String, response: String },

    #[error("Communication log sink error: {0}")]
    LogSink(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serialport::Error> for ProtocolError {
    fn from(e: serialport::Error) -> Self {
        ProtocolError::SerialError(e.to_string())
    }
}
