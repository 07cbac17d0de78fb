//! Protocol commands
//!
//! Builds the ASCII frames understood by the controller and classifies
//! its answers.

use serde::{Deserialize, Serialize};

use super::{ProtocolError, UNKNOWN_COMMAND};

/// Commands sent to the controller (terminator not included)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Read a value: `<code>?`
    Query(String),
    /// Write a value: `<code><integer>`, answered by the echoed integer
    Set { code: String, value: i64 },
    /// Store the current configuration in non-volatile memory (`M`)
    Save,
    /// Clear the error register (`c`)
    ClearErrors,
}

impl Command {
    /// Query command for a wire code
    pub fn query(code: impl Into<String>) -> Self {
        Command::Query(code.into())
    }

    /// Set command for a wire code
    pub fn set(code: impl Into<String>, value: i64) -> Self {
        Command::Set {
            code: code.into(),
            value,
        }
    }

    /// ASCII bytes of the command, without line terminator
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::Query(code) => format!("{code}?").into_bytes(),
            Command::Set { code, value } => format!("{code}{value}").into_bytes(),
            Command::Save => b"M".to_vec(),
            Command::ClearErrors => b"c".to_vec(),
        }
    }

}

/// Whether a query answer warrants one more attempt.
///
/// Timeouts and the parser's "unknown command" answer are transient.
pub fn is_retryable(response: Option<&str>) -> bool {
    match response {
        None => true,
        Some(line) => line.strip_suffix('\n') == Some(UNKNOWN_COMMAND),
    }
}

/// Check the answer to a set command.
///
/// The controller echoes the value on success, e.g. `500` for `L500`, and
/// answers with a message such as `value out of range (200...2000 mA)`
/// otherwise.
pub fn check_confirmation(
    code: &str,
    value: i64,
    response: Option<&str>,
) -> Result<(), ProtocolError> {
    let Some(response) = response else {
        return Err(ProtocolError::SetTimeout {
            code: code.to_string(),
            value,
        });
    };

    let confirmation = response.trim();
    if confirmation != value.to_string() {
        return Err(ProtocolError::DeviceRejected {
            code: code.to_string(),
            value,
            message: confirmation.to_string(),
        });
    }

    Ok(())
}

/// Parse an integer answer
pub fn parse_integer(command: &str, response: &str) -> Result<i64, ProtocolError> {
    response
        .trim()
        .parse::<i64>()
        .map_err(|_| ProtocolError::InvalidResponse {
            command: command.to_string(),
            response: response.to_string(),
        })
}
