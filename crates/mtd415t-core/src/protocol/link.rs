//! Byte link abstraction
//!
//! The session only needs a duplex channel that can be opened lazily and
//! that hands back complete lines. Real hardware goes through
//! [`SerialLink`](super::SerialLink), tests through [`MockLink`](super::MockLink).

use super::ProtocolError;

/// Duplex byte channel delivering newline-terminated lines
pub trait ByteLink: Send {
    /// Open the underlying channel. Opening an open link is a no-op.
    fn open(&mut self) -> Result<(), ProtocolError>;

    /// Close the underlying channel
    fn close(&mut self) -> Result<(), ProtocolError>;

    /// Whether the channel is currently open
    fn is_open(&self) -> bool;

    /// Transmit all bytes
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Poll for one complete line, terminator included.
    ///
    /// Returns `Ok(None)` when no complete line is buffered yet; the caller
    /// decides how long to keep polling.
    fn read_line(&mut self) -> Result<Option<String>, ProtocolError>;
}

impl<L: ByteLink + ?Sized> ByteLink for Box<L> {
    fn open(&mut self) -> Result<(), ProtocolError> {
        (**self).open()
    }

    fn close(&mut self) -> Result<(), ProtocolError> {
        (**self).close()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        (**self).write_all(data)
    }

    fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        (**self).read_line()
    }
}
