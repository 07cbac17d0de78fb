//! Serial port handling
//!
//! Provides the `serialport`-backed [`ByteLink`] used with real hardware.

use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

use super::{ByteLink, ProtocolError, DEFAULT_BAUD_RATE};

/// Port-level timeout for a single read/write call.
/// Line timeouts are enforced by the session, so this stays short.
const PORT_TIMEOUT_MS: u64 = 10;

/// Serial link to the controller, opened on first use
pub struct SerialLink {
    /// Port name (e.g., "/dev/ttyUSB0" or "COM3")
    port_name: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
    /// Bytes received after the last complete line
    pending: Vec<u8>,
}

impl SerialLink {
    /// Create a link for the given port. Nothing is opened yet.
    pub fn new(port_name: impl Into<String>, baud_rate: Option<u32>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: baud_rate.unwrap_or(DEFAULT_BAUD_RATE),
            port: None,
            pending: Vec::new(),
        }
    }

    /// Port name this link talks to
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Configured baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Split one line (terminator included) off the pending buffer
    fn take_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|b| *b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

/// Open a serial port with 8N1 framing and no flow control
pub fn open_port(name: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, ProtocolError> {
    let mut port = serialport::new(name, baud_rate)
        .timeout(Duration::from_millis(PORT_TIMEOUT_MS))
        .open()?;
    configure_port(port.as_mut())?;
    port.clear(serialport::ClearBuffer::All)?;
    Ok(port)
}

/// Configure a serial port for controller communication
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)?;
    port.set_parity(serialport::Parity::None)?;
    port.set_stop_bits(serialport::StopBits::One)?;
    port.set_flow_control(serialport::FlowControl::None)?;
    Ok(())
}

impl ByteLink for SerialLink {
    fn open(&mut self) -> Result<(), ProtocolError> {
        if self.port.is_some() {
            return Ok(());
        }
        tracing::debug!(port = %self.port_name, baud = self.baud_rate, "opening serial port");
        self.port = Some(open_port(&self.port_name, self.baud_rate)?);
        self.pending.clear();
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProtocolError> {
        if self.port.take().is_some() {
            tracing::debug!(port = %self.port_name, "serial port closed");
        }
        self.pending.clear();
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| ProtocolError::SerialError("port is not open".to_string()))?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let port = self
            .port
            .as_mut()
            .ok_or_else(|| ProtocolError::SerialError("port is not open".to_string()))?;

        let available = port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(None);
        }

        let mut buffer = vec![0u8; available];
        match port.read(&mut buffer) {
            Ok(n) => self.pending.extend_from_slice(&buffer[..n]),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock => {}
            Err(e) => return Err(e.into()),
        }

        Ok(self.take_line())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_link_is_closed() {
        let link = SerialLink::new("/dev/ttyUSB0", None);
        assert!(!link.is_open());
        assert_eq!(link.baud_rate(), DEFAULT_BAUD_RATE);
        assert_eq!(link.port_name(), "/dev/ttyUSB0");
    }

    #[test]
    fn test_take_line_keeps_remainder() {
        let mut link = SerialLink::new("/dev/null", Some(9600));
        link.pending.extend_from_slice(b"15025\n200");
        assert_eq!(link.take_line().as_deref(), Some("15025\n"));
        assert_eq!(link.take_line(), None);
        link.pending.extend_from_slice(b"0\r\n");
        assert_eq!(link.take_line().as_deref(), Some("2000\r\n"));
    }

    #[test]
    fn test_write_on_closed_link_fails() {
        let mut link = SerialLink::new("/dev/null", None);
        let err = link.write_all(b"T?\n").unwrap_err();
        assert!(matches!(err, ProtocolError::SerialError(_)));
    }
}
