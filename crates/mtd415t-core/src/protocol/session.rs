//! Transport session
//!
//! Owns the byte link and the communication log. Opens the link on first
//! use, terminates every frame and bounds reads by an optional timeout.

use std::time::{Duration, Instant};

use super::{ByteLink, CommunicationLog, LogKind, LogSink, ProtocolError, LINE_ENDING};

/// Sleep between two polls of the link while waiting for a line
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Line-oriented session over a [`ByteLink`]
pub struct Session<L: ByteLink> {
    link: L,
    log: CommunicationLog,
    /// `None` waits for a line forever
    timeout: Option<Duration>,
}

impl<L: ByteLink> Session<L> {
    /// Create a session; the link is not opened until first use
    pub fn new(link: L, timeout: Option<Duration>, max_log_length: usize) -> Self {
        Self {
            link,
            log: CommunicationLog::new(max_log_length),
            timeout,
        }
    }

    /// Mirror every log entry to `sink`
    pub fn set_log_sink(&mut self, sink: LogSink) {
        self.log.set_sink(sink);
    }

    /// Open the link
    pub fn open(&mut self) -> Result<(), ProtocolError> {
        self.link.open()
    }

    /// Close the link
    pub fn close(&mut self) -> Result<(), ProtocolError> {
        self.link.close()
    }

    /// Whether the link is open
    pub fn is_open(&self) -> bool {
        self.link.is_open()
    }

    fn ensure_open(&mut self) -> Result<(), ProtocolError> {
        if !self.link.is_open() {
            self.link.open()?;
        }
        Ok(())
    }

    /// Read timeout
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Change the read timeout
    pub fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    /// Send `data` followed by a newline
    pub fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.write_with_ending(data, LINE_ENDING)
    }

    /// Send `data` followed by `line_ending`
    pub fn write_with_ending(
        &mut self,
        data: &[u8],
        line_ending: &[u8],
    ) -> Result<(), ProtocolError> {
        self.ensure_open()?;

        let mut frame = Vec::with_capacity(data.len() + line_ending.len());
        frame.extend_from_slice(data);
        frame.extend_from_slice(line_ending);

        let text = String::from_utf8_lossy(&frame).into_owned();
        tracing::debug!(frame = ?text, "write");
        self.log.record(LogKind::Write, Some(text));

        self.link.write_all(&frame)
    }

    /// Wait for one line.
    ///
    /// Returns `Ok(None)` when the timeout elapses first. Both outcomes are
    /// logged.
    pub fn read(&mut self) -> Result<Option<String>, ProtocolError> {
        self.ensure_open()?;

        let start = Instant::now();
        let line = loop {
            if let Some(line) = self.link.read_line()? {
                break Some(line);
            }
            if let Some(timeout) = self.timeout {
                if start.elapsed() > timeout {
                    break None;
                }
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        match &line {
            Some(text) => tracing::debug!(line = ?text, "read"),
            None => tracing::debug!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                "read timed out"
            ),
        }
        self.log.record(LogKind::Read, line.clone());

        Ok(line)
    }

    /// Write `cmd` and read the answer
    pub fn query(&mut self, cmd: &[u8]) -> Result<Option<String>, ProtocolError> {
        self.write(cmd)?;
        self.read()
    }

    /// Communication log
    pub fn log(&self) -> &CommunicationLog {
        &self.log
    }

    /// Newline-separated rendering of the communication log
    pub fn dump_log(&self) -> String {
        self.log.dump()
    }

    /// Print the communication log to stderr between header and footer lines
    pub fn print_dump_log(&self) {
        eprintln!("------- MTD415 COMMUNICATION LOG DUMP ---------");
        eprintln!("{}", self.dump_log());
        eprintln!("--------- COMMUNICATION LOG DUMP END ----------");
    }

    /// Borrow the underlying link
    pub fn link(&self) -> &L {
        &self.link
    }
}

impl<L: ByteLink> Drop for Session<L> {
    fn drop(&mut self) {
        if self.link.is_open() {
            if let Err(e) = self.link.close() {
                tracing::warn!("failed to close link: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MockLink;

    fn session(timeout_ms: u64) -> (Session<MockLink>, crate::protocol::MockHandle) {
        let (link, handle) = MockLink::with_handle();
        (
            Session::new(link, Some(Duration::from_millis(timeout_ms)), 100),
            handle,
        )
    }

    #[test]
    fn test_write_opens_link_and_appends_newline() {
        let (mut session, handle) = session(50);
        assert!(!session.is_open());

        session.write(b"test").unwrap();

        assert!(session.is_open());
        assert_eq!(handle.written(), vec!["test\n".to_string()]);
        assert_eq!(session.log().len(), 1);
    }

    #[test]
    fn test_custom_line_ending() {
        let (mut session, handle) = session(50);
        session.write_with_ending(b"m?", b"\r\n").unwrap();
        assert_eq!(handle.last_written().as_deref(), Some("m?\r\n"));
    }

    #[test]
    fn test_read_returns_line() {
        let (mut session, handle) = session(50);
        handle.inject_line("0");
        assert_eq!(session.read().unwrap().as_deref(), Some("0\n"));
    }

    #[test]
    fn test_read_times_out_and_logs_absent_value() {
        let (mut session, _handle) = session(20);
        let start = Instant::now();

        assert_eq!(session.read().unwrap(), None);
        assert!(start.elapsed() >= Duration::from_millis(20));

        let entry = session.log().entries().last().unwrap();
        assert_eq!(entry.kind, LogKind::Read);
        assert_eq!(entry.content, None);
    }

    #[test]
    fn test_query_writes_then_reads() {
        let (mut session, handle) = session(50);
        handle.queue_reply("0");

        let result = session.query(b"test?").unwrap();

        assert_eq!(result.as_deref(), Some("0\n"));
        assert_eq!(handle.last_written().as_deref(), Some("test?\n"));
        let kinds: Vec<_> = session.log().entries().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![LogKind::Write, LogKind::Read]);
    }

    #[test]
    fn test_open_failure_propagates() {
        let (mut session, handle) = session(50);
        handle.set_fail_on_open(true);
        assert!(session.write(b"T?").is_err());
        assert!(session.read().is_err());
    }

    #[test]
    fn test_drop_closes_link() {
        let (mut session, handle) = session(50);
        session.open().unwrap();
        drop(session);
        assert!(!handle.is_open());
    }

    #[test]
    fn test_close() {
        let (mut session, handle) = session(50);
        session.open().unwrap();
        session.close().unwrap();
        assert!(!session.is_open());
        assert!(!handle.is_open());
    }
}
