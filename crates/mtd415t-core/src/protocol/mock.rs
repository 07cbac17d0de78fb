//! In-memory byte link
//!
//! Scripted stand-in for the controller: every written frame consumes the
//! next queued reply, which then becomes readable. Useful for tests and for
//! exercising code without hardware attached.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ByteLink, ProtocolError};

#[derive(Debug, Default)]
struct MockState {
    is_open: bool,
    fail_on_open: bool,
    open_count: usize,
    /// Frames written by the host, in order
    written: Vec<String>,
    /// Replies consumed one per written frame; `None` means the device stays silent
    replies: VecDeque<Option<String>>,
    /// Lines ready to be read
    readable: VecDeque<String>,
}

/// Scripted [`ByteLink`] implementation
#[derive(Debug, Default)]
pub struct MockLink {
    state: Arc<Mutex<MockState>>,
}

/// Shared view into a [`MockLink`] that stays usable after the link was moved
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    // A panicking test thread must not hide the recorded traffic
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn terminated(line: &str) -> String {
    if line.ends_with('\n') {
        line.to_string()
    } else {
        format!("{line}\n")
    }
}

impl MockLink {
    /// Create a closed link with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a link and the handle used to script and inspect it
    pub fn with_handle() -> (Self, MockHandle) {
        let link = Self::new();
        let handle = link.handle();
        (link, handle)
    }

    /// Handle sharing this link's state
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl MockHandle {
    /// Queue the line the device answers to the next unanswered frame
    pub fn queue_reply(&self, line: &str) {
        lock(&self.state).replies.push_back(Some(terminated(line)));
    }

    /// Queue several replies at once
    pub fn queue_replies<'a>(&self, lines: impl IntoIterator<Item = &'a str>) {
        for line in lines {
            self.queue_reply(line);
        }
    }

    /// The device will not answer the next unanswered frame
    pub fn queue_silence(&self) {
        lock(&self.state).replies.push_back(None);
    }

    /// Make a line readable without any frame being written
    pub fn inject_line(&self, line: &str) {
        lock(&self.state).readable.push_back(terminated(line));
    }

    /// Frames written so far, terminators included
    pub fn written(&self) -> Vec<String> {
        lock(&self.state).written.clone()
    }

    /// Most recently written frame
    pub fn last_written(&self) -> Option<String> {
        lock(&self.state).written.last().cloned()
    }

    /// Number of replies not yet consumed
    pub fn pending_replies(&self) -> usize {
        lock(&self.state).replies.len()
    }

    /// Number of lines readable but not yet read
    pub fn unread_lines(&self) -> usize {
        lock(&self.state).readable.len()
    }

    /// Whether the link is open
    pub fn is_open(&self) -> bool {
        lock(&self.state).is_open
    }

    /// How many times the link went from closed to open
    pub fn open_count(&self) -> usize {
        lock(&self.state).open_count
    }

    /// Make subsequent `open` calls fail
    pub fn set_fail_on_open(&self, fail: bool) {
        lock(&self.state).fail_on_open = fail;
    }
}

impl ByteLink for MockLink {
    fn open(&mut self) -> Result<(), ProtocolError> {
        let mut state = lock(&self.state);
        if state.fail_on_open {
            return Err(ProtocolError::SerialError(
                "mock port unavailable".to_string(),
            ));
        }
        if !state.is_open {
            state.is_open = true;
            state.open_count += 1;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ProtocolError> {
        lock(&self.state).is_open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        lock(&self.state).is_open
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        let mut state = lock(&self.state);
        if !state.is_open {
            return Err(ProtocolError::SerialError(
                "serial device is closed".to_string(),
            ));
        }
        state
            .written
            .push(String::from_utf8_lossy(data).into_owned());
        if let Some(Some(reply)) = state.replies.pop_front() {
            state.readable.push_back(reply);
        }
        Ok(())
    }

    fn read_line(&mut self) -> Result<Option<String>, ProtocolError> {
        let mut state = lock(&self.state);
        if !state.is_open {
            return Err(ProtocolError::SerialError(
                "serial device is closed".to_string(),
            ));
        }
        Ok(state.readable.pop_front())
    }
}
