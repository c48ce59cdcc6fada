//! Mock byte sink.

use crate::error::{Result, TransportError};
use crate::traits::ByteSink;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;

/// One recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub bytes: Vec<u8>,
    /// Tokio clock reading at the time of the write.
    pub at: Instant,
}

#[derive(Debug, Default)]
struct SinkState {
    frames: Vec<SentFrame>,
    disconnected: bool,
}

/// Sink recording every write for inspection through a [`MockSinkHandle`].
#[derive(Debug)]
pub struct MockSink {
    name: String,
    state: Arc<Mutex<SinkState>>,
}

impl MockSink {
    pub fn new(name: impl Into<String>) -> (Self, MockSinkHandle) {
        let state = Arc::new(Mutex::new(SinkState::default()));
        let sink = Self {
            name: name.into(),
            state: state.clone(),
        };
        (sink, MockSinkHandle { state })
    }
}

fn lock(state: &Mutex<SinkState>) -> MutexGuard<'_, SinkState> {
    // A panicking test thread must not hide the frames from other asserts.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ByteSink for MockSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.disconnected {
            return Err(TransportError::disconnected(&self.name));
        }
        state.frames.push(SentFrame {
            bytes: bytes.to_vec(),
            at: Instant::now(),
        });
        Ok(())
    }
}

/// Inspection and fault-injection handle for a [`MockSink`].
#[derive(Debug, Clone)]
pub struct MockSinkHandle {
    state: Arc<Mutex<SinkState>>,
}

impl MockSinkHandle {
    /// Every write so far, with timestamps.
    pub fn frames(&self) -> Vec<SentFrame> {
        lock(&self.state).frames.clone()
    }

    /// Every write so far, bytes only.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        lock(&self.state)
            .frames
            .iter()
            .map(|frame| frame.bytes.clone())
            .collect()
    }

    pub fn clear(&self) {
        lock(&self.state).frames.clear();
    }

    /// Make every following write fail.
    pub fn disconnect(&self) {
        lock(&self.state).disconnected = true;
    }
}
