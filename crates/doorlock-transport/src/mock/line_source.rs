//! Mock line source.

use crate::error::{Result, TransportError};
use crate::traits::LineSource;
use doorlock_core::constants::LINE_CHANNEL_CAPACITY;
use tokio::sync::mpsc;

enum LineEvent {
    Line(String),
    Fail,
}

/// Line source driven by a [`MockLineHandle`].
///
/// Dropping every handle ends the source cleanly.
///
/// # Examples
///
/// ```
/// use doorlock_transport::LineSource;
/// use doorlock_transport::mock::MockLineSource;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() -> doorlock_transport::Result<()> {
///     let (mut source, handle) = MockLineSource::new();
///
///     handle.present(555).await?;
///     drop(handle);
///
///     assert_eq!(source.next_line().await?.as_deref(), Some("Card ID: 555\r\n"));
///     assert_eq!(source.next_line().await?, None);
///     Ok(())
/// }
/// ```
pub struct MockLineSource {
    name: String,
    event_rx: mpsc::Receiver<LineEvent>,
}

impl MockLineSource {
    pub fn new() -> (Self, MockLineHandle) {
        Self::with_name("mock-reader")
    }

    pub fn with_name(name: impl Into<String>) -> (Self, MockLineHandle) {
        let (event_tx, event_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let name = name.into();

        let source = Self {
            name: name.clone(),
            event_rx,
        };
        let handle = MockLineHandle { name, event_tx };

        (source, handle)
    }
}

impl LineSource for MockLineSource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.event_rx.recv().await {
            Some(LineEvent::Line(line)) => Ok(Some(line)),
            Some(LineEvent::Fail) => Err(TransportError::disconnected(&self.name)),
            None => Ok(None),
        }
    }
}

/// Handle feeding a [`MockLineSource`].
#[derive(Clone)]
pub struct MockLineHandle {
    name: String,
    event_tx: mpsc::Sender<LineEvent>,
}

impl MockLineHandle {
    /// Queue a raw line, exactly as given.
    pub async fn send_line(&self, line: impl Into<String>) -> Result<()> {
        self.event_tx
            .send(LineEvent::Line(line.into()))
            .await
            .map_err(|_| TransportError::disconnected(&self.name))
    }

    /// Queue a presentation in the prefixed reader format.
    pub async fn present(&self, id: u32) -> Result<()> {
        self.send_line(format!("Card ID: {id}\r\n")).await
    }

    /// Make the source report a lost link.
    pub async fn fail(&self) -> Result<()> {
        self.event_tx
            .send(LineEvent::Fail)
            .await
            .map_err(|_| TransportError::disconnected(&self.name))
    }
}
