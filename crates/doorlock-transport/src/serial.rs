//! Serial port links.
//!
//! `serialport` is blocking, so inbound lines are read on a dedicated OS
//! thread and handed to the async side through a bounded channel. Writes are
//! a handful of bytes and go straight to a cloned port handle.

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, LineSource};
use doorlock_core::constants::{DEFAULT_MAX_LINE_LENGTH, LINE_CHANNEL_CAPACITY};
use serialport::SerialPort;
use std::io::{self, BufRead, BufReader, Write};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Settings for opening one serial device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device path, e.g. `/dev/ttyACM0`.
    pub path: String,

    pub baud_rate: u32,

    /// Read timeout of the reader thread. Bounds how long the thread takes
    /// to notice that the controller has shut down.
    pub read_timeout: Duration,

    /// Lines longer than this are discarded.
    pub max_line_length: usize,
}

impl SerialSettings {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            read_timeout: Duration::from_millis(500),
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
        }
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = max;
        self
    }

    fn open(&self) -> Result<Box<dyn SerialPort>> {
        if self.baud_rate == 0 {
            return Err(TransportError::configuration(format!(
                "{}: baud rate must be non-zero",
                self.path
            )));
        }

        serialport::new(&self.path, self.baud_rate)
            .timeout(self.read_timeout)
            .open()
            .map_err(|e| TransportError::serial(&self.path, e))
    }
}

/// An opened serial device.
///
/// One device may serve as both the line source and a sink: the single-port
/// deployment reads card lines and writes the rank on the same wire.
pub struct SerialLink {
    settings: SerialSettings,
    port: Box<dyn SerialPort>,
}

impl SerialLink {
    /// Open the device.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Serial` when the device cannot be opened.
    pub fn open(settings: SerialSettings) -> Result<Self> {
        let port = settings.open()?;
        debug!(path = %settings.path, baud = settings.baud_rate, "opened serial port");
        Ok(Self { settings, port })
    }

    pub fn path(&self) -> &str {
        &self.settings.path
    }

    /// A sink writing to this device.
    pub fn sink(&self) -> Result<SerialSink> {
        let port = self
            .port
            .try_clone()
            .map_err(|e| TransportError::serial(&self.settings.path, e))?;
        Ok(SerialSink {
            name: self.settings.path.clone(),
            port,
        })
    }

    /// Turn the device into a line source, spawning its reader thread.
    pub fn into_line_source(self) -> Result<SerialLineSource> {
        let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let name = self.settings.path.clone();
        let max_line_length = self.settings.max_line_length;
        let port = self.port;

        thread::Builder::new()
            .name(format!("serial-reader:{name}"))
            .spawn({
                let name = name.clone();
                move || read_lines(name, port, max_line_length, tx)
            })?;

        Ok(SerialLineSource { name, rx })
    }
}

/// Line source fed by a serial reader thread.
pub struct SerialLineSource {
    name: String,
    rx: mpsc::Receiver<Result<String>>,
}

impl LineSource for SerialLineSource {
    async fn next_line(&mut self) -> Result<Option<String>> {
        match self.rx.recv().await {
            Some(line) => line.map(Some),
            None => Err(TransportError::disconnected(&self.name)),
        }
    }
}

fn read_lines(
    name: String,
    port: Box<dyn SerialPort>,
    max_line_length: usize,
    tx: mpsc::Sender<Result<String>>,
) {
    let mut reader = BufReader::new(port);
    let mut buf = Vec::with_capacity(64);

    loop {
        if tx.is_closed() {
            debug!(device = %name, "line consumer gone, stopping serial reader");
            return;
        }

        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => {
                let _ = tx.blocking_send(Err(TransportError::disconnected(&name)));
                return;
            }
            Ok(_) if buf.ends_with(b"\n") => {
                if buf.len() > max_line_length {
                    warn!(device = %name, len = buf.len(), "discarding oversized line");
                } else {
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.blocking_send(Ok(line)).is_err() {
                        return;
                    }
                }
                buf.clear();
            }
            // Partial line at end of input; keep it until more arrives.
            Ok(_) => {}
            Err(e) if is_transient(&e) => {}
            Err(e) => {
                error!(device = %name, error = %e, "serial read failed");
                let _ = tx.blocking_send(Err(e.into()));
                return;
            }
        }

        if buf.len() > max_line_length && !buf.ends_with(b"\n") {
            warn!(device = %name, len = buf.len(), "discarding unterminated oversized input");
            buf.clear();
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
    )
}

/// Sink writing frames to a serial device.
pub struct SerialSink {
    name: String,
    port: Box<dyn SerialPort>,
}

impl SerialSink {
    /// Open a write-only device, such as the display board.
    pub fn open(settings: SerialSettings) -> Result<Self> {
        let port = settings.open()?;
        debug!(path = %settings.path, baud = settings.baud_rate, "opened serial sink");
        Ok(Self {
            name: settings.path,
            port,
        })
    }
}

impl ByteSink for SerialSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}
