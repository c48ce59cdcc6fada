//! Links over arbitrary async streams.
//!
//! Used to drive the controller from stdin/stdout, a pipe or a socket
//! instead of a serial device.

use crate::error::{Result, TransportError};
use crate::traits::{ByteSink, LineSource};
use doorlock_core::constants::DEFAULT_MAX_LINE_LENGTH;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::warn;

/// Line source over any `AsyncRead`.
///
/// # Examples
///
/// ```
/// use doorlock_transport::{LineSource, StreamLineSource};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> doorlock_transport::Result<()> {
/// let input: &[u8] = b"Card ID: 555\r\n";
/// let mut source = StreamLineSource::new("test", input);
/// assert_eq!(source.next_line().await?.as_deref(), Some("Card ID: 555"));
/// assert_eq!(source.next_line().await?, None);
/// # Ok(())
/// # }
/// ```
pub struct StreamLineSource<R> {
    name: String,
    frames: FramedRead<R, LinesCodec>,
}

impl<R: AsyncRead + Unpin> StreamLineSource<R> {
    pub fn new(name: impl Into<String>, reader: R) -> Self {
        Self::with_max_length(name, reader, DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_max_length(name: impl Into<String>, reader: R, max_length: usize) -> Self {
        Self {
            name: name.into(),
            frames: FramedRead::new(reader, LinesCodec::new_with_max_length(max_length)),
        }
    }
}

impl StreamLineSource<tokio::io::Stdin> {
    /// Read presentation lines from standard input.
    pub fn stdin() -> Self {
        Self::new("stdin", tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin + Send> LineSource for StreamLineSource<R> {
    async fn next_line(&mut self) -> Result<Option<String>> {
        // After a decode error FramedRead yields one `None` before resuming.
        let mut after_error = false;
        loop {
            match self.frames.next().await {
                None if after_error => after_error = false,
                None => return Ok(None),
                Some(Ok(line)) => return Ok(Some(line)),
                Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                    warn!(device = %self.name, "discarding oversized line");
                    after_error = true;
                }
                Some(Err(LinesCodecError::Io(e))) => return Err(TransportError::Io(e)),
            }
        }
    }
}

/// Sink over any `AsyncWrite`.
pub struct StreamSink<W> {
    name: String,
    writer: W,
}

impl<W> StreamSink<W> {
    pub fn new(name: impl Into<String>, writer: W) -> Self {
        Self {
            name: name.into(),
            writer,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl StreamSink<tokio::io::Stdout> {
    /// Write frames to standard output.
    pub fn stdout() -> Self {
        Self::new("stdout", tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ByteSink for StreamSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.writer.write_all(bytes).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
