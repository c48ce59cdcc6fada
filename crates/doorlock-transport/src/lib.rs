//! Link abstraction layer for the doorlock controller.
//!
//! The controller talks to its peripherals over line-oriented serial links.
//! This crate provides:
//!
//! - [`LineSource`] / [`ByteSink`]: the traits the main loop is written against
//! - [`serial`]: `serialport`-backed links for the reader and display boards
//! - [`stdio`]: links over any async stream, including stdin/stdout
//! - [`mock`]: in-memory links driven from tests
//!
//! All traits use native `async fn` (Edition 2024) and are used through
//! generics, not trait objects.
//!
//! # Example
//!
//! ```no_run
//! use doorlock_transport::serial::{SerialLink, SerialSettings};
//! use doorlock_transport::{ByteSink, LineSource};
//!
//! # async fn example() -> doorlock_transport::Result<()> {
//! let link = SerialLink::open(SerialSettings::new("/dev/ttyACM0", 115_200))?;
//! let mut door = link.sink()?;
//! let mut reader = link.into_line_source()?;
//!
//! while let Some(line) = reader.next_line().await? {
//!     println!("{}", line.trim_end());
//!     door.send(&[0]).await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod mock;
pub mod serial;
pub mod stdio;
pub mod traits;

pub use error::{Result, TransportError};
pub use serial::{SerialLineSource, SerialLink, SerialSettings, SerialSink};
pub use stdio::{StreamLineSource, StreamSink};
pub use traits::{ByteSink, LineSource};
