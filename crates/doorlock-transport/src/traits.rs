//! Link trait definitions.
//!
//! The controller reads presentation lines from one [`LineSource`] and
//! writes response frames to one or more [`ByteSink`]s. Serial ports, stdio
//! and in-memory mocks all implement the same pair.
//!
//! Both traits use native `async fn` methods (Edition 2024), so no
//! `async_trait` macro is needed.

#![allow(async_fn_in_trait)]

use crate::error::Result;

/// Source of newline-terminated text lines.
pub trait LineSource: Send {
    /// Wait for the next line.
    ///
    /// The returned line may still carry its `\r` terminator.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(line))` for a line
    /// - `Ok(None)` when the source has ended cleanly
    ///
    /// # Errors
    ///
    /// Any error means the link is gone.
    async fn next_line(&mut self) -> Result<Option<String>>;
}

/// Destination for raw outbound bytes.
pub trait ByteSink: Send {
    /// Human-readable link name for logs.
    fn name(&self) -> &str;

    /// Write `bytes` as one frame and flush.
    async fn send(&mut self, bytes: &[u8]) -> Result<()>;
}
