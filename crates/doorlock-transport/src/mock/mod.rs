//! In-memory links for tests and development.
//!
//! Both mocks come with a handle that drives or inspects them from the
//! test side.

pub mod line_source;
pub mod sink;

pub use line_source::{MockLineHandle, MockLineSource};
pub use sink::{MockSink, MockSinkHandle, SentFrame};
