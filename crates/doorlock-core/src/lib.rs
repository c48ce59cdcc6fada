//! Core domain types shared by every doorlock crate.
//!
//! - [`CardId`] and [`Rank`]: the credential identifier and its authorization level
//! - [`BootstrapTable`]: the administrative cards that keep a controller administrable
//! - [`MonotonicClock`]: strictly increasing timestamps for the usage ledger
//! - [`constants`]: framing and timing defaults for the serial deployments

pub mod bootstrap;
pub mod clock;
pub mod constants;
pub mod error;
pub mod types;

pub use bootstrap::{BootstrapCard, BootstrapTable};
pub use clock::MonotonicClock;
pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
