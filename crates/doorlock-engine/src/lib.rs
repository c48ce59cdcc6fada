//! Doorlock engine: the credential resolution and mode-state machine, plus
//! the main loop that connects it to the serial links.
//!
//! # Example
//!
//! ```no_run
//! use doorlock_engine::{EngineConfig, MainLoop, OutboundSink, ResolutionEngine, RunnerConfig};
//! use doorlock_protocol::InboundFormat;
//! use doorlock_storage::{Database, SqliteCredentialStore};
//! use doorlock_transport::{StreamLineSource, StreamSink};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::in_memory().await?;
//! let store = SqliteCredentialStore::new(db.pool().clone());
//! let engine = ResolutionEngine::start(store, EngineConfig::default()).await?;
//!
//! let mut main_loop = MainLoop::new(
//!     engine,
//!     StreamLineSource::stdin(),
//!     vec![OutboundSink::new(StreamSink::stdout(), true)],
//!     InboundFormat::default(),
//!     RunnerConfig::default(),
//! );
//! main_loop.run().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod mode;
pub mod runner;

pub use config::{ClearSignal, EngineConfig, ModeExitPolicy, RunnerConfig};
pub use engine::{Action, Presentation, ResolutionEngine};
pub use error::{EngineError, Result};
pub use mode::{AdminMode, ModeController, ModeTransition};
pub use runner::{MainLoop, OutboundSink, RunStats};
