//! Storage layer for the doorlock controller.
//!
//! SQLite-backed persistence for the credential table and the append-only
//! usage ledger, plus bootstrap provisioning.
//!
//! # Architecture
//!
//! - [`Database`] - Connection pool manager with automatic migrations
//! - [`CredentialRepository`], [`UsageLogRepository`] - Data access traits
//! - [`CredentialStore`] - The contract the resolution engine runs against
//! - [`provisioning`] - Creates missing bootstrap credentials
//!
//! # Schema
//!
//! - `credentials(card_id, rank, name, last_used)`: at most one row per id.
//!   Rank 0 is never stored; an absent row *is* rank unknown.
//! - `usage_log(seq, time, card_id, rank)`: one row per presentation with a
//!   unique timestamp. Triggers reject updates and deletes.
//!
//! # Examples
//!
//! ```no_run
//! use doorlock_storage::{provisioning, CredentialStore, Database, DatabaseConfig,
//!     SqliteCredentialStore};
//! use doorlock_core::{BootstrapTable, CardId};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new(DatabaseConfig::new("/srv/doorlock.db")).await?;
//! let store = SqliteCredentialStore::new(db.pool().clone());
//!
//! provisioning::provision(&store, &BootstrapTable::default()).await?;
//!
//! if let Some(record) = store.lookup(CardId::new(721416196)).await? {
//!     println!("{} is {}", record.display_name(), record.rank);
//! }
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod models;
pub mod provisioning;
pub mod repositories;
pub mod store;

pub use connection::{Database, DatabaseConfig};
pub use error::{StorageError, StorageResult};
pub use models::{CredentialRecord, UsageEntry};
pub use provisioning::{ProvisionReport, provision};
pub use repositories::{
    CredentialRepository, SqliteCredentialRepository, SqliteUsageLogRepository,
    UsageLogRepository,
};
pub use store::{CredentialStore, SqliteCredentialStore};
