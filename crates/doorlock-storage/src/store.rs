#![allow(async_fn_in_trait)]

//! The credential store contract used by the resolution engine.
//!
//! The engine sees one store holding both the credential table and the
//! usage ledger. [`SqliteCredentialStore`] composes the two SQLite
//! repositories over a shared pool.

use crate::error::StorageResult;
use crate::models::{CredentialRecord, UsageEntry};
use crate::repositories::{
    CredentialRepository, SqliteCredentialRepository, SqliteUsageLogRepository,
    UsageLogRepository,
};
use chrono::{DateTime, Utc};
use doorlock_core::{CardId, Rank};
use sqlx::SqlitePool;

/// Persistent credential table plus usage ledger.
///
/// Each call is atomic on its own; nothing spans calls.
pub trait CredentialStore: Send + Sync {
    /// Stored record for `id`, if enrolled.
    async fn lookup(&self, id: CardId) -> StorageResult<Option<CredentialRecord>>;

    /// Set `last_used` on an enrolled credential.
    ///
    /// Fails with `StorageError::NotFound` when `id` is not enrolled.
    async fn touch_last_used(&self, id: CardId, at: DateTime<Utc>) -> StorageResult<()>;

    /// Insert a new credential.
    ///
    /// Fails with `StorageError::DuplicateId` when `id` is already enrolled.
    async fn enroll(&self, id: CardId, rank: Rank, name: Option<&str>) -> StorageResult<()>;

    /// Delete a credential; `false` when it was not enrolled.
    async fn remove(&self, id: CardId) -> StorageResult<bool>;

    /// Delete every credential, returning how many were removed.
    async fn wipe_all(&self) -> StorageResult<u64>;

    /// Append a presentation to the usage ledger.
    async fn append_usage(&self, at: DateTime<Utc>, id: CardId, rank: Rank) -> StorageResult<()>;

    /// Newest ledger timestamp, used to seed the presentation clock.
    async fn latest_usage_time(&self) -> StorageResult<Option<DateTime<Utc>>>;
}

/// SQLite-backed [`CredentialStore`].
///
/// # Examples
///
/// ```no_run
/// use doorlock_storage::{CredentialStore, Database, SqliteCredentialStore};
/// use doorlock_core::{CardId, Rank};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let db = Database::in_memory().await?;
/// let store = SqliteCredentialStore::new(db.pool().clone());
///
/// store.enroll(CardId::new(555), Rank::User, None).await?;
/// assert!(store.lookup(CardId::new(555)).await?.is_some());
/// # Ok(())
/// # }
/// ```
pub struct SqliteCredentialStore {
    credentials: SqliteCredentialRepository,
    usage: SqliteUsageLogRepository,
}

impl SqliteCredentialStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            credentials: SqliteCredentialRepository::new(pool.clone()),
            usage: SqliteUsageLogRepository::new(pool),
        }
    }

    /// Every enrolled credential.
    pub async fn list(&self) -> StorageResult<Vec<CredentialRecord>> {
        self.credentials.find_all().await
    }

    /// Replace or clear the display name of an enrolled credential.
    pub async fn rename(&self, id: CardId, name: Option<&str>) -> StorageResult<()> {
        self.credentials.set_name(id, name).await
    }

    /// Newest ledger entries, optionally for one card.
    pub async fn recent_usage(
        &self,
        card: Option<CardId>,
        limit: i64,
    ) -> StorageResult<Vec<UsageEntry>> {
        match card {
            Some(id) => self.usage.find_by_card(id, limit).await,
            None => self.usage.find_recent(limit).await,
        }
    }
}

impl CredentialStore for SqliteCredentialStore {
    async fn lookup(&self, id: CardId) -> StorageResult<Option<CredentialRecord>> {
        self.credentials.find_by_id(id).await
    }

    async fn touch_last_used(&self, id: CardId, at: DateTime<Utc>) -> StorageResult<()> {
        self.credentials.touch(id, at).await
    }

    async fn enroll(&self, id: CardId, rank: Rank, name: Option<&str>) -> StorageResult<()> {
        self.credentials.create(id, rank, name).await
    }

    async fn remove(&self, id: CardId) -> StorageResult<bool> {
        self.credentials.delete(id).await
    }

    async fn wipe_all(&self) -> StorageResult<u64> {
        self.credentials.delete_all().await
    }

    async fn append_usage(&self, at: DateTime<Utc>, id: CardId, rank: Rank) -> StorageResult<()> {
        self.usage.append(at, id, rank).await.map(|_| ())
    }

    async fn latest_usage_time(&self) -> StorageResult<Option<DateTime<Utc>>> {
        self.usage.latest_time().await
    }
}
