//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use doorlock_core::{BootstrapCard, BootstrapTable, CardId, Rank};
use doorlock_storage::{
    CredentialRecord, CredentialStore, Database, SqliteCredentialStore, StorageError,
    StorageResult, UsageEntry,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub const PROGRAMMING: CardId = CardId::new(100);
pub const DELETE: CardId = CardId::new(200);
pub const WIPE: CardId = CardId::new(300);
pub const MASTER: CardId = CardId::new(400);
pub const OWNER: CardId = CardId::new(500);

/// Bootstrap table with one card per administrative rank and small ids.
pub fn test_bootstrap() -> BootstrapTable {
    BootstrapTable::new(vec![
        BootstrapCard::new(OWNER, Rank::Administrator, "Owner"),
        BootstrapCard::new(WIPE, Rank::Wipe, "Wiper"),
        BootstrapCard::new(PROGRAMMING, Rank::Programming, "Programmer"),
        BootstrapCard::new(DELETE, Rank::Delete, "Deleter"),
        BootstrapCard::new(MASTER, Rank::Master, "Master"),
    ])
    .unwrap()
}

pub async fn sqlite_store() -> SqliteCredentialStore {
    let db = Database::in_memory().await.unwrap();
    SqliteCredentialStore::new(db.pool().clone())
}

/// Which store operations fail, and whether lookups lie.
#[derive(Debug, Default)]
struct FaultPlan {
    failing: HashSet<&'static str>,
    blind_lookup: bool,
}

/// A SQLite store with switchable faults.
#[derive(Clone)]
pub struct FaultyStore {
    inner: Arc<SqliteCredentialStore>,
    plan: Arc<Mutex<FaultPlan>>,
}

impl FaultyStore {
    pub async fn new() -> Self {
        Self {
            inner: Arc::new(sqlite_store().await),
            plan: Arc::new(Mutex::new(FaultPlan::default())),
        }
    }

    /// Make `operation` fail until [`heal`](Self::heal) is called.
    pub fn fail(&self, operation: &'static str) {
        self.plan.lock().unwrap().failing.insert(operation);
    }

    /// Make every lookup report "not found" without touching the table.
    pub fn blind_lookups(&self) {
        self.plan.lock().unwrap().blind_lookup = true;
    }

    pub fn heal(&self) {
        *self.plan.lock().unwrap() = FaultPlan::default();
    }

    pub fn inner(&self) -> &SqliteCredentialStore {
        &self.inner
    }

    pub async fn ledger(&self) -> Vec<UsageEntry> {
        self.inner.recent_usage(None, 1_000).await.unwrap()
    }

    fn check(&self, operation: &'static str) -> StorageResult<()> {
        if self.plan.lock().unwrap().failing.contains(operation) {
            return Err(StorageError::Configuration(format!("injected {operation} failure")));
        }
        Ok(())
    }
}

impl CredentialStore for FaultyStore {
    async fn lookup(&self, id: CardId) -> StorageResult<Option<CredentialRecord>> {
        self.check("lookup")?;
        if self.plan.lock().unwrap().blind_lookup {
            return Ok(None);
        }
        self.inner.lookup(id).await
    }

    async fn touch_last_used(&self, id: CardId, at: DateTime<Utc>) -> StorageResult<()> {
        self.check("touch_last_used")?;
        self.inner.touch_last_used(id, at).await
    }

    async fn enroll(&self, id: CardId, rank: Rank, name: Option<&str>) -> StorageResult<()> {
        self.check("enroll")?;
        self.inner.enroll(id, rank, name).await
    }

    async fn remove(&self, id: CardId) -> StorageResult<bool> {
        self.check("remove")?;
        self.inner.remove(id).await
    }

    async fn wipe_all(&self) -> StorageResult<u64> {
        self.check("wipe_all")?;
        self.inner.wipe_all().await
    }

    async fn append_usage(&self, at: DateTime<Utc>, id: CardId, rank: Rank) -> StorageResult<()> {
        self.check("append_usage")?;
        self.inner.append_usage(at, id, rank).await
    }

    async fn latest_usage_time(&self) -> StorageResult<Option<DateTime<Utc>>> {
        self.check("latest_usage_time")?;
        self.inner.latest_usage_time().await
    }
}
