#![allow(async_fn_in_trait)]

use crate::error::{StorageError, StorageResult};
use crate::models::CredentialRecord;
use chrono::{DateTime, Utc};
use doorlock_core::{CardId, Rank};
use sqlx::SqlitePool;

/// Repository trait for the credential table.
///
/// Uses native async trait methods (Edition 2024), no async-trait crate.
pub trait CredentialRepository: Send + Sync {
    /// Find a credential by card id
    async fn find_by_id(&self, id: CardId) -> StorageResult<Option<CredentialRecord>>;

    /// All credentials, ordered by rank then id
    async fn find_all(&self) -> StorageResult<Vec<CredentialRecord>>;

    /// Insert a new credential
    ///
    /// Fails with `StorageError::DuplicateId` when the id is already enrolled
    /// and with `StorageError::Validation` for `Rank::Unknown`.
    async fn create(&self, id: CardId, rank: Rank, name: Option<&str>) -> StorageResult<()>;

    /// Replace (or clear) the display name of an enrolled credential
    async fn set_name(&self, id: CardId, name: Option<&str>) -> StorageResult<()>;

    /// Record the time of the latest presentation
    async fn touch(&self, id: CardId, at: DateTime<Utc>) -> StorageResult<()>;

    /// Delete one credential, returning whether a row existed
    async fn delete(&self, id: CardId) -> StorageResult<bool>;

    /// Delete every credential, returning the number removed
    async fn delete_all(&self) -> StorageResult<u64>;

    /// Number of enrolled credentials
    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of CredentialRepository
pub struct SqliteCredentialRepository {
    pool: SqlitePool,
}

impl SqliteCredentialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl CredentialRepository for SqliteCredentialRepository {
    async fn find_by_id(&self, id: CardId) -> StorageResult<Option<CredentialRecord>> {
        let record = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT card_id, rank, name, last_used
            FROM credentials
            WHERE card_id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_all(&self) -> StorageResult<Vec<CredentialRecord>> {
        let records = sqlx::query_as::<_, CredentialRecord>(
            r#"
            SELECT card_id, rank, name, last_used
            FROM credentials
            ORDER BY rank DESC, card_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn create(&self, id: CardId, rank: Rank, name: Option<&str>) -> StorageResult<()> {
        if !rank.is_known() {
            return Err(StorageError::Validation(format!(
                "card {id} cannot be enrolled with rank {rank}"
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO credentials (card_id, rank, name, last_used)
            VALUES (?, ?, ?, NULL)
            "#,
        )
        .bind(id.as_i64())
        .bind(i64::from(rank))
        .bind(name)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StorageError::DuplicateId(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_name(&self, id: CardId, name: Option<&str>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE credentials SET name = ? WHERE card_id = ?")
            .bind(name)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::card_not_found(id));
        }

        Ok(())
    }

    async fn touch(&self, id: CardId, at: DateTime<Utc>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE credentials SET last_used = ? WHERE card_id = ?")
            .bind(at)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::card_not_found(id));
        }

        Ok(())
    }

    async fn delete(&self, id: CardId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM credentials WHERE card_id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM credentials")
            .execute(&self.pool)
            .await?;

        // Wiped rows must not linger in free pages of the file.
        sqlx::query("VACUUM").execute(&self.pool).await?;

        Ok(result.rows_affected())
    }

    async fn count(&self) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM credentials")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
