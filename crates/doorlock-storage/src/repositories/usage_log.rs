#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::UsageEntry;
use chrono::{DateTime, Utc};
use doorlock_core::{CardId, Rank};
use sqlx::SqlitePool;

/// Repository trait for the append-only usage ledger.
///
/// Entries cannot be updated or deleted; the schema rejects both.
pub trait UsageLogRepository: Send + Sync {
    /// Append one entry, returning its sequence number
    ///
    /// `time` must be unique across the ledger.
    async fn append(
        &self,
        time: DateTime<Utc>,
        card_id: CardId,
        rank: Rank,
    ) -> StorageResult<i64>;

    /// Most recent entries, newest first
    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<UsageEntry>>;

    /// Most recent entries for one card, newest first
    async fn find_by_card(&self, card_id: CardId, limit: i64) -> StorageResult<Vec<UsageEntry>>;

    /// Newest timestamp in the ledger
    async fn latest_time(&self) -> StorageResult<Option<DateTime<Utc>>>;

    /// Total number of entries
    async fn count(&self) -> StorageResult<i64>;
}

/// SQLite implementation of UsageLogRepository
pub struct SqliteUsageLogRepository {
    pool: SqlitePool,
}

impl SqliteUsageLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl UsageLogRepository for SqliteUsageLogRepository {
    async fn append(
        &self,
        time: DateTime<Utc>,
        card_id: CardId,
        rank: Rank,
    ) -> StorageResult<i64> {
        let result = sqlx::query("INSERT INTO usage_log (time, card_id, rank) VALUES (?, ?, ?)")
            .bind(time)
            .bind(card_id.as_i64())
            .bind(i64::from(rank))
            .execute(&self.pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    async fn find_recent(&self, limit: i64) -> StorageResult<Vec<UsageEntry>> {
        let entries = sqlx::query_as::<_, UsageEntry>(
            r#"
            SELECT seq, time, card_id, rank
            FROM usage_log
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn find_by_card(&self, card_id: CardId, limit: i64) -> StorageResult<Vec<UsageEntry>> {
        let entries = sqlx::query_as::<_, UsageEntry>(
            r#"
            SELECT seq, time, card_id, rank
            FROM usage_log
            WHERE card_id = ?
            ORDER BY seq DESC
            LIMIT ?
            "#,
        )
        .bind(card_id.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    async fn latest_time(&self) -> StorageResult<Option<DateTime<Utc>>> {
        // RFC 3339 text in UTC sorts chronologically.
        let time = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT time FROM usage_log ORDER BY time DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(time)
    }

    async fn count(&self) -> StorageResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usage_log")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use crate::error::StorageError;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteUsageLogRepository::new(db.pool().clone());

        repo.append(t0(), CardId::new(1), Rank::Unknown).await.unwrap();
        repo.append(t0() + Duration::seconds(1), CardId::new(2), Rank::User)
            .await
            .unwrap();

        let recent = repo.find_recent(10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].card_id, CardId::new(2));
        assert_eq!(recent[0].rank, Rank::User);
        assert_eq!(recent[1].rank, Rank::Unknown);
        assert_eq!(recent[1].time, t0());
    }

    #[tokio::test]
    async fn test_duplicate_time_rejected() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteUsageLogRepository::new(db.pool().clone());

        repo.append(t0(), CardId::new(1), Rank::User).await.unwrap();
        let err = repo.append(t0(), CardId::new(2), Rank::User).await.unwrap_err();

        assert!(matches!(err, StorageError::Database(_)));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ledger_rejects_update_and_delete() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteUsageLogRepository::new(db.pool().clone());
        repo.append(t0(), CardId::new(1), Rank::User).await.unwrap();

        assert!(sqlx::query("UPDATE usage_log SET rank = 2").execute(db.pool()).await.is_err());
        assert!(sqlx::query("DELETE FROM usage_log").execute(db.pool()).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_latest_time_uses_chronological_order() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteUsageLogRepository::new(db.pool().clone());
        assert_eq!(repo.latest_time().await.unwrap(), None);

        let later = t0() + Duration::microseconds(1);
        repo.append(t0() + Duration::milliseconds(500), CardId::new(1), Rank::User)
            .await
            .unwrap();
        repo.append(later, CardId::new(1), Rank::User).await.unwrap();
        repo.append(t0(), CardId::new(1), Rank::User).await.unwrap();

        assert_eq!(
            repo.latest_time().await.unwrap(),
            Some(t0() + Duration::milliseconds(500))
        );
    }

    #[tokio::test]
    async fn test_find_by_card_filters_and_limits() {
        let db = Database::in_memory().await.unwrap();
        let repo = SqliteUsageLogRepository::new(db.pool().clone());

        for i in 0..5 {
            let card = CardId::new(if i % 2 == 0 { 10 } else { 20 });
            repo.append(t0() + Duration::seconds(i), card, Rank::User)
                .await
                .unwrap();
        }

        let entries = repo.find_by_card(CardId::new(10), 2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.card_id == CardId::new(10)));
        assert!(entries[0].seq > entries[1].seq);
    }
}
