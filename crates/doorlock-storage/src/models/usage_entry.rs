use chrono::{DateTime, Utc};
use doorlock_core::{CardId, Rank};
use serde::{Deserialize, Serialize};

/// One row of the usage ledger.
///
/// Entries are append-only. `rank` is the rank resolved at presentation
/// time, so it may be [`Rank::Unknown`] for cards that were never enrolled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UsageEntry {
    /// Insertion sequence number.
    pub seq: i64,

    /// Presentation time; unique across the ledger.
    pub time: DateTime<Utc>,

    #[sqlx(try_from = "i64")]
    pub card_id: CardId,

    #[sqlx(try_from = "i64")]
    pub rank: Rank,
}
