use chrono::{DateTime, Utc};
use doorlock_core::{CardId, Rank};
use serde::{Deserialize, Serialize};

/// One row of the credential table.
///
/// `rank` is never [`Rank::Unknown`]: an unknown card is simply absent.
/// A stored rank code outside 1-6 fails to decode rather than being coerced.
///
/// # Examples
///
/// ```
/// use doorlock_storage::models::CredentialRecord;
/// use doorlock_core::{CardId, Rank};
///
/// let record = CredentialRecord {
///     id: CardId::new(555),
///     rank: Rank::User,
///     name: None,
///     last_used: None,
/// };
/// assert_eq!(record.display_name(), "555");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CredentialRecord {
    #[sqlx(rename = "card_id", try_from = "i64")]
    pub id: CardId,

    #[sqlx(try_from = "i64")]
    pub rank: Rank,

    /// Display name, if one was ever assigned.
    pub name: Option<String>,

    /// Time of the last presentation of this card.
    pub last_used: Option<DateTime<Utc>>,
}

impl CredentialRecord {
    /// Stored name, or the decimal id when none is set.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}
