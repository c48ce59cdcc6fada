//! Bootstrap provisioning.
//!
//! Creates every bootstrap credential that is missing from the store.
//! Credentials already present are left exactly as they are, whatever
//! their stored rank or name.

use crate::error::StorageResult;
use crate::store::CredentialStore;
use doorlock_core::{BootstrapTable, CardId};
use tracing::{debug, info};

/// Outcome of one provisioning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionReport {
    /// Ids created by this pass.
    pub created: Vec<CardId>,
    /// Bootstrap ids that were already enrolled.
    pub already_present: usize,
}

impl ProvisionReport {
    pub fn created_count(&self) -> usize {
        self.created.len()
    }
}

/// Ensure every card in `table` exists in `store`.
///
/// Idempotent: a second call on the same store creates nothing.
///
/// # Errors
///
/// Returns the first store failure. Cards created before the failure stay
/// created; rerunning finishes the job.
pub async fn provision<S: CredentialStore>(
    store: &S,
    table: &BootstrapTable,
) -> StorageResult<ProvisionReport> {
    let mut report = ProvisionReport::default();

    for card in table {
        if store.lookup(card.id).await?.is_some() {
            debug!(card_id = %card.id, "bootstrap card already enrolled");
            report.already_present += 1;
            continue;
        }

        match store.enroll(card.id, card.rank, card.name.as_deref()).await {
            Ok(()) => {
                info!(card_id = %card.id, rank = %card.rank, "provisioned bootstrap card");
                report.created.push(card.id);
            }
            // Raced with another writer; the card exists now.
            Err(e) if e.is_duplicate() => report.already_present += 1,
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;
    use crate::store::SqliteCredentialStore;
    use doorlock_core::{BootstrapCard, Rank};
    use rstest::rstest;

    async fn store() -> SqliteCredentialStore {
        let db = Database::in_memory().await.unwrap();
        SqliteCredentialStore::new(db.pool().clone())
    }

    #[tokio::test]
    async fn test_provision_empty_store_creates_all() {
        let store = store().await;
        let table = BootstrapTable::default();

        let report = provision(&store, &table).await.unwrap();
        assert_eq!(report.created_count(), 5);
        assert_eq!(report.already_present, 0);

        for card in &table {
            let record = store.lookup(card.id).await.unwrap().unwrap();
            assert_eq!(record.rank, card.rank);
            assert_eq!(record.name, card.name);
        }
    }

    #[tokio::test]
    async fn test_provision_is_idempotent() {
        let store = store().await;
        let table = BootstrapTable::default();

        provision(&store, &table).await.unwrap();
        let again = provision(&store, &table).await.unwrap();

        assert!(again.created.is_empty());
        assert_eq!(again.already_present, 5);
        assert_eq!(store.list().await.unwrap().len(), 5);
    }

    #[rstest]
    #[case::owner(721_416_196)]
    #[case::wipe(704_852_996)]
    #[case::programming(711_223_556)]
    #[case::delete(709_711_364)]
    #[case::master(707_829_764)]
    #[tokio::test]
    async fn test_provision_never_overwrites_existing(#[case] id: u32) {
        let store = store().await;
        let taken = CardId::new(id);
        store.enroll(taken, Rank::User, Some("Tenant")).await.unwrap();

        let report = provision(&store, &BootstrapTable::default()).await.unwrap();
        assert_eq!(report.created_count(), 4);
        assert_eq!(report.already_present, 1);
        assert!(!report.created.contains(&taken));

        let record = store.lookup(taken).await.unwrap().unwrap();
        assert_eq!(record.rank, Rank::User);
        assert_eq!(record.name.as_deref(), Some("Tenant"));
    }

    #[tokio::test]
    async fn test_provision_custom_table() {
        let store = store().await;
        let table = BootstrapTable::new(vec![BootstrapCard::new(
            CardId::new(100),
            Rank::Programming,
            "Prog",
        )])
        .unwrap();

        let report = provision(&store, &table).await.unwrap();
        assert_eq!(report.created, vec![CardId::new(100)]);
    }

    #[tokio::test]
    async fn test_provision_empty_table_is_noop() {
        let store = store().await;
        let report = provision(&store, &BootstrapTable::empty()).await.unwrap();
        assert_eq!(report, ProvisionReport::default());
    }
}
