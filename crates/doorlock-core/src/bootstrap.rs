//! Bootstrap credentials.
//!
//! A controller is only administrable while its special cards exist. The
//! bootstrap table lists them; provisioning creates any that are missing and
//! never touches those already stored.

use crate::{CardId, Rank, Result, error::Error};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One bootstrap credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapCard {
    pub id: CardId,
    pub rank: Rank,
    #[serde(default)]
    pub name: Option<String>,
}

impl BootstrapCard {
    pub fn new(id: CardId, rank: Rank, name: impl Into<String>) -> Self {
        Self {
            id,
            rank,
            name: Some(name.into()),
        }
    }
}

/// Validated set of bootstrap credentials.
///
/// Ids are unique and no entry carries `Rank::Unknown`, since an unknown rank
/// cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapTable {
    cards: Vec<BootstrapCard>,
}

impl BootstrapTable {
    /// Build a table from a list of cards.
    ///
    /// # Errors
    /// Returns `Error::Config` for duplicate ids or an `unknown` rank.
    pub fn new(cards: Vec<BootstrapCard>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(cards.len());
        for card in &cards {
            if card.rank == Rank::Unknown {
                return Err(Error::config(format!(
                    "bootstrap card {} cannot have rank unknown",
                    card.id
                )));
            }
            if !seen.insert(card.id) {
                return Err(Error::config(format!(
                    "bootstrap card {} is listed twice",
                    card.id
                )));
            }
        }
        Ok(Self { cards })
    }

    /// An empty table: provisioning becomes a no-op.
    pub fn empty() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BootstrapCard> {
        self.cards.iter()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, id: CardId) -> bool {
        self.cards.iter().any(|card| card.id == id)
    }

    /// First bootstrap card holding `rank`, if any.
    pub fn card_for(&self, rank: Rank) -> Option<&BootstrapCard> {
        self.cards.iter().find(|card| card.rank == rank)
    }
}

impl Default for BootstrapTable {
    /// The five cards shipped with the controller: the owner plus one card
    /// per special rank.
    fn default() -> Self {
        Self {
            cards: vec![
                BootstrapCard::new(CardId::new(721_416_196), Rank::Administrator, "Owner"),
                BootstrapCard::new(CardId::new(704_852_996), Rank::Wipe, "Master Wiper"),
                BootstrapCard::new(
                    CardId::new(711_223_556),
                    Rank::Programming,
                    "Master Programming",
                ),
                BootstrapCard::new(CardId::new(709_711_364), Rank::Delete, "Master Deletion"),
                BootstrapCard::new(CardId::new(707_829_764), Rank::Master, "Master Card"),
            ],
        }
    }
}

impl<'a> IntoIterator for &'a BootstrapTable {
    type Item = &'a BootstrapCard;
    type IntoIter = std::slice::Iter<'a, BootstrapCard>;

    fn into_iter(self) -> Self::IntoIter {
        self.cards.iter()
    }
}
