use crate::{Result, error::Error};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credential identifier read from an NFC card.
///
/// Identifiers travel as decimal text on the inbound link and may be echoed
/// back as four big-endian bytes, so they are restricted to the `u32` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(u32);

impl CardId {
    /// Create a card id from its numeric value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        CardId(id)
    }

    /// Get the raw id.
    #[must_use]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Get the id widened to the storage integer type.
    #[must_use]
    pub fn as_i64(&self) -> i64 {
        i64::from(self.0)
    }

    /// Four-byte big-endian encoding used when echoing the id downstream.
    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CardId {
    fn from(id: u32) -> Self {
        CardId(id)
    }
}

impl TryFrom<i64> for CardId {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self> {
        u32::try_from(value)
            .map(CardId)
            .map_err(|_| Error::InvalidCardId(format!("{value} is outside the 32-bit range")))
    }
}

impl std::str::FromStr for CardId {
    type Err = Error;

    /// Parse a bare decimal id. Signs, whitespace and hex are rejected.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidCardId(format!("not a decimal id: {s:?}")));
        }
        s.parse::<u32>()
            .map(CardId)
            .map_err(|_| Error::InvalidCardId(format!("{s} is outside the 32-bit range")))
    }
}

/// Authorization level attached to a credential.
///
/// `Unknown` is never stored: it is what a lookup resolves to when no record
/// exists. Ranks from `Wipe` upwards are administrative and never open the
/// door; presenting them triggers a mode change or a store operation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Rank {
    #[default]
    Unknown = 0,
    User = 1,
    Administrator = 2,
    Wipe = 3,
    Programming = 4,
    Delete = 5,
    Master = 6,
}

impl Rank {
    /// All ranks in code order.
    pub const ALL: [Rank; 7] = [
        Rank::Unknown,
        Rank::User,
        Rank::Administrator,
        Rank::Wipe,
        Rank::Programming,
        Rank::Delete,
        Rank::Master,
    ];

    /// Create a rank from its numeric code.
    ///
    /// # Errors
    /// Returns `Error::InvalidRank` for codes outside 0-6.
    #[inline]
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            0 => Ok(Rank::Unknown),
            1 => Ok(Rank::User),
            2 => Ok(Rank::Administrator),
            3 => Ok(Rank::Wipe),
            4 => Ok(Rank::Programming),
            5 => Ok(Rank::Delete),
            6 => Ok(Rank::Master),
            _ => Err(Error::InvalidRank(code)),
        }
    }

    /// Numeric code sent downstream and stored in the database.
    #[inline]
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Returns `true` for any rank backed by a stored record.
    #[inline]
    #[must_use]
    pub fn is_known(self) -> bool {
        self != Rank::Unknown
    }

    /// Returns `true` for ranks that trigger administrative actions.
    #[inline]
    #[must_use]
    pub fn is_special(self) -> bool {
        matches!(
            self,
            Rank::Wipe | Rank::Programming | Rank::Delete | Rank::Master
        )
    }

    /// Returns `true` for ranks that open the door.
    #[inline]
    #[must_use]
    pub fn grants_access(self) -> bool {
        matches!(self, Rank::User | Rank::Administrator)
    }

    /// Lowercase name, as used in configuration files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Unknown => "unknown",
            Rank::User => "user",
            Rank::Administrator => "administrator",
            Rank::Wipe => "wipe",
            Rank::Programming => "programming",
            Rank::Delete => "delete",
            Rank::Master => "master",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Rank> for u8 {
    fn from(rank: Rank) -> Self {
        rank.code()
    }
}

impl From<Rank> for i64 {
    fn from(rank: Rank) -> Self {
        i64::from(rank.code())
    }
}

impl TryFrom<i64> for Rank {
    type Error = Error;

    fn try_from(code: i64) -> Result<Self> {
        Rank::from_code(code)
    }
}

impl std::str::FromStr for Rank {
    type Err = Error;

    /// Accepts either the lowercase name or the numeric code.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(code) = s.parse::<i64>() {
            return Rank::from_code(code);
        }
        Rank::ALL
            .into_iter()
            .find(|rank| rank.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::malformed(format!("unknown rank name: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("0", 0)]
    #[case("555", 555)]
    #[case("721416196", 721_416_196)]
    #[case("4294967295", u32::MAX)]
    fn test_card_id_valid(#[case] input: &str, #[case] expected: u32) {
        let id: CardId = input.parse().unwrap();
        assert_eq!(id.as_u32(), expected);
        assert_eq!(id.to_string(), expected.to_string());
    }

    #[rstest]
    #[case("")]
    #[case("-1")]
    #[case("+5")]
    #[case(" 12")]
    #[case("0x1F")]
    #[case("4294967296")]
    fn test_card_id_invalid(#[case] input: &str) {
        let result: Result<CardId> = input.parse();
        assert!(matches!(result, Err(Error::InvalidCardId(_))));
    }

    #[test]
    fn test_card_id_be_bytes() {
        let id = CardId::new(721_416_196);
        assert_eq!(id.to_be_bytes(), [0x2A, 0xFF, 0xF0, 0x04]);
    }

    #[test]
    fn test_card_id_from_storage_integer() {
        assert_eq!(CardId::try_from(555_i64).unwrap(), CardId::new(555));
        assert!(CardId::try_from(-1_i64).is_err());
        assert!(CardId::try_from(i64::from(u32::MAX) + 1).is_err());
    }

    #[rstest]
    #[case(0, Rank::Unknown)]
    #[case(1, Rank::User)]
    #[case(2, Rank::Administrator)]
    #[case(3, Rank::Wipe)]
    #[case(4, Rank::Programming)]
    #[case(5, Rank::Delete)]
    #[case(6, Rank::Master)]
    fn test_rank_codes(#[case] code: i64, #[case] rank: Rank) {
        assert_eq!(Rank::from_code(code).unwrap(), rank);
        assert_eq!(i64::from(rank), code);
    }

    #[test]
    fn test_rank_invalid_code() {
        assert!(matches!(Rank::from_code(7), Err(Error::InvalidRank(7))));
        assert!(matches!(Rank::from_code(-1), Err(Error::InvalidRank(-1))));
    }

    #[test]
    fn test_rank_classification() {
        assert!(!Rank::Unknown.is_known());
        assert!(Rank::User.grants_access());
        assert!(Rank::Administrator.grants_access());

        for rank in [Rank::Wipe, Rank::Programming, Rank::Delete, Rank::Master] {
            assert!(rank.is_special());
            assert!(!rank.grants_access());
        }
    }

    #[test]
    fn test_rank_ordering_matches_codes() {
        assert!(Rank::Unknown < Rank::User);
        assert!(Rank::User > Rank::Unknown);
        assert!(Rank::Master > Rank::Delete);
    }

    #[rstest]
    #[case("programming", Rank::Programming)]
    #[case("Master", Rank::Master)]
    #[case("2", Rank::Administrator)]
    fn test_rank_from_str(#[case] input: &str, #[case] expected: Rank) {
        assert_eq!(input.parse::<Rank>().unwrap(), expected);
    }

    #[test]
    fn test_rank_serde_names() {
        let json = serde_json::to_string(&Rank::Programming).unwrap();
        assert_eq!(json, "\"programming\"");
        let rank: Rank = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(rank, Rank::Delete);
    }
}
