//! Inbound line parsing.
//!
//! The reader emits one line per card presentation. Depending on the
//! deployment the payload is either a bare decimal id or a fixed prefix
//! followed by the id:
//!
//! ```text
//! Card ID: 721416196\r\n     (prefixed reader)
//! 721416196\r\n              (bare reader)
//! ```
//!
//! Readers also print status chatter on the same link. Lines that are too
//! short, or that lack the configured prefix, are not presentations and are
//! skipped. A line that looks like a presentation but does not carry a valid
//! id is malformed.
//!
//! # Examples
//!
//! ```
//! use doorlock_protocol::InboundFormat;
//! use doorlock_core::CardId;
//!
//! let format = InboundFormat::prefixed("Card ID: ");
//! assert_eq!(format.parse_line("Card ID: 555\r\n").unwrap(), Some(CardId::new(555)));
//! assert_eq!(format.parse_line("Reader ready\r\n").unwrap(), None);
//! assert!(format.parse_line("Card ID: 55x\r\n").is_err());
//! ```

use doorlock_core::constants::{DEFAULT_CARD_PREFIX, MIN_PAYLOAD_LENGTH};
use doorlock_core::{CardId, Error, Result};
use serde::{Deserialize, Serialize};

/// How presentation lines are laid out on the inbound link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundFormat {
    /// Text preceding the decimal id, if the reader sends one.
    #[serde(default)]
    pub prefix: Option<String>,

    /// Minimum payload length, terminator stripped. Shorter lines are skipped.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
}

fn default_min_length() -> usize {
    MIN_PAYLOAD_LENGTH
}

impl Default for InboundFormat {
    /// The prefixed single-port reader.
    fn default() -> Self {
        Self::prefixed(DEFAULT_CARD_PREFIX)
    }
}

impl InboundFormat {
    /// Lines carry the id after `prefix`.
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            min_length: MIN_PAYLOAD_LENGTH,
        }
    }

    /// Lines carry only the decimal id.
    pub fn bare() -> Self {
        Self {
            prefix: None,
            min_length: MIN_PAYLOAD_LENGTH,
        }
    }

    /// Set the minimum payload length.
    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    /// Parse one line.
    ///
    /// Trailing `\r` and `\n` are stripped first, so lines may be passed with
    /// or without their terminator.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(id))` for a presentation
    /// - `Ok(None)` for a line that is not a presentation
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedInput` when the line has the shape of a
    /// presentation but the id is not a decimal `u32`.
    pub fn parse_line(&self, raw: &str) -> Result<Option<CardId>> {
        let line = raw.trim_end_matches(['\r', '\n']);

        if line.len() < self.min_length.max(MIN_PAYLOAD_LENGTH) {
            return Ok(None);
        }

        let digits = match &self.prefix {
            Some(prefix) => match line.strip_prefix(prefix.as_str()) {
                Some(rest) => rest,
                None => return Ok(None),
            },
            None => line,
        };

        digits
            .parse::<CardId>()
            .map(Some)
            .map_err(|e| Error::malformed(format!("{line:?}: {e}")))
    }
}
