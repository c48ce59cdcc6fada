//! Framing and timing defaults for the serial deployments.
//!
//! Two deployments share these values:
//!
//! - **Single port**: the card reader and the door strike share one serial
//!   device. The reader sends `Card ID: <decimal>\r\n`; the controller answers
//!   on the same port with the rank as one binary byte.
//! - **Reader + display**: the reader sends the bare decimal id; the
//!   controller answers with the ASCII rank on the reader port and on a
//!   display board port, followed by the card name on the reader port.
//!
//! # Usage
//!
//! ```
//! use doorlock_core::constants::*;
//!
//! assert_eq!(DEFAULT_CARD_PREFIX, "Card ID: ");
//! assert!(MIN_PAYLOAD_LENGTH <= DEFAULT_MAX_LINE_LENGTH);
//! ```

// ============================================================================
// Inbound framing
// ============================================================================

/// Prefix the single-port reader puts in front of every card id.
pub const DEFAULT_CARD_PREFIX: &str = "Card ID: ";

/// Shortest payload, terminator stripped, worth parsing.
///
/// A raw line of two bytes or less is a bare `\r\n` and is dropped.
pub const MIN_PAYLOAD_LENGTH: usize = 1;

/// Longest line accepted from a reader before the framer gives up.
///
/// A card line is under 32 bytes; this only bounds garbage on the wire.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 256;

// ============================================================================
// Serial links
// ============================================================================

/// Baud rate of the card reader link.
pub const DEFAULT_READER_BAUD_RATE: u32 = 115_200;

/// Capacity of the channel between the serial reader thread and the main loop.
pub const LINE_CHANNEL_CAPACITY: usize = 32;

// ============================================================================
// Outbound timing
// ============================================================================

/// Delay between the rank frame and the name frame, in milliseconds.
///
/// The receiving board reads one line-buffered message at a time and needs
/// this gap to consume the rank before the name arrives.
pub const DEFAULT_NAME_DELAY_MS: u64 = 50;

/// Delay before the display board reset byte, in milliseconds.
pub const DEFAULT_CLEAR_DELAY_MS: u64 = 5_000;

/// Reset byte understood by the display board.
pub const DEFAULT_CLEAR_BYTE: u8 = b'c';

// ============================================================================
// Storage and state
// ============================================================================

/// Default SQLite database location.
pub const DEFAULT_STORE_PATH: &str = "/srv/doorlock.db";

/// Number of mode transitions kept for diagnostics.
pub const MODE_HISTORY_SIZE: usize = 100;
