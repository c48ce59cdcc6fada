//! Outbound frames.
//!
//! The downstream boards have no self-describing framing, so every
//! deployment fixes one layout and keeps it:
//!
//! ```text
//! [card id: 4 bytes BE]  (only when echo is enabled)
//! [rank: 1 byte | ASCII decimal]
//! [name: UTF-8]          (USER / ADMINISTRATOR only, sent after a short pause)
//! ```
//!
//! The pause before the name exists because the receiving board reads one
//! buffered message at a time; it is applied by the main loop, not here.

use bytes::{BufMut, Bytes, BytesMut};
use doorlock_core::{CardId, Rank};
use serde::{Deserialize, Serialize};

/// How the rank code is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankEncoding {
    /// One raw byte holding the code (0-6).
    #[default]
    Binary,

    /// The code as ASCII decimal digits (`b"4"`).
    Ascii,
}

impl RankEncoding {
    fn put_rank(self, rank: Rank, buf: &mut BytesMut) {
        match self {
            RankEncoding::Binary => buf.put_u8(rank.code()),
            RankEncoding::Ascii => buf.put_slice(rank.code().to_string().as_bytes()),
        }
    }
}

/// One write on an outbound link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Echo of the presented id.
    CardId(CardId),

    /// Resolved rank.
    Rank(Rank),

    /// Display name of the card holder.
    Name(String),

    /// Single control byte, used to reset the display board.
    Control(u8),
}

impl Frame {
    /// Encode the frame for the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use doorlock_protocol::{Frame, RankEncoding};
    /// use doorlock_core::{CardId, Rank};
    ///
    /// assert_eq!(&Frame::Rank(Rank::User).encode(RankEncoding::Binary)[..], &[1]);
    /// assert_eq!(&Frame::Rank(Rank::User).encode(RankEncoding::Ascii)[..], b"1");
    /// assert_eq!(&Frame::CardId(CardId::new(1)).encode(RankEncoding::Binary)[..], &[0, 0, 0, 1]);
    /// ```
    pub fn encode(&self, encoding: RankEncoding) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len_hint());
        match self {
            Frame::CardId(id) => buf.put_slice(&id.to_be_bytes()),
            Frame::Rank(rank) => encoding.put_rank(*rank, &mut buf),
            Frame::Name(name) => buf.put_slice(name.as_bytes()),
            Frame::Control(byte) => buf.put_u8(*byte),
        }
        buf.freeze()
    }

    /// Returns `true` for the frame that is preceded by the name delay.
    pub fn is_name(&self) -> bool {
        matches!(self, Frame::Name(_))
    }

    fn encoded_len_hint(&self) -> usize {
        match self {
            Frame::CardId(_) => 4,
            Frame::Rank(_) | Frame::Control(_) => 1,
            Frame::Name(name) => name.len(),
        }
    }
}

/// What the controller answers for one presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub card_id: CardId,
    pub rank: Rank,
    /// Present only for ranks that open the door.
    pub display_name: Option<String>,
}

impl Response {
    /// Build the response for a resolved presentation.
    ///
    /// For USER and ADMINISTRATOR the display name is the stored name, or
    /// the decimal id when none is stored. Other ranks carry no name.
    pub fn new(card_id: CardId, rank: Rank, stored_name: Option<&str>) -> Self {
        let display_name = rank.grants_access().then(|| {
            stored_name
                .map(str::to_owned)
                .unwrap_or_else(|| card_id.to_string())
        });

        Self {
            card_id,
            rank,
            display_name,
        }
    }

    /// Frames in emission order.
    pub fn frames(&self, echo_card_id: bool) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(3);
        if echo_card_id {
            frames.push(Frame::CardId(self.card_id));
        }
        frames.push(Frame::Rank(self.rank));
        if let Some(name) = &self.display_name {
            frames.push(Frame::Name(name.clone()));
        }
        frames
    }
}
