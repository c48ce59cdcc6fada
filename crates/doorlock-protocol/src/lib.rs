//! Wire formats of the reader and actuator links.
//!
//! - [`inbound`]: turning one text line from the reader into a [`CardId`]
//! - [`outbound`]: turning a resolved presentation into the byte frames the
//!   strike controller and display board expect
//!
//! [`CardId`]: doorlock_core::CardId

pub mod inbound;
pub mod outbound;

pub use inbound::InboundFormat;
pub use outbound::{Frame, RankEncoding, Response};
