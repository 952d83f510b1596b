//! Wire protocol for Skirmish.
//!
//! - **Types** ([`ClientRequest`], [`ServerEvent`], [`Envelope`],
//!   [`RoomView`], …): what travels between client and server.
//! - **Codec** ([`Codec`], [`JsonCodec`]): how those travel as bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Controller (rooms, players)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ActionKind, ClientRequest, Envelope, PlayerView, RoomId, RoomPhase,
    RoomView, ServerEvent, SubmittedAction,
};
