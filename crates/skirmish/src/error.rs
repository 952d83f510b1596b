//! Unified error type for the Skirmish server.

use skirmish_protocol::ProtocolError;
use skirmish_room::RoomError;
use skirmish_session::SessionError;
use skirmish_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls,
/// so `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// Connection, send, or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encode or decode failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Player name could not be resolved.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Room missing, full, conflicting, or not startable.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Bad environment configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SkirmishError {
    /// Wire error code for this failure, HTTP style.
    pub fn code(&self) -> u16 {
        match self {
            Self::Room(e) => e.code(),
            Self::Session(SessionError::InvalidName(_)) => 422,
            Self::Session(SessionError::NotFound(_)) => 404,
            Self::Protocol(_) => 400,
            Self::Transport(_) | Self::Config(_) => 500,
        }
    }
}
