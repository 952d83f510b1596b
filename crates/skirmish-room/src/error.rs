//! Error types for the room layer.

use skirmish_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already removed).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A room with this code is already active.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The room code is empty or whitespace.
    #[error("invalid room code {0:?}")]
    InvalidId(String),

    /// The room is full, no more seats.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// Someone in the room already goes by this name.
    #[error("player {0} already in room {1}")]
    DuplicateName(String, RoomId),

    /// Start requested before enough players joined.
    #[error("room {room_id} cannot start with {players} player(s)")]
    NotStartable { room_id: RoomId, players: usize },

    /// The game in this room is over.
    #[error("room {0} has ended")]
    Ended(RoomId),

    /// The room's command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),
}

impl RoomError {
    /// Wire error code, HTTP style.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotStartable { .. } => 400,
            Self::NotFound(_) | Self::Unavailable(_) => 404,
            Self::AlreadyExists(_)
            | Self::RoomFull(_)
            | Self::DuplicateName(..)
            | Self::Ended(_) => 409,
            Self::InvalidId(_) => 422,
        }
    }
}

/// Errors reading room rules from text, such as environment variables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomConfigError {
    #[error("unknown disconnect policy {0:?} (expected wait or auto-defend)")]
    UnknownPolicy(String),
}
