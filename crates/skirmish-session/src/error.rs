//! Error types for the identity layer.

use skirmish_transport::ConnectionId;

/// Errors from [`PlayerRegistry`](crate::PlayerRegistry) operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The requested display name is empty once trimmed.
    #[error("invalid player name {0:?}")]
    InvalidName(String),

    /// No identity is associated with this connection.
    #[error("no player identity for {0}")]
    NotFound(ConnectionId),
}
