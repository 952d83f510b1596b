//! The registry's record of who is on a connection.

use skirmish_protocol::RoomId;
use skirmish_transport::ConnectionId;

/// A live player identity.
///
/// This is bookkeeping only. Hit points and membership belong to the
/// room the player sits in; the identity just remembers the name the
/// connection was given and which room that name was seated in, so the
/// server knows whom to mark as gone when the connection drops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Unique among live identities.
    pub name: String,

    /// The connection this identity belongs to. At most one identity per
    /// connection.
    pub connection: ConnectionId,

    /// The room this name was seated in, once create/join succeeded.
    pub room: Option<RoomId>,
}
