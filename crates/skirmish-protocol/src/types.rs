//! Everything that crosses the wire between a game client and the server.
//!
//! Clients send [`ClientRequest`]s and receive [`ServerEvent`]s, each
//! wrapped in an [`Envelope`]. Rooms and players travel as read-only
//! snapshots ([`RoomView`], [`PlayerView`]); the authoritative state lives
//! inside the room actor and never leaves it.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A room code chosen by the player who creates the room.
///
/// Serialized as a bare string (`"arena-1"`, not `{"0":"arena-1"}`).
/// Codes are unique among active rooms; once a room is torn down its code
/// can be reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Creates a room id from anything string-like.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrows the code.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `true` for an empty or whitespace-only code, which no room may use.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(code: &str) -> Self {
        Self(code.to_owned())
    }
}

impl From<String> for RoomId {
    fn from(code: String) -> Self {
        Self(code)
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// What a player does in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// Deal damage to the target.
    Attack,
    /// Roll a defense budget that absorbs attacks aimed at the actor
    /// for the rest of the round.
    Defend,
}

/// One player's action for the current round.
///
/// The actor is taken at face value: there is no authentication, so the
/// server trusts the name the client puts here. `target` is ignored for
/// [`ActionKind::Defend`] and may be omitted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedAction {
    pub room_id: RoomId,
    pub actor: String,
    #[serde(default)]
    pub target: String,
    pub kind: ActionKind,
}

impl SubmittedAction {
    /// Shorthand for an attack from `actor` on `target`.
    pub fn attack(
        room_id: impl Into<RoomId>,
        actor: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            room_id: room_id.into(),
            actor: actor.into(),
            target: target.into(),
            kind: ActionKind::Attack,
        }
    }

    /// Shorthand for `actor` defending this round.
    pub fn defend(room_id: impl Into<RoomId>, actor: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            actor: actor.into(),
            target: String::new(),
            kind: ActionKind::Defend,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Where a room is in its life.
///
/// ```text
/// Lobby ──(StartGame)──→ Simultaneous ⟲ (each resolved round) ──→ Ended
/// ```
///
/// `Simultaneous` goes on the wire as `"ALL"`: every living player acts
/// in the same round, nobody waits for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoomPhase {
    /// Created, gathering players.
    #[default]
    Lobby,
    /// Collecting one action from each living player.
    #[serde(rename = "ALL")]
    Simultaneous,
    /// A winner (or nobody) is left standing.
    Ended,
}

impl RoomPhase {
    /// `true` until the game has ended.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Ended)
    }
}

impl fmt::Display for RoomPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Simultaneous => write!(f, "ALL"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

/// A player as other clients see them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub hp: u32,
    pub connected: bool,
}

impl PlayerView {
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// A point-in-time copy of a room. May be stale as soon as it is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub room_id: RoomId,
    /// Members in the order they joined.
    pub players: Vec<PlayerView>,
    pub phase: RoomPhase,
}

impl RoomView {
    /// Looks a member up by name.
    pub fn player(&self, name: &str) -> Option<&PlayerView> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Number of members with HP left.
    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive()).count()
    }
}

// ---------------------------------------------------------------------------
// Requests and events
// ---------------------------------------------------------------------------

/// Client → server operations.
///
/// Internally tagged, so a request reads
/// `{"type":"JoinRoom","room_id":"arena","player_name":"Alice"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Open a new room and sit in it.
    CreateRoom { room_id: RoomId, player_name: String },

    /// Sit in an existing room.
    JoinRoom { room_id: RoomId, player_name: String },

    /// Submit this round's action. Never answered; invalid actions are
    /// dropped.
    MakeAction { action: SubmittedAction },

    /// Begin simultaneous rounds. Needs at least two members.
    StartGame { room_id: RoomId },

    /// Ask for the codes of all active rooms.
    GetRoomList,

    /// Keep-alive. Answered with [`ServerEvent::HeartbeatAck`].
    Heartbeat { client_time: u64 },

    /// The client is leaving; the server closes the connection.
    Disconnect { reason: String },
}

/// Server → client notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Sent to the creator once their room exists.
    RoomCreated { room_id: RoomId },

    /// Broadcast to the room when someone joins.
    PlayerJoinedRoom { room_id: RoomId },

    /// Broadcast right after [`ServerEvent::PlayerJoinedRoom`].
    RoomInfoUpdated { room: RoomView },

    /// A new round is open; every living player should act.
    StartRound { room: RoomView },

    /// The log of the round that just resolved, in resolution order.
    PastRoundInfo { log: Vec<String> },

    /// The last player standing. The room is gone after this.
    Winner { player: PlayerView },

    /// Everybody died in the same round. The room is gone after this.
    Draw { room_id: RoomId },

    /// Reply to [`ClientRequest::GetRoomList`].
    RoomList { rooms: Vec<RoomId> },

    /// Reply to [`ClientRequest::Heartbeat`].
    HeartbeatAck { client_time: u64, server_time: u64 },

    /// Something the caller asked for could not be done. `code` follows
    /// HTTP conventions (400, 404, 409, 422).
    Error { code: u16, message: String },
}

/// Framing shared by both directions.
///
/// `seq` counts up per sender and per connection; `timestamp` is
/// milliseconds since the sender's connection started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<P> {
    pub seq: u64,
    #[serde(default)]
    pub timestamp: u64,
    pub payload: P,
}

impl<P> Envelope<P> {
    /// Wraps a payload.
    pub fn new(seq: u64, timestamp: u64, payload: P) -> Self {
        Self { seq, timestamp, payload }
    }
}

#[cfg(test)]
mod tests {
    //! The JSON shapes here are what browser clients code against; a
    //! change that breaks one of these tests breaks every client.

    use super::*;

    fn sample_room() -> RoomView {
        RoomView {
            room_id: RoomId::new("arena"),
            players: vec![
                PlayerView { name: "Alice".into(), hp: 10, connected: true },
                PlayerView { name: "Bob".into(), hp: 0, connected: false },
            ],
            phase: RoomPhase::Simultaneous,
        }
    }

    #[test]
    fn test_room_id_is_a_bare_string() {
        let json = serde_json::to_string(&RoomId::new("arena")).unwrap();
        assert_eq!(json, "\"arena\"");
        let back: RoomId = serde_json::from_str("\"arena\"").unwrap();
        assert_eq!(back.as_str(), "arena");
    }

    #[test]
    fn test_room_id_blank_detection() {
        assert!(RoomId::new("").is_blank());
        assert!(RoomId::new("   ").is_blank());
        assert!(!RoomId::new("a").is_blank());
    }

    #[test]
    fn test_simultaneous_phase_is_all_on_the_wire() {
        let json = serde_json::to_string(&RoomPhase::Simultaneous).unwrap();
        assert_eq!(json, "\"ALL\"");
        assert_eq!(RoomPhase::Simultaneous.to_string(), "ALL");
        assert_eq!(RoomPhase::default(), RoomPhase::Lobby);
    }

    #[test]
    fn test_phase_is_open_until_ended() {
        assert!(RoomPhase::Lobby.is_open());
        assert!(RoomPhase::Simultaneous.is_open());
        assert!(!RoomPhase::Ended.is_open());
    }

    #[test]
    fn test_make_action_request_json_format() {
        let req = ClientRequest::MakeAction {
            action: SubmittedAction::attack("arena", "Alice", "Bob"),
        };
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["type"], "MakeAction");
        assert_eq!(json["action"]["room_id"], "arena");
        assert_eq!(json["action"]["actor"], "Alice");
        assert_eq!(json["action"]["target"], "Bob");
        assert_eq!(json["action"]["kind"], "Attack");
    }

    #[test]
    fn test_defend_action_may_omit_target() {
        let json = r#"{"room_id":"arena","actor":"Bob","kind":"Defend"}"#;
        let action: SubmittedAction = serde_json::from_str(json).unwrap();
        assert_eq!(action, SubmittedAction::defend("arena", "Bob"));
    }

    #[test]
    fn test_get_room_list_request_has_only_a_tag() {
        let req: ClientRequest =
            serde_json::from_str(r#"{"type":"GetRoomList"}"#).unwrap();
        assert_eq!(req, ClientRequest::GetRoomList);
    }

    #[test]
    fn test_start_round_event_carries_room_snapshot() {
        let event = ServerEvent::StartRound { room: sample_room() };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "StartRound");
        assert_eq!(json["room"]["room_id"], "arena");
        assert_eq!(json["room"]["phase"], "ALL");
        assert_eq!(json["room"]["players"][0]["name"], "Alice");
        assert_eq!(json["room"]["players"][1]["hp"], 0);
    }

    #[test]
    fn test_past_round_info_keeps_log_order() {
        let event = ServerEvent::PastRoundInfo {
            log: vec!["first".into(), "second".into()],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["log"], serde_json::json!(["first", "second"]));
    }

    #[test]
    fn test_error_event_json_format() {
        let event = ServerEvent::Error { code: 409, message: "taken".into() };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "Error");
        assert_eq!(json["code"], 409);
        assert_eq!(json["message"], "taken");
    }

    #[test]
    fn test_envelope_timestamp_defaults_when_missing() {
        let json = r#"{"seq":3,"payload":{"type":"GetRoomList"}}"#;
        let env: Envelope<ClientRequest> = serde_json::from_str(json).unwrap();
        assert_eq!(env.seq, 3);
        assert_eq!(env.timestamp, 0);
        assert_eq!(env.payload, ClientRequest::GetRoomList);
    }

    #[test]
    fn test_room_view_helpers() {
        let room = sample_room();
        assert_eq!(room.alive_count(), 1);
        assert!(room.player("Bob").is_some_and(|p| !p.is_alive()));
        assert!(room.player("Carol").is_none());
    }

    #[test]
    fn test_unknown_request_type_is_rejected() {
        let result: Result<ClientRequest, _> =
            serde_json::from_str(r#"{"type":"FlyToMoon"}"#);
        assert!(result.is_err());
    }
}
