//! The coordination layer between connections, identities, and rooms.
//!
//! Every client request lands here as a call carrying the caller's
//! connection id and event channel. The controller resolves the caller's
//! name, forwards to the room registry, and reports failures back on the
//! caller's channel only.

use skirmish_protocol::{RoomId, RoomView, ServerEvent, SubmittedAction};
use skirmish_room::{
    EventSender, Player, RejectReason, RoomConfig, RoomRegistry, Submission,
};
use skirmish_session::{Identity, PlayerRegistry};
use skirmish_transport::ConnectionId;
use tokio::sync::Mutex;

use crate::SkirmishError;

/// Routes client operations to the player and room registries.
///
/// The player registry lock is held only for map operations and is
/// always released before a room is called.
pub struct RoomController {
    players: Mutex<PlayerRegistry>,
    rooms: RoomRegistry,
}

impl RoomController {
    pub fn new(config: RoomConfig) -> Self {
        Self::with_rooms(RoomRegistry::new(config))
    }

    pub fn with_rooms(rooms: RoomRegistry) -> Self {
        Self {
            players: Mutex::new(PlayerRegistry::new()),
            rooms,
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// The name currently bound to `connection`, if any.
    pub async fn player_name(&self, connection: ConnectionId) -> Option<String> {
        let players = self.players.lock().await;
        players.lookup_by_connection(connection).map(|i| i.name.clone())
    }

    /// Opens a room with the caller as its founder and sends them
    /// `RoomCreated`.
    pub async fn create_room(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        player_name: &str,
        events: &EventSender,
    ) -> Result<RoomId, SkirmishError> {
        let result = self
            .try_create_room(connection, room_id, player_name, events)
            .await;
        match &result {
            Ok(room_id) => {
                let _ = events.send(ServerEvent::RoomCreated {
                    room_id: room_id.clone(),
                });
            }
            Err(e) => report(events, e),
        }
        result
    }

    async fn try_create_room(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        player_name: &str,
        events: &EventSender,
    ) -> Result<RoomId, SkirmishError> {
        let identity = self.players.lock().await.reserve(player_name, connection)?;
        let founder = Player::new(identity.name.clone(), connection);
        match self.rooms.create(room_id, founder, events.clone()) {
            Ok(room_id) => {
                self.seat(identity, &room_id).await?;
                Ok(room_id)
            }
            Err(e) => {
                self.players.lock().await.cancel(connection);
                Err(e.into())
            }
        }
    }

    /// Seats the caller in an existing room. The room itself announces the
    /// join to everyone seated, the caller included.
    pub async fn join_room(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        player_name: &str,
        events: &EventSender,
    ) -> Result<RoomView, SkirmishError> {
        let result = self
            .try_join_room(connection, room_id, player_name, events)
            .await;
        if let Err(e) = &result {
            report(events, e);
        }
        result
    }

    async fn try_join_room(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        player_name: &str,
        events: &EventSender,
    ) -> Result<RoomView, SkirmishError> {
        let identity = self.players.lock().await.reserve(player_name, connection)?;
        let seat = Player::new(identity.name.clone(), connection);
        match self.rooms.try_join(&room_id, seat, events.clone()).await {
            Ok(view) => {
                self.seat(identity, &room_id).await?;
                Ok(view)
            }
            Err(e) => {
                self.players.lock().await.cancel(connection);
                Err(e.into())
            }
        }
    }

    /// Queues an action for the caller. Rejections are only logged.
    ///
    /// The action must name the caller's own player; anything else is
    /// rejected as [`RejectReason::NotMember`].
    pub async fn make_action(
        &self,
        connection: ConnectionId,
        action: SubmittedAction,
    ) -> Submission {
        let owner = self.player_name(connection).await;
        if owner.as_deref() != Some(action.actor.as_str()) {
            tracing::debug!(
                %connection,
                actor = %action.actor,
                "action for a player this connection does not own"
            );
            return Submission::Rejected(RejectReason::NotMember);
        }

        let room_id = action.room_id.clone();
        let submission = self.rooms.submit(action).await;
        if let Submission::Rejected(reason) = &submission {
            tracing::debug!(%connection, %room_id, %reason, "action dropped");
        }
        submission
    }

    /// Moves a lobby into its first round.
    pub async fn start_game(
        &self,
        room_id: &RoomId,
        events: &EventSender,
    ) -> Result<RoomView, SkirmishError> {
        let result = self.rooms.start(room_id).await.map_err(SkirmishError::from);
        if let Err(e) = &result {
            report(events, e);
        }
        result
    }

    /// Active room codes, oldest first.
    pub fn room_list(&self) -> Vec<RoomId> {
        self.rooms.list_ids()
    }

    /// Forgets the connection's identity and marks its seat, if any,
    /// disconnected. Safe to call more than once.
    pub async fn on_disconnected(&self, connection: ConnectionId) {
        let released = self.players.lock().await.release(connection);
        if let Some(identity) = released {
            tracing::info!(%connection, player = %identity.name, "player disconnected");
            self.vacate(identity).await;
        }
    }

    /// Makes a reserved identity current now that its seat in `room_id`
    /// exists, then marks the connection's previous seat, if any,
    /// disconnected.
    async fn seat(&self, identity: Identity, room_id: &RoomId) -> Result<(), SkirmishError> {
        let connection = identity.connection;
        let committed = {
            let mut players = self.players.lock().await;
            match players.commit(connection) {
                Ok(previous) => players
                    .assign_room(connection, room_id.clone())
                    .map(|()| previous),
                Err(e) => Err(e),
            }
        };

        match committed {
            Ok(previous) => {
                if let Some(previous) = previous {
                    self.vacate(previous).await;
                }
                Ok(())
            }
            Err(e) => {
                // Released while the room call ran; the new seat is orphaned.
                self.rooms.disconnect(room_id, &identity.name).await;
                Err(e.into())
            }
        }
    }

    async fn vacate(&self, identity: Identity) {
        if let Some(room_id) = identity.room {
            self.rooms.disconnect(&room_id, &identity.name).await;
        }
    }
}

/// Sends `error` to the caller as an `Error` event.
fn report(events: &EventSender, error: &SkirmishError) {
    tracing::debug!(code = error.code(), error = %error, "request failed");
    let _ = events.send(ServerEvent::Error {
        code: error.code(),
        message: error.to_string(),
    });
}
