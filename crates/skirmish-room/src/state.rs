//! Room membership and per-player state.
//!
//! These types are owned by exactly one room actor; nothing here is
//! shared or locked.

use skirmish_protocol::{PlayerView, RoomId, RoomPhase, RoomView};
use skirmish_transport::ConnectionId;

use crate::RoomError;

/// HP a [`Player`] starts with unless the room config says otherwise.
pub const DEFAULT_STARTING_HP: u32 = 10;

/// A seated combatant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Unique within the room (and process-wide, via the player registry).
    pub name: String,

    /// The connection that seated this player.
    pub connection: ConnectionId,

    /// Cleared when the connection drops. The seat is kept.
    pub connected: bool,

    /// Alive while above zero.
    pub hp: u32,
}

impl Player {
    /// A connected player at full health.
    pub fn new(name: impl Into<String>, connection: ConnectionId) -> Self {
        Self {
            name: name.into(),
            connection,
            connected: true,
            hp: DEFAULT_STARTING_HP,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Subtracts `amount` (saturating at zero) and returns the HP left.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        self.hp = self.hp.saturating_sub(amount);
        self.hp
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            name: self.name.clone(),
            hp: self.hp,
            connected: self.connected,
        }
    }
}

/// A room's members and phase.
///
/// Players are kept in join order, which is also the order used for
/// snapshots and forced actions.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    players: Vec<Player>,
    phase: RoomPhase,
}

impl Room {
    /// A lobby holding only its founder.
    pub fn new(id: RoomId, founder: Player) -> Self {
        Self {
            id,
            players: vec![founder],
            phase: RoomPhase::Lobby,
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn set_phase(&mut self, phase: RoomPhase) {
        self.phase = phase;
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.name == name)
    }

    pub fn player_mut(&mut self, name: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.player(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Seats `player` if the room is open, has space, and the name is free.
    pub fn add(&mut self, player: Player, capacity: usize) -> Result<(), RoomError> {
        if !self.phase.is_open() {
            return Err(RoomError::Ended(self.id.clone()));
        }
        if self.contains(&player.name) {
            return Err(RoomError::DuplicateName(player.name, self.id.clone()));
        }
        if self.players.len() >= capacity {
            return Err(RoomError::RoomFull(self.id.clone()));
        }
        self.players.push(player);
        Ok(())
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive()).count()
    }

    pub fn connected_count(&self) -> usize {
        self.players.iter().filter(|p| p.connected).count()
    }

    /// Living members, in join order.
    pub fn survivors(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| p.is_alive())
    }

    /// Enough members to play. A running room stays startable.
    pub fn is_startable(&self, min_players: usize) -> bool {
        self.players.len() >= min_players
    }

    pub fn view(&self) -> RoomView {
        RoomView {
            room_id: self.id.clone(),
            players: self.players.iter().map(Player::view).collect(),
            phase: self.phase,
        }
    }
}
