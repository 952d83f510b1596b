//! Room rules and limits.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::RoomConfigError;

/// Hard ceiling on room size.
pub const MAX_ROOM_CAPACITY: usize = 6;

// ---------------------------------------------------------------------------
// DisconnectPolicy
// ---------------------------------------------------------------------------

/// What a round does about members whose connection dropped.
///
/// A disconnected member keeps their seat and their HP. The question is
/// whether the round waits for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisconnectPolicy {
    /// Keep waiting. A round with a living, disconnected member who has
    /// not acted never resolves.
    Wait,

    /// Stop counting living disconnected members toward the barrier and
    /// have them Defend when the round resolves.
    #[default]
    AutoDefend,
}

impl fmt::Display for DisconnectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wait => write!(f, "wait"),
            Self::AutoDefend => write!(f, "auto-defend"),
        }
    }
}

impl FromStr for DisconnectPolicy {
    type Err = RoomConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wait" => Ok(Self::Wait),
            "auto-defend" | "auto_defend" | "autodefend" => Ok(Self::AutoDefend),
            other => Err(RoomConfigError::UnknownPolicy(other.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Rules shared by every room a registry creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Members needed before the game can start. Also the number of
    /// living members a room needs for actions to be accepted.
    pub min_players: usize,

    /// Seats per room, at most [`MAX_ROOM_CAPACITY`].
    pub max_players: usize,

    /// HP every player sits down with.
    pub starting_hp: u32,

    /// Base damage of an attack, drawn uniformly.
    pub attack_roll: RangeInclusive<u32>,

    /// Defense budget of a Defend action, drawn uniformly.
    pub defense_roll: RangeInclusive<u32>,

    /// See [`DisconnectPolicy`].
    pub disconnect_policy: DisconnectPolicy,

    /// Seed for the dice. `None` draws from OS entropy; `Some` makes
    /// every game replayable.
    pub seed: Option<u64>,

    /// Command queue length of each room actor.
    pub channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: MAX_ROOM_CAPACITY,
            starting_hp: 10,
            attack_roll: 1..=3,
            defense_roll: 2..=5,
            disconnect_policy: DisconnectPolicy::default(),
            seed: None,
            channel_size: 64,
        }
    }
}

impl RoomConfig {
    /// Clamps out-of-range values so the config is safe to run with.
    ///
    /// - `min_players` at least 2 and at most [`MAX_ROOM_CAPACITY`].
    /// - `max_players` between `min_players` and [`MAX_ROOM_CAPACITY`].
    /// - `starting_hp` at least 1.
    /// - Reversed roll ranges are flipped.
    /// - `channel_size` at least 1.
    pub fn validated(mut self) -> Self {
        let min = self.min_players.clamp(2, MAX_ROOM_CAPACITY);
        if min != self.min_players {
            tracing::warn!(requested = self.min_players, min, "min_players out of range, clamping");
            self.min_players = min;
        }
        let max = self.max_players.clamp(self.min_players, MAX_ROOM_CAPACITY);
        if max != self.max_players {
            tracing::warn!(requested = self.max_players, max, "max_players out of range, clamping");
            self.max_players = max;
        }
        if self.starting_hp == 0 {
            tracing::warn!("starting_hp of 0, using 1");
            self.starting_hp = 1;
        }
        self.attack_roll = ordered(self.attack_roll);
        self.defense_roll = ordered(self.defense_roll);
        self.channel_size = self.channel_size.max(1);
        self
    }
}

fn ordered(range: RangeInclusive<u32>) -> RangeInclusive<u32> {
    let (start, end) = range.into_inner();
    if start <= end { start..=end } else { end..=start }
}
