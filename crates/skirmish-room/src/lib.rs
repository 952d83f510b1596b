//! Rooms and combat for Skirmish.
//!
//! Each room runs as an isolated Tokio task (actor model) that owns its
//! members, its round barrier, and its dice. The [`RoomRegistry`] maps
//! room codes to actor handles.
//!
//! # Key types
//!
//! - [`RoomRegistry`]: creates rooms, routes joins, starts, and actions
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoundBarrier`]: one action per living player per round
//! - [`resolve_round`]: defends, then attacks, then the verdict
//! - [`Dice`]: injected randomness ([`RngDice`], [`FixedDice`])
//! - [`RoomConfig`]: player limits, HP, roll ranges, disconnect policy

mod config;
mod dice;
mod error;
mod registry;
mod resolver;
mod room;
mod round;
mod state;

pub use config::{DisconnectPolicy, MAX_ROOM_CAPACITY, RoomConfig};
pub use dice::{Dice, FixedDice, RngDice};
pub use error::{RoomConfigError, RoomError};
pub use registry::{DiceFactory, RoomRegistry};
pub use resolver::{Hit, RoundOutcome, RoundReport, resolve_round};
pub use room::{Departure, EventSender, RoomHandle, Submission};
pub use round::{MIN_ALIVE, RejectReason, RoundActions, RoundBarrier};
pub use state::{DEFAULT_STARTING_HP, Player, Room};
