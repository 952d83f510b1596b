//! # Skirmish
//!
//! A room-based, simultaneous-turn combat server over WebSocket.
//!
//! Players create or join named rooms of up to six, start the game, and
//! then every living player submits one action per round: attack someone
//! or defend. When the last living player has acted, the round resolves
//! in one step, everyone in the room gets the combat log, and the next
//! round starts, until one player (or nobody) is left standing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! # async fn start() -> Result<(), SkirmishError> {
//! let config = ServerConfig::from_env()?;
//! skirmish::init_tracing(&config.log_level);
//! let server = SkirmishServerBuilder::from_config(&config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod controller;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, DEFAULT_BIND_ADDR, DEFAULT_IDLE_TIMEOUT, ServerConfig};
pub use controller::RoomController;
pub use error::SkirmishError;
pub use server::{SkirmishServer, SkirmishServerBuilder};

pub use skirmish_protocol as protocol;
pub use skirmish_room as room;
pub use skirmish_session as session;
pub use skirmish_transport as transport;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, or by
/// `default_level` when `RUST_LOG` is unset or invalid.
///
/// Does nothing if a global subscriber is already installed.
pub fn init_tracing(default_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init();
}

/// Everything needed to run a server or write a client test.
pub mod prelude {
    pub use crate::{
        ConfigError, RoomController, ServerConfig, SkirmishError, SkirmishServer,
        SkirmishServerBuilder,
    };
    pub use skirmish_protocol::{
        ActionKind, ClientRequest, Codec, Envelope, JsonCodec, PlayerView, RoomId, RoomPhase,
        RoomView, ServerEvent, SubmittedAction,
    };
    pub use skirmish_room::{
        DisconnectPolicy, EventSender, FixedDice, RoomConfig, RoundOutcome, Submission,
    };
}
