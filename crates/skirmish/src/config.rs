//! Server configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use skirmish_room::{DisconnectPolicy, RoomConfig};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything the server binary needs to start.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// `SKIRMISH_BIND_ADDR`
    pub bind_addr: SocketAddr,
    /// `SKIRMISH_LOG`, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// `SKIRMISH_IDLE_TIMEOUT_SECS`. A connection silent for this long is
    /// dropped.
    pub idle_timeout: Duration,
    /// Room rules. `SKIRMISH_MAX_PLAYERS`, `SKIRMISH_STARTING_HP`,
    /// `SKIRMISH_DISCONNECT_POLICY`, `SKIRMISH_SEED`.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_level: "info".to_string(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which returns the value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = RoomConfig::default();

        let bind_addr = lookup("SKIRMISH_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidAddress(bind_addr))?;

        let room = RoomConfig {
            max_players: parsed(&lookup, "SKIRMISH_MAX_PLAYERS")?.unwrap_or(defaults.max_players),
            starting_hp: parsed(&lookup, "SKIRMISH_STARTING_HP")?.unwrap_or(defaults.starting_hp),
            disconnect_policy: parsed::<DisconnectPolicy>(&lookup, "SKIRMISH_DISCONNECT_POLICY")?
                .unwrap_or(defaults.disconnect_policy),
            seed: parsed(&lookup, "SKIRMISH_SEED")?,
            ..defaults
        };

        Ok(Self {
            bind_addr,
            log_level: lookup("SKIRMISH_LOG").unwrap_or_else(|| "info".to_string()),
            idle_timeout: parsed(&lookup, "SKIRMISH_IDLE_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_IDLE_TIMEOUT),
            room: room.validated(),
        })
    }
}

/// Parses `key` if it is set and not blank.
fn parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { key, value }),
        _ => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format: {0:?}")]
    InvalidAddress(String),

    #[error("Invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
