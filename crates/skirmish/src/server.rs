//! `SkirmishServer` builder and server loop.
//!
//! This is the entry point for running a Skirmish server. It ties
//! together all the layers: transport → protocol → controller → rooms.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use skirmish_protocol::{Codec, JsonCodec};
use skirmish_room::{DiceFactory, RoomConfig, RoomRegistry};
use skirmish_transport::{Transport, WebSocketTransport};

use crate::config::{DEFAULT_BIND_ADDR, DEFAULT_IDLE_TIMEOUT};
use crate::handler::handle_connection;
use crate::{RoomController, ServerConfig, SkirmishError};

/// Shared server state passed to each connection handler task.
///
/// Wrapped in `Arc` so it can be cheaply cloned across tasks.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) controller: RoomController,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
    pub(crate) started: Instant,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server started.
    pub(crate) fn server_time(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,no_run
/// use skirmish::prelude::*;
///
/// # async fn start() -> Result<(), SkirmishError> {
/// let server = SkirmishServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct SkirmishServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
    idle_timeout: Duration,
    dice: Option<DiceFactory>,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            room_config: RoomConfig::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            dice: None,
        }
    }

    /// Starts from an environment-loaded [`ServerConfig`].
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new()
            .bind(&config.bind_addr.to_string())
            .room_config(config.room.clone())
            .idle_timeout(config.idle_timeout)
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the rules every room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Drops connections that send nothing for this long.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Replaces the dice every room rolls with.
    pub fn dice(mut self, dice: DiceFactory) -> Self {
        self.dice = Some(dice);
        self
    }

    /// Binds the listener.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<SkirmishServer<JsonCodec>, SkirmishError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let rooms = match self.dice {
            Some(dice) => RoomRegistry::with_dice(self.room_config, dice),
            None => RoomRegistry::new(self.room_config),
        };
        let state = Arc::new(ServerState {
            controller: RoomController::with_rooms(rooms),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
            started: Instant::now(),
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct SkirmishServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl SkirmishServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }
}

impl<C: Codec> SkirmishServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, SkirmishError> {
        Ok(self.transport.local_addr()?)
    }

    /// Runs the server accept loop.
    ///
    /// Spawns a handler task for each accepted connection. Runs until
    /// the task is cancelled.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Skirmish server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
