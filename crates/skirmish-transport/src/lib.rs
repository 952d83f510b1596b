//! Connection plumbing for Skirmish.
//!
//! The game core never touches sockets. It only sees a [`ConnectionId`],
//! an opaque handle that names "whoever is on the other end of this
//! pipe". This crate owns that handle and the traits the server uses to
//! move frames in and out:
//!
//! - [`Transport`] accepts new connections.
//! - [`Connection`] sends and receives whole frames.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;
use std::net::SocketAddr;

/// Opaque identifier for one client connection.
///
/// Allocated by the transport when a connection is accepted and never
/// reused for the lifetime of the process, so it is safe to use as a
/// map key long after the socket is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id. Transports allocate these; tests fabricate them.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for the next client and completes its upgrade.
    async fn accept(&mut self) -> Result<Self::Connection, TransportError>;

    /// Address the listener is bound to (useful when binding port 0).
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}

/// A single client connection that carries whole frames.
///
/// Implementations must allow `send` and `recv` to run at the same time
/// from different tasks: the server reads requests on one task while a
/// writer task pushes room events to the same client.
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame. UTF-8 payloads go out as text frames.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Receives the next frame.
    ///
    /// Returns `Ok(None)` once the peer has closed the connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Starts a clean close handshake.
    async fn close(&self) -> Result<(), TransportError>;

    /// The handle the game core uses to refer to this client.
    fn id(&self) -> ConnectionId;

    /// Remote address, when the transport knows it.
    fn peer_addr(&self) -> Option<SocketAddr>;
}
