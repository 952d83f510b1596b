//! Per-connection handler: decode requests, dispatch, stream events back.
//!
//! Each accepted connection gets its own Tokio task running this handler
//! plus a writer task. The flow is:
//!   1. Spawn the writer, which owns the outbound sequence counter and
//!      drains the connection's event channel onto the socket
//!   2. Loop: receive envelopes → dispatch to the controller
//!   3. On close, timeout, or `Disconnect`: release the player

use std::sync::Arc;

use skirmish_protocol::{ClientRequest, Codec, Envelope, ServerEvent};
use skirmish_room::EventSender;
use skirmish_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::SkirmishError;
use crate::server::ServerState;

/// Drop guard that releases the connection's player when the handler
/// exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async work.
struct DisconnectGuard<C: Codec> {
    connection: ConnectionId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for DisconnectGuard<C> {
    fn drop(&mut self) {
        let connection = self.connection;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            state.controller.on_disconnected(connection).await;
        });
    }
}

/// What the read loop should do after a request.
enum Flow {
    Continue,
    Close,
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), SkirmishError> {
    let connection = conn.id();
    let conn = Arc::new(conn);
    tracing::debug!(%connection, peer = ?conn.peer_addr(), "handling new connection");

    let (events, outbound) = mpsc::unbounded_channel();
    let writer = tokio::spawn(write_events(
        Arc::clone(&conn),
        Arc::clone(&state),
        outbound,
    ));
    let _guard = DisconnectGuard {
        connection,
        state: Arc::clone(&state),
    };

    loop {
        let data = match tokio::time::timeout(state.idle_timeout, conn.recv()).await {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                tracing::info!(%connection, "connection closed cleanly");
                break;
            }
            Ok(Err(e)) => {
                tracing::debug!(%connection, error = %e, "recv error");
                break;
            }
            Err(_) => {
                tracing::info!(%connection, "connection timed out");
                break;
            }
        };

        let envelope: Envelope<ClientRequest> = match state.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => {
                tracing::debug!(%connection, error = %e, "failed to decode envelope");
                let _ = events.send(ServerEvent::Error {
                    code: 400,
                    message: format!("invalid message: {e}"),
                });
                continue;
            }
        };

        if let Flow::Close = dispatch(&state, connection, envelope.payload, &events).await {
            break;
        }
    }

    // Room subscriptions hold clones of `events`, so the writer would
    // otherwise outlive the socket.
    writer.abort();
    let _ = conn.close().await;
    // _guard drops here → player released.
    Ok(())
}

/// Runs one request against the controller.
async fn dispatch<C: Codec>(
    state: &ServerState<C>,
    connection: ConnectionId,
    request: ClientRequest,
    events: &EventSender,
) -> Flow {
    let controller = &state.controller;
    match request {
        ClientRequest::CreateRoom {
            room_id,
            player_name,
        } => {
            let _ = controller
                .create_room(connection, room_id, &player_name, events)
                .await;
        }

        ClientRequest::JoinRoom {
            room_id,
            player_name,
        } => {
            let _ = controller
                .join_room(connection, room_id, &player_name, events)
                .await;
        }

        ClientRequest::MakeAction { action } => {
            controller.make_action(connection, action).await;
        }

        ClientRequest::StartGame { room_id } => {
            let _ = controller.start_game(&room_id, events).await;
        }

        ClientRequest::GetRoomList => {
            let _ = events.send(ServerEvent::RoomList {
                rooms: controller.room_list(),
            });
        }

        ClientRequest::Heartbeat { client_time } => {
            let _ = events.send(ServerEvent::HeartbeatAck {
                client_time,
                server_time: state.server_time(),
            });
        }

        ClientRequest::Disconnect { reason } => {
            tracing::info!(%connection, %reason, "client disconnected");
            return Flow::Close;
        }
    }
    Flow::Continue
}

/// Drains `outbound` onto the socket, one envelope per event.
///
/// Sequence numbers start at 1 and are assigned here, so they follow the
/// order the client actually receives frames in.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut outbound: mpsc::UnboundedReceiver<ServerEvent>,
) {
    let connection = conn.id();
    let mut seq: u64 = 1;

    while let Some(event) = outbound.recv().await {
        let envelope = Envelope::new(next_seq(&mut seq), state.server_time(), event);
        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%connection, error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%connection, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
