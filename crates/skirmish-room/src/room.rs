//! Room actor: an isolated Tokio task that owns one room.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Join, start, submit, and disconnect are all
//! commands on that channel, so a submission, the readiness check it
//! triggers, and the resolution that may follow happen in one actor turn
//! with nothing interleaved.

use std::collections::HashMap;

use skirmish_protocol::{RoomId, RoomPhase, RoomView, ServerEvent, SubmittedAction};
use tokio::sync::{mpsc, oneshot};

use crate::resolver::resolve_round;
use crate::{Dice, Player, RejectReason, Room, RoomConfig, RoomError, RoundBarrier, RoundOutcome};

/// Channel sender for delivering events to one player's connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Result of handing an action to a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Queued. `outcome` is set when this action completed the round.
    Accepted { outcome: Option<RoundOutcome> },
    Rejected(RejectReason),
}

impl Submission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// `true` when this submission ended the game.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Accepted { outcome: Some(o) } if o.is_final())
    }
}

/// Result of marking a member disconnected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// Nobody by that name sits in the room.
    NotMember,
    Left {
        /// Set when the departure let a pending round resolve.
        resolved: Option<RoundOutcome>,
        /// No connected member remains.
        abandoned: bool,
    },
}

impl Departure {
    /// `true` when the room has no reason to keep running.
    pub fn closes_room(&self) -> bool {
        match self {
            Self::NotMember => false,
            Self::Left { resolved, abandoned } => {
                *abandoned || resolved.as_ref().is_some_and(RoundOutcome::is_final)
            }
        }
    }
}

/// Commands sent to a room actor through its channel.
///
/// Each carries a oneshot reply channel; the caller sends the command and
/// waits for the answer.
pub(crate) enum RoomCommand {
    Join {
        player: Player,
        subscriber: EventSender,
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },

    Start {
        reply: oneshot::Sender<Result<RoomView, RoomError>>,
    },

    Submit {
        action: SubmittedAction,
        reply: oneshot::Sender<Submission>,
    },

    Disconnect {
        name: String,
        reply: oneshot::Sender<Departure>,
    },

    Snapshot {
        reply: oneshot::Sender<RoomView>,
    },

    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone: an `mpsc::Sender` plus the room's identity. The
/// registry stores one per room and clones it out for every call.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    generation: u64,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Distinguishes this room from an earlier or later room that used
    /// the same code.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats `player`; on success `subscriber` receives the room's events.
    pub async fn join(
        &self,
        player: Player,
        subscriber: EventSender,
    ) -> Result<RoomView, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RoomCommand::Join {
                player,
                subscriber,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Moves the room out of the lobby.
    pub async fn start(&self) -> Result<RoomView, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Start { reply }, rx).await?
    }

    /// Queues an action; a stopped room rejects with [`RejectReason::RoomGone`].
    pub async fn submit(&self, action: SubmittedAction) -> Submission {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Submit { action, reply }, rx)
            .await
            .unwrap_or(Submission::Rejected(RejectReason::RoomGone))
    }

    /// Marks `name` disconnected. Membership and HP are kept.
    pub async fn disconnect(&self, name: impl Into<String>) -> Result<Departure, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RoomCommand::Disconnect {
                name: name.into(),
                reply,
            },
            rx,
        )
        .await
    }

    pub async fn snapshot(&self) -> Result<RoomView, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Snapshot { reply }, rx).await
    }

    /// Tells the room to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }

    async fn request<T>(
        &self,
        command: RoomCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        rx.await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    barrier: RoundBarrier,
    config: RoomConfig,
    dice: Box<dyn Dice>,
    /// Per-player outbound channels, by player name.
    subscribers: HashMap<String, EventSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or the end of the game.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room.id(), "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    player,
                    subscriber,
                    reply,
                } => {
                    let result = self.handle_join(player, subscriber);
                    let _ = reply.send(result);
                }
                RoomCommand::Start { reply } => {
                    let result = self.handle_start();
                    let _ = reply.send(result);
                }
                RoomCommand::Submit { action, reply } => {
                    let submission = self.handle_submit(action);
                    let finished = submission.is_final();
                    let _ = reply.send(submission);
                    if finished {
                        break;
                    }
                }
                RoomCommand::Disconnect { name, reply } => {
                    let departure = self.handle_disconnect(&name);
                    let closes = departure.closes_room();
                    let _ = reply.send(departure);
                    if closes {
                        break;
                    }
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.room.view());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room.id(), "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room.id(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        mut player: Player,
        subscriber: EventSender,
    ) -> Result<RoomView, RoomError> {
        player.hp = self.config.starting_hp;
        player.connected = true;
        let name = player.name.clone();
        self.room.add(player, self.config.max_players)?;
        self.subscribers.insert(name.clone(), subscriber);

        tracing::info!(
            room_id = %self.room.id(),
            player = %name,
            players = self.room.len(),
            "player joined"
        );

        let view = self.room.view();
        self.broadcast(ServerEvent::PlayerJoinedRoom {
            room_id: self.room.id().clone(),
        });
        self.broadcast(ServerEvent::RoomInfoUpdated { room: view.clone() });
        Ok(view)
    }

    fn handle_start(&mut self) -> Result<RoomView, RoomError> {
        if !self.room.phase().is_open() {
            return Err(RoomError::Ended(self.room.id().clone()));
        }
        if !self.room.is_startable(self.config.min_players) {
            return Err(RoomError::NotStartable {
                room_id: self.room.id().clone(),
                players: self.room.len(),
            });
        }

        if self.room.phase() == RoomPhase::Lobby {
            self.room.set_phase(RoomPhase::Simultaneous);
            tracing::info!(
                room_id = %self.room.id(),
                players = self.room.len(),
                "game started"
            );
        } else {
            tracing::debug!(
                room_id = %self.room.id(),
                pending = self.barrier.pending(),
                "round announced again"
            );
        }

        let view = self.room.view();
        self.broadcast(ServerEvent::StartRound { room: view.clone() });
        Ok(view)
    }

    fn handle_submit(&mut self, action: SubmittedAction) -> Submission {
        if !self.room.phase().is_open() || action.room_id != *self.room.id() {
            return Submission::Rejected(RejectReason::RoomGone);
        }
        let actor = action.actor.clone();
        if let Err(reason) = self.barrier.submit(&self.room, action) {
            tracing::debug!(room_id = %self.room.id(), %actor, %reason, "action rejected");
            return Submission::Rejected(reason);
        }
        tracing::debug!(
            room_id = %self.room.id(),
            %actor,
            pending = self.barrier.pending(),
            "action queued"
        );

        let outcome = self.resolve_if_ready();
        Submission::Accepted { outcome }
    }

    fn handle_disconnect(&mut self, name: &str) -> Departure {
        let Some(player) = self.room.player_mut(name) else {
            return Departure::NotMember;
        };
        player.connected = false;
        self.subscribers.remove(name);

        let abandoned = self.room.connected_count() == 0;
        tracing::info!(
            room_id = %self.room.id(),
            player = %name,
            abandoned,
            "player disconnected"
        );
        if abandoned {
            return Departure::Left {
                resolved: None,
                abandoned,
            };
        }

        // The readiness count may have just dropped to what is already queued.
        let resolved = if self.room.phase().is_open() {
            self.resolve_if_ready()
        } else {
            None
        };
        Departure::Left { resolved, abandoned }
    }

    /// Resolves the round if the barrier is full, broadcasting the result.
    fn resolve_if_ready(&mut self) -> Option<RoundOutcome> {
        let policy = self.config.disconnect_policy;
        if !self.barrier.is_ready(&self.room, policy) {
            return None;
        }

        let actions = self.barrier.close(&self.room, policy);
        let report = resolve_round(&mut self.room, actions, &self.config, self.dice.as_mut());
        tracing::info!(
            room_id = %self.room.id(),
            hits = report.hits.len(),
            alive = self.room.alive_count(),
            "round resolved"
        );

        self.broadcast(ServerEvent::PastRoundInfo { log: report.log });
        match &report.outcome {
            RoundOutcome::Continue => {
                self.broadcast(ServerEvent::StartRound {
                    room: self.room.view(),
                });
            }
            RoundOutcome::Winner(player) => {
                tracing::info!(room_id = %self.room.id(), winner = %player.name, "game won");
                self.broadcast(ServerEvent::Winner {
                    player: player.clone(),
                });
            }
            RoundOutcome::Draw => {
                tracing::info!(room_id = %self.room.id(), "game drawn");
                self.broadcast(ServerEvent::Draw {
                    room_id: self.room.id().clone(),
                });
            }
        }
        Some(report.outcome)
    }

    /// Sends `event` to every subscriber. Closed channels are skipped.
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.subscribers.values() {
            let _ = sender.send(event.clone());
        }
    }
}

/// Spawns a room actor holding only `founder` and returns its handle.
///
/// `config.channel_size` bounds the command queue; when it fills,
/// callers wait.
pub(crate) fn spawn_room(
    room_id: RoomId,
    generation: u64,
    mut founder: Player,
    subscriber: EventSender,
    config: RoomConfig,
    dice: Box<dyn Dice>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    founder.hp = config.starting_hp;
    founder.connected = true;
    let mut subscribers = HashMap::new();
    subscribers.insert(founder.name.clone(), subscriber);

    let actor = RoomActor {
        room: Room::new(room_id.clone(), founder),
        barrier: RoundBarrier::new(),
        config,
        dice,
        subscribers,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        generation,
        sender: tx,
    }
}
