//! The per-round action barrier.
//!
//! Each living player gets exactly one action per round. The barrier
//! collects them and says when the round is ready to resolve. It never
//! resolves anything itself; the room actor does that in the same turn
//! as the submission that tipped it over.

use std::fmt;
use std::mem;

use skirmish_protocol::{ActionKind, SubmittedAction};

use crate::{DisconnectPolicy, Room};

/// A round is never played with fewer living members than this.
pub const MIN_ALIVE: usize = 2;

/// Why an action was not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No such room, or it stopped accepting actions.
    RoomGone,
    NotMember,
    /// The actor has no HP left.
    Dead,
    /// The actor already has an action queued this round.
    AlreadyActed,
    /// Fewer than [`MIN_ALIVE`] members are alive.
    TooFewAlive,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::RoomGone => "room gone",
            Self::NotMember => "not a member",
            Self::Dead => "actor is dead",
            Self::AlreadyActed => "already acted this round",
            Self::TooFewAlive => "too few players alive",
        };
        f.write_str(text)
    }
}

/// The actions of one round, drained out of the barrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundActions {
    pub attacks: Vec<SubmittedAction>,
    pub defends: Vec<SubmittedAction>,
}

impl RoundActions {
    pub fn len(&self) -> usize {
        self.attacks.len() + self.defends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attacks.is_empty() && self.defends.is_empty()
    }

    pub fn has_acted(&self, actor: &str) -> bool {
        self.attacks
            .iter()
            .chain(&self.defends)
            .any(|a| a.actor == actor)
    }
}

/// Pending attacks and defends, each in submission order.
#[derive(Debug, Default)]
pub struct RoundBarrier {
    pending: RoundActions,
}

impl RoundBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `action` for the current round.
    pub fn submit(
        &mut self,
        room: &Room,
        action: SubmittedAction,
    ) -> Result<(), RejectReason> {
        let actor = room.player(&action.actor).ok_or(RejectReason::NotMember)?;
        if !actor.is_alive() {
            return Err(RejectReason::Dead);
        }
        if self.pending.has_acted(&action.actor) {
            return Err(RejectReason::AlreadyActed);
        }
        if room.alive_count() < MIN_ALIVE {
            return Err(RejectReason::TooFewAlive);
        }
        match action.kind {
            ActionKind::Attack => self.pending.attacks.push(action),
            ActionKind::Defend => self.pending.defends.push(action),
        }
        Ok(())
    }

    /// Number of queued actions.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn has_acted(&self, actor: &str) -> bool {
        self.pending.has_acted(actor)
    }

    /// Members the round is waiting on: everyone alive under
    /// [`DisconnectPolicy::Wait`], only the connected ones under
    /// [`DisconnectPolicy::AutoDefend`].
    pub fn required(room: &Room, policy: DisconnectPolicy) -> usize {
        room.players()
            .iter()
            .filter(|p| counts_toward(p.is_alive(), p.connected, policy))
            .count()
    }

    /// `true` once every required member has acted, and at least one is
    /// required.
    ///
    /// A member who acted and then disconnected still has their action
    /// queued but no longer counts as required, so readiness is checked
    /// per member rather than by comparing totals.
    pub fn is_ready(&self, room: &Room, policy: DisconnectPolicy) -> bool {
        let mut waiting_on = room
            .players()
            .iter()
            .filter(|p| counts_toward(p.is_alive(), p.connected, policy))
            .peekable();
        waiting_on.peek().is_some() && waiting_on.all(|p| self.has_acted(&p.name))
    }

    /// Drains the queues for resolution.
    ///
    /// Under [`DisconnectPolicy::AutoDefend`], every living disconnected
    /// member who has not acted gets a Defend appended, in join order.
    pub fn close(&mut self, room: &Room, policy: DisconnectPolicy) -> RoundActions {
        let mut actions = mem::take(&mut self.pending);
        if policy == DisconnectPolicy::AutoDefend {
            for absent in room.players().iter().filter(|p| p.is_alive() && !p.connected) {
                if !actions.has_acted(&absent.name) {
                    actions
                        .defends
                        .push(SubmittedAction::defend(room.id().clone(), absent.name.clone()));
                }
            }
        }
        actions
    }
}

fn counts_toward(alive: bool, connected: bool, policy: DisconnectPolicy) -> bool {
    alive && (connected || policy == DisconnectPolicy::Wait)
}
