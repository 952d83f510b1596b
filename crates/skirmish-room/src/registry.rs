//! Room registry: creates, tracks, and routes to room actors.
//!
//! The map holds only handles. Every operation clones the handle out of
//! its shard and drops the shard guard before awaiting the actor, so no
//! lock is ever held across a room call and different rooms never
//! contend with each other.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use skirmish_protocol::{RoomId, RoomView, SubmittedAction};

use crate::room::spawn_room;
use crate::{
    Departure, Dice, EventSender, Player, RejectReason, RngDice, RoomConfig, RoomError,
    RoomHandle, Submission,
};

/// Builds the dice for a new room from its code and generation.
pub type DiceFactory = Arc<dyn Fn(&RoomId, u64) -> Box<dyn Dice> + Send + Sync>;

/// All active rooms.
///
/// A room stays here from [`create`](Self::create) until its game ends,
/// every member disconnects, or [`remove`](Self::remove) is called.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, RoomHandle>,

    /// Creation counter. Orders [`list_ids`](Self::list_ids) and tells a
    /// room apart from a later room reusing its code.
    next_generation: AtomicU64,

    config: RoomConfig,
    dice: DiceFactory,
}

impl RoomRegistry {
    /// A registry whose rooms roll with [`RngDice`], seeded from
    /// `config.seed` when set.
    pub fn new(config: RoomConfig) -> Self {
        let seed = config.seed;
        let dice: DiceFactory = Arc::new(move |_room: &RoomId, generation: u64| -> Box<dyn Dice> {
            match seed {
                Some(seed) => Box::new(RngDice::seeded(seed.wrapping_add(generation))),
                None => Box::new(RngDice::from_entropy()),
            }
        });
        Self::with_dice(config, dice)
    }

    /// A registry with a custom dice source for every room.
    pub fn with_dice(config: RoomConfig, dice: DiceFactory) -> Self {
        Self {
            rooms: DashMap::new(),
            next_generation: AtomicU64::new(1),
            config: config.validated(),
            dice,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Opens a lobby under `room_id` with `founder` seated.
    ///
    /// The existence check and the insert happen under the same shard
    /// entry, so two concurrent creates of one code cannot both succeed.
    pub fn create(
        &self,
        room_id: RoomId,
        founder: Player,
        subscriber: EventSender,
    ) -> Result<RoomId, RoomError> {
        if room_id.is_blank() {
            return Err(RoomError::InvalidId(room_id.0));
        }

        match self.rooms.entry(room_id.clone()) {
            Entry::Occupied(_) => Err(RoomError::AlreadyExists(room_id)),
            Entry::Vacant(slot) => {
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let dice = (self.dice)(&room_id, generation);
                let founder_name = founder.name.clone();
                let handle = spawn_room(
                    room_id.clone(),
                    generation,
                    founder,
                    subscriber,
                    self.config.clone(),
                    dice,
                );
                slot.insert(handle);
                tracing::info!(%room_id, founder = %founder_name, "room created");
                Ok(room_id)
            }
        }
    }

    /// Seats `player` in `room_id`.
    pub async fn try_join(
        &self,
        room_id: &RoomId,
        player: Player,
        subscriber: EventSender,
    ) -> Result<RoomView, RoomError> {
        let handle = self.handle(room_id).ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.join(player, subscriber).await
    }

    /// [`try_join`](Self::try_join) that only reports success.
    pub async fn join(&self, room_id: &RoomId, player: Player, subscriber: EventSender) -> bool {
        match self.try_join(room_id, player, subscriber).await {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(%room_id, error = %e, "join refused");
                false
            }
        }
    }

    /// `true` if the room exists and has enough players.
    pub async fn is_startable(&self, room_id: &RoomId) -> bool {
        self.get(room_id)
            .await
            .is_some_and(|view| view.players.len() >= self.config.min_players)
    }

    /// Opens the first round. On a room already playing, the current
    /// round is announced again and pending actions are kept.
    pub async fn start(&self, room_id: &RoomId) -> Result<RoomView, RoomError> {
        let handle = self.handle(room_id).ok_or_else(|| RoomError::NotFound(room_id.clone()))?;
        handle.start().await
    }

    /// A snapshot of the room, or `None` if it is not active.
    pub async fn get(&self, room_id: &RoomId) -> Option<RoomView> {
        let handle = self.handle(room_id)?;
        handle.snapshot().await.ok()
    }

    /// Active room codes, oldest first.
    pub fn list_ids(&self) -> Vec<RoomId> {
        let mut rooms: Vec<(u64, RoomId)> = self
            .rooms
            .iter()
            .filter(|entry| !entry.value().is_closed())
            .map(|entry| (entry.value().generation(), entry.key().clone()))
            .collect();
        rooms.sort_unstable_by_key(|(generation, _)| *generation);
        rooms.into_iter().map(|(_, id)| id).collect()
    }

    /// Routes `action` to its room. A game-ending submission removes the
    /// room before this returns.
    pub async fn submit(&self, action: SubmittedAction) -> Submission {
        let Some(handle) = self.handle(&action.room_id) else {
            return Submission::Rejected(RejectReason::RoomGone);
        };
        let submission = handle.submit(action).await;
        if submission.is_final() {
            self.retire(&handle, "game over");
        }
        submission
    }

    /// Marks `name` disconnected in `room_id`. Removes the room if that
    /// ended the game or left nobody connected.
    pub async fn disconnect(&self, room_id: &RoomId, name: &str) -> Departure {
        let Some(handle) = self.handle(room_id) else {
            return Departure::NotMember;
        };
        let departure = handle.disconnect(name).await.unwrap_or(Departure::NotMember);
        if departure.closes_room() {
            let reason = match &departure {
                Departure::Left { abandoned: true, .. } => "abandoned",
                _ => "game over",
            };
            self.retire(&handle, reason);
        }
        departure
    }

    /// Shuts the room down and forgets it. Idempotent.
    pub async fn remove(&self, room_id: &RoomId) {
        if let Some((_, handle)) = self.rooms.remove(room_id) {
            let _ = handle.shutdown().await;
            tracing::info!(%room_id, reason = "removed", "room removed");
        }
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn handle(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).map(|entry| entry.value().clone())
    }

    /// Drops the map entry if it still belongs to `handle`'s room and not
    /// to a newer room with the same code.
    fn retire(&self, handle: &RoomHandle, reason: &str) {
        let removed = self
            .rooms
            .remove_if(handle.room_id(), |_, current| current.generation() == handle.generation());
        if removed.is_some() {
            tracing::info!(room_id = %handle.room_id(), reason, "room removed");
        }
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
