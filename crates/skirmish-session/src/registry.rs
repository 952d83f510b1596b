//! The player registry: which connection goes by which name.
//!
//! # Concurrency note
//!
//! `PlayerRegistry` is a plain pair of `HashMap`s with no locking of its
//! own. The server keeps one instance behind a mutex and only holds that
//! lock for the map operation itself, never across a room call.

use std::collections::HashMap;

use skirmish_protocol::RoomId;
use skirmish_transport::ConnectionId;

use crate::{Identity, SessionError};

/// Maps connections to uniquely named player identities.
///
/// ## Lifecycle
///
/// ```text
/// reserve() ──→ commit() ──→ assign_room() ──→ release()
///     │
///     └──→ cancel()   (the operation that needed the name failed)
/// ```
///
/// A reserved name is held against other connections but is not yet the
/// connection's identity, so a create or join that fails can be undone
/// without touching the seat the connection already has.
///
/// Invariants, held after every call:
/// - a connection has at most one identity and at most one reservation;
/// - no two connections hold the same name, reserved or live.
#[derive(Debug, Default)]
pub struct PlayerRegistry {
    /// Identities keyed by the connection that owns them.
    identities: HashMap<ConnectionId, Identity>,

    /// Names held for an operation still in flight.
    pending: HashMap<ConnectionId, Identity>,

    /// Name ownership, covering both `identities` and `pending`.
    names: HashMap<String, ConnectionId>,
}

impl PlayerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives `connection` a fresh identity based on `display_name`.
    ///
    /// Whatever identity the connection had before is discarded, so
    /// asking again with the same name on the same connection gets that
    /// name back. If the name belongs to someone else, the smallest
    /// positive integer that makes it unique is appended: `Alice`,
    /// `Alice1`, `Alice2`, …
    ///
    /// # Errors
    /// [`SessionError::InvalidName`] if the name is blank. The previous
    /// identity is left in place in that case.
    pub fn resolve_or_create(
        &mut self,
        display_name: &str,
        connection: ConnectionId,
    ) -> Result<Identity, SessionError> {
        let identity = self.reserve(display_name, connection)?;
        self.commit(connection)?;
        Ok(identity)
    }

    /// Holds a unique name for `connection` without replacing its current
    /// identity. Names the connection already owns count as free.
    ///
    /// A reservation made earlier by the same connection is cancelled.
    ///
    /// # Errors
    /// [`SessionError::InvalidName`] if the name is blank.
    pub fn reserve(
        &mut self,
        display_name: &str,
        connection: ConnectionId,
    ) -> Result<Identity, SessionError> {
        let base = display_name.trim();
        if base.is_empty() {
            return Err(SessionError::InvalidName(display_name.to_owned()));
        }

        self.cancel(connection);

        let name = self.unique_name(base, connection);
        let identity = Identity {
            name: name.clone(),
            connection,
            room: None,
        };
        self.names.insert(name, connection);
        self.pending.insert(connection, identity.clone());

        tracing::debug!(%connection, name = %identity.name, "player name reserved");
        Ok(identity)
    }

    /// Makes the connection's reservation its identity. Returns the
    /// identity it replaces, whose name is freed unless it was reused.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if nothing is reserved, which happens
    /// when the connection was released in the meantime.
    pub fn commit(&mut self, connection: ConnectionId) -> Result<Option<Identity>, SessionError> {
        let identity = self
            .pending
            .remove(&connection)
            .ok_or(SessionError::NotFound(connection))?;
        let name = identity.name.clone();
        let previous = self.identities.insert(connection, identity);
        if let Some(previous) = &previous {
            self.free_name(&previous.name, connection);
        }

        tracing::debug!(%connection, %name, "player identity created");
        Ok(previous)
    }

    /// Drops the connection's reservation, if any. The current identity
    /// is untouched.
    pub fn cancel(&mut self, connection: ConnectionId) -> Option<Identity> {
        let identity = self.pending.remove(&connection)?;
        self.free_name(&identity.name, connection);
        Some(identity)
    }

    /// Returns the identity currently bound to `connection`.
    pub fn lookup_by_connection(
        &self,
        connection: ConnectionId,
    ) -> Option<&Identity> {
        self.identities.get(&connection)
    }

    /// Records that the connection's identity now sits in `room_id`.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the connection has no identity.
    pub fn assign_room(
        &mut self,
        connection: ConnectionId,
        room_id: RoomId,
    ) -> Result<(), SessionError> {
        let identity = self
            .identities
            .get_mut(&connection)
            .ok_or(SessionError::NotFound(connection))?;
        identity.room = Some(room_id);
        Ok(())
    }

    /// Drops the connection's identity and any reservation, freeing their
    /// names.
    ///
    /// Idempotent: returns the released identity the first time and
    /// `None` afterwards.
    pub fn release(&mut self, connection: ConnectionId) -> Option<Identity> {
        self.cancel(connection);
        let identity = self.identities.remove(&connection)?;
        self.free_name(&identity.name, connection);
        tracing::debug!(%connection, name = %identity.name, "player identity released");
        Some(identity)
    }

    /// `true` if a live identity or a reservation uses `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of live identities.
    pub fn len(&self) -> usize {
        self.identities.len()
    }

    /// `true` when no connection has an identity.
    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    /// Linear probe from 1 upward; deterministic for a given set of names.
    fn unique_name(&self, base: &str, connection: ConnectionId) -> String {
        let free = |name: &str| self.names.get(name).is_none_or(|owner| *owner == connection);
        if free(base) {
            return base.to_owned();
        }
        let mut suffix: u64 = 1;
        loop {
            let candidate = format!("{base}{suffix}");
            if free(&candidate) {
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Gives `name` up unless `connection` still uses it.
    fn free_name(&mut self, name: &str, connection: ConnectionId) {
        let uses = |identity: Option<&Identity>| identity.is_some_and(|i| i.name == name);
        if uses(self.identities.get(&connection)) || uses(self.pending.get(&connection)) {
            return;
        }
        if self.names.get(name) == Some(&connection) {
            self.names.remove(name);
        }
    }
}
