//! One relay instance: session lifecycle, direct delivery, room fan-out.

use dashmap::DashMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::registry::Registry;
use crate::rooms::RoomTable;
use crate::session::{FrameSender, Identity, Peer, SessionId};

/// Delivery failures surfaced to event routers. Whether a failure is reported
/// back to the sender or dropped on the floor is the router's call, not ours.
#[derive(Debug, Error)]
pub enum RelayError {
    /// No session is registered for the target user id.
    #[error("user {0} is not connected")]
    UserOffline(String),

    /// The target session is gone or its outbound queue has closed.
    #[error("session {0} is closed")]
    SessionClosed(SessionId),
}

/// Point-in-time counters for one relay instance.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RelayStats {
    /// Open sessions.
    pub sessions: usize,
    /// User ids registered as direct-message targets.
    pub registered_users: usize,
    /// Rooms with at least one member.
    pub rooms: usize,
}

/// A presence-and-relay instance.
///
/// Owns the session table (session id → peer handle), the connection
/// registry (user id → session id), and the room membership table. Each
/// namespace runs its own `Relay`; nothing here is shared across namespaces.
///
/// All operations are lock-free reads and short per-entry locked writes, so
/// routers call them synchronously from connection tasks.
#[derive(Debug, Default)]
pub struct Relay {
    sessions: DashMap<SessionId, Peer>,
    registry: Registry,
    rooms: RoomTable,
}

impl Relay {
    /// Create an empty relay.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit an authenticated connection and return its session id.
    ///
    /// The peer lands in the session table first, then the registry is
    /// upserted when the verified identity carries a non-empty user id. A
    /// repeat registration overwrites the old mapping and leaves the
    /// displaced session connected.
    pub fn connect(
        &self,
        identity: Identity,
        handshake_user_id: Option<String>,
        sender: FrameSender,
    ) -> SessionId {
        let session = SessionId::generate();
        let user_id = identity.is_registrable().then(|| identity.id.clone());
        self.sessions.insert(
            session.clone(),
            Peer::new(identity, handshake_user_id, sender),
        );
        if let Some(user_id) = user_id {
            if let Some(displaced) = self.registry.insert(&user_id, session.clone()) {
                debug!(user = %user_id, old_session = %displaced, "Direct target re-registered");
            }
        }
        debug!(session = %session, "Session connected");
        session
    }

    /// Tear a session down: drop the peer handle, deregister the direct
    /// target if it still points here, and sweep room membership.
    ///
    /// Idempotent; a second call for the same id does nothing.
    pub fn disconnect(&self, session: &SessionId) {
        if self.sessions.remove(session).is_none() {
            return;
        }
        self.registry.remove_session(session);
        self.rooms.remove_session(session);
        debug!(session = %session, "Session disconnected");
    }

    /// The peer handle for a session, if it is still open.
    #[must_use]
    pub fn peer(&self, session: &SessionId) -> Option<Peer> {
        self.sessions.get(session).map(|entry| entry.value().clone())
    }

    /// Resolve a user id to its registered session.
    #[must_use]
    pub fn resolve(&self, user_id: &str) -> Option<SessionId> {
        self.registry.resolve(user_id)
    }

    /// Queue one encoded frame for a session.
    pub fn send_to_session(&self, session: &SessionId, frame: String) -> Result<(), RelayError> {
        let peer = self
            .sessions
            .get(session)
            .ok_or_else(|| RelayError::SessionClosed(session.clone()))?;
        peer.sender
            .send(frame)
            .map_err(|_| RelayError::SessionClosed(session.clone()))
    }

    /// Queue one encoded frame for the session registered under a user id.
    pub fn send_to_user(&self, user_id: &str, frame: String) -> Result<(), RelayError> {
        let session = self
            .registry
            .resolve(user_id)
            .ok_or_else(|| RelayError::UserOffline(user_id.to_string()))?;
        self.send_to_session(&session, frame)
    }

    /// Fan one encoded frame out to a room's members, optionally skipping one
    /// session. Returns how many sessions the frame was queued for; an
    /// unknown room fans out to nobody.
    pub fn broadcast_to_room(
        &self,
        room: &str,
        frame: &str,
        exclude: Option<&SessionId>,
    ) -> usize {
        let mut delivered = 0;
        for member in self.rooms.members(room) {
            if exclude == Some(&member) {
                continue;
            }
            if let Some(peer) = self.sessions.get(&member) {
                if peer.sender.send(frame.to_string()).is_ok() {
                    delivered += 1;
                }
            }
        }
        trace!(room = %room, recipients = delivered, "Room fan-out");
        delivered
    }

    /// The room membership table.
    #[must_use]
    pub fn rooms(&self) -> &RoomTable {
        &self.rooms
    }

    /// The connection registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Number of open sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Current table sizes, for diagnostics endpoints and gauges.
    #[must_use]
    pub fn stats(&self) -> RelayStats {
        RelayStats {
            sessions: self.sessions.len(),
            registered_users: self.registry.len(),
            rooms: self.rooms.len(),
        }
    }
}
