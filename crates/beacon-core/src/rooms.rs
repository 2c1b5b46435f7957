//! Room membership for one relay instance.

use std::collections::HashSet;

use dashmap::DashMap;
use tracing::debug;

use crate::session::SessionId;

/// Room name → member sessions.
///
/// Rooms have no existence of their own: one is created the moment a first
/// session joins it and pruned the moment its last member leaves or drops.
/// Any client-chosen string names a room; two namespaces never share a table.
#[derive(Debug, Default)]
pub struct RoomTable {
    rooms: DashMap<String, HashSet<SessionId>>,
}

impl RoomTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session to a room, creating the room on first join.
    ///
    /// Returns `true` if the session was not already a member.
    pub fn join(&self, room: impl Into<String>, session: SessionId) -> bool {
        let room = room.into();
        let mut members = self.rooms.entry(room.clone()).or_default();
        let added = members.insert(session);
        if added {
            debug!(room = %room, members = members.len(), "Session joined room");
        }
        added
    }

    /// Remove a session from a room, pruning the room if it empties.
    ///
    /// Returns `true` if the session was a member.
    pub fn leave(&self, room: &str, session: &SessionId) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => {
                let removed = members.remove(session);
                let emptied = members.is_empty();
                drop(members);
                if emptied {
                    // Re-checked under the entry lock: a join may have raced in.
                    self.rooms.remove_if(room, |_, members| members.is_empty());
                }
                removed
            }
            None => false,
        };
        if removed {
            debug!(room = %room, "Session left room");
        }
        removed
    }

    /// Sweep a session out of every room it joined, pruning rooms that empty.
    pub fn remove_session(&self, session: &SessionId) {
        self.rooms.retain(|_, members| {
            members.remove(session);
            !members.is_empty()
        });
    }

    /// Whether a room currently exists, meaning it has at least one member.
    #[must_use]
    pub fn contains(&self, room: &str) -> bool {
        self.rooms.contains_key(room)
    }

    /// Whether a session is currently a member of a room.
    #[must_use]
    pub fn is_member(&self, room: &str, session: &SessionId) -> bool {
        self.rooms
            .get(room)
            .is_some_and(|members| members.contains(session))
    }

    /// Snapshot of a room's members; empty if the room does not exist.
    #[must_use]
    pub fn members(&self, room: &str) -> Vec<SessionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of live rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no rooms exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_creates_room_lazily() {
        let rooms = RoomTable::new();
        assert!(!rooms.contains("lobby"));
        let session = SessionId::generate();
        assert!(rooms.join("lobby", session.clone()));
        assert!(rooms.contains("lobby"));
        assert!(rooms.is_member("lobby", &session));
    }

    #[test]
    fn rejoin_is_a_no_op() {
        let rooms = RoomTable::new();
        let session = SessionId::generate();
        assert!(rooms.join("lobby", session.clone()));
        assert!(!rooms.join("lobby", session.clone()));
        assert_eq!(rooms.members("lobby").len(), 1);
    }

    #[test]
    fn leave_prunes_emptied_room() {
        let rooms = RoomTable::new();
        let session = SessionId::generate();
        rooms.join("lobby", session.clone());
        assert!(rooms.leave("lobby", &session));
        assert!(!rooms.contains("lobby"));
        assert!(rooms.is_empty());
    }

    #[test]
    fn leave_keeps_room_with_remaining_members() {
        let rooms = RoomTable::new();
        let a = SessionId::generate();
        let b = SessionId::generate();
        rooms.join("lobby", a.clone());
        rooms.join("lobby", b.clone());
        assert!(rooms.leave("lobby", &a));
        assert!(rooms.contains("lobby"));
        assert_eq!(rooms.members("lobby"), vec![b]);
    }

    #[test]
    fn leave_unknown_room_or_non_member_returns_false() {
        let rooms = RoomTable::new();
        let session = SessionId::generate();
        assert!(!rooms.leave("lobby", &session));
        rooms.join("lobby", SessionId::generate());
        assert!(!rooms.leave("lobby", &session));
    }

    #[test]
    fn join_then_leave_restores_prior_state() {
        let rooms = RoomTable::new();
        let resident = SessionId::generate();
        let visitor = SessionId::generate();
        rooms.join("lobby", resident.clone());

        rooms.join("lobby", visitor.clone());
        rooms.leave("lobby", &visitor);

        assert_eq!(rooms.members("lobby"), vec![resident]);
        assert_eq!(rooms.len(), 1);
    }

    #[test]
    fn remove_session_sweeps_every_room() {
        let rooms = RoomTable::new();
        let session = SessionId::generate();
        let other = SessionId::generate();
        rooms.join("a", session.clone());
        rooms.join("b", session.clone());
        rooms.join("b", other.clone());

        rooms.remove_session(&session);

        assert!(!rooms.contains("a"));
        assert!(rooms.contains("b"));
        assert_eq!(rooms.members("b"), vec![other]);
    }
}
