//! Connection registry: which user id is reachable on which session.

use dashmap::DashMap;
use tracing::debug;

use crate::session::SessionId;

/// Forward map from user id to session id for one relay instance.
///
/// Registration is an upsert: a user authenticating from a second connection
/// silently takes over the mapping, and the displaced session stays connected
/// but is no longer a direct-message target. Removal on teardown goes by
/// session id, so it scans values rather than keys.
#[derive(Debug, Default)]
pub struct Registry {
    users: DashMap<String, SessionId>,
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user id as reachable on the given session.
    ///
    /// Returns the session previously registered under this id, if any.
    pub fn insert(&self, user_id: impl Into<String>, session: SessionId) -> Option<SessionId> {
        let user_id = user_id.into();
        let displaced = self.users.insert(user_id.clone(), session);
        debug!(user = %user_id, "Registered direct target");
        displaced
    }

    /// Look up the session currently registered for a user id.
    #[must_use]
    pub fn resolve(&self, user_id: &str) -> Option<SessionId> {
        self.users.get(user_id).map(|entry| entry.value().clone())
    }

    /// Whether a user id is currently registered.
    #[must_use]
    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    /// Remove whichever entry still points at the given session.
    ///
    /// Returns the user id that was deregistered, if one was. An entry that
    /// has since been overwritten by a newer session is left untouched, which
    /// keeps a takeover mapping alive when the displaced connection finally
    /// drops.
    pub fn remove_session(&self, session: &SessionId) -> Option<String> {
        let user_id = self
            .users
            .iter()
            .find(|entry| entry.value() == session)
            .map(|entry| entry.key().clone())?;
        let removed = self
            .users
            .remove_if(&user_id, |_, current| current == session)
            .map(|(user_id, _)| user_id);
        if let Some(ref user_id) = removed {
            debug!(user = %user_id, "Deregistered direct target");
        }
        removed
    }

    /// Number of registered user ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user ids are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_resolve() {
        let registry = Registry::new();
        let session = SessionId::generate();
        assert!(registry.insert("u1", session.clone()).is_none());
        assert_eq!(registry.resolve("u1"), Some(session));
        assert!(registry.resolve("u2").is_none());
    }

    #[test]
    fn reinsert_overwrites_and_returns_displaced() {
        let registry = Registry::new();
        let first = SessionId::generate();
        let second = SessionId::generate();
        registry.insert("u1", first.clone());
        let displaced = registry.insert("u1", second.clone());
        assert_eq!(displaced, Some(first));
        assert_eq!(registry.resolve("u1"), Some(second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn remove_session_deregisters_matching_entry() {
        let registry = Registry::new();
        let session = SessionId::generate();
        registry.insert("u1", session.clone());
        assert_eq!(registry.remove_session(&session), Some("u1".to_string()));
        assert!(registry.resolve("u1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_session_spares_overwritten_entry() {
        let registry = Registry::new();
        let stale = SessionId::generate();
        let fresh = SessionId::generate();
        registry.insert("u1", stale.clone());
        registry.insert("u1", fresh.clone());
        // The displaced connection tearing down must not evict the takeover.
        assert!(registry.remove_session(&stale).is_none());
        assert_eq!(registry.resolve("u1"), Some(fresh));
    }

    #[test]
    fn remove_session_ignores_unknown_session() {
        let registry = Registry::new();
        registry.insert("u1", SessionId::generate());
        assert!(registry.remove_session(&SessionId::generate()).is_none());
        assert_eq!(registry.len(), 1);
    }
}
