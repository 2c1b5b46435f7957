//! Session identity types shared by the relay tables.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;

/// Counter folded into generated ids so sessions accepted in the same
/// nanosecond still come out distinct.
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Transport-assigned identifier for one live connection.
///
/// Assigned when the connection is admitted and stable until teardown. Every
/// table in the relay is keyed or valued by this id, never by the socket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh session id.
    #[must_use]
    pub fn generate() -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos() as u64;
        let counter = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("sess_{timestamp:x}_{counter:x}"))
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Verified identity attached to a session when it is admitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User identifier from the verified credential. May be empty, in which
    /// case the session stays anonymous and is never a direct-message target.
    pub id: String,
    /// Display name from the verified credential.
    pub username: String,
}

impl Identity {
    /// Create an identity from credential claims.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
        }
    }

    /// Whether this identity claims a user id and can be registered as a
    /// direct-message target.
    #[must_use]
    pub fn is_registrable(&self) -> bool {
        !self.id.is_empty()
    }
}

/// Outbound queue handle for one connection. Encoded frames pushed here are
/// drained in order by the connection's writer task.
pub type FrameSender = mpsc::UnboundedSender<String>;

/// The relay's view of one live connection.
///
/// The transport layer keeps the socket; the relay only ever sees the
/// identity fixed at admission time and the outbound queue.
#[derive(Debug, Clone)]
pub struct Peer {
    /// Verified identity attached at admission.
    pub identity: Identity,
    /// Unverified user id echoed from the handshake query string. Relayed
    /// as-is where the protocol labels forwarded traffic with its origin.
    pub handshake_user_id: Option<String>,
    /// Outbound frame queue feeding the connection's writer task.
    pub sender: FrameSender,
}

impl Peer {
    /// Create a peer handle for a newly admitted connection.
    #[must_use]
    pub fn new(identity: Identity, handshake_user_id: Option<String>, sender: FrameSender) -> Self {
        Self {
            identity,
            handshake_user_id,
            sender,
        }
    }
}
