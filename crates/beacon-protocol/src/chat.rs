//! Chat namespace events.
//!
//! Every event travels as a JSON envelope of the form
//! `{"event": "<name>", "data": <payload>}`. Event and field names are part
//! of the wire contract and use the camelCase spellings clients expect, so
//! the Rust-side names are mapped through serde renames.

use serde::{Deserialize, Serialize};

/// Events a chat client sends to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ChatClientEvent {
    /// Join a named room, creating it on first use.
    #[serde(rename = "joinRoom")]
    JoinRoom(String),

    /// Publish a message to every member of a room.
    #[serde(rename = "message")]
    Message { room: String, message: String },

    /// Deliver a message directly to one registered user.
    #[serde(rename = "privateMessage")]
    PrivateMessage {
        #[serde(rename = "toUserId")]
        to_user_id: String,
        message: String,
    },
}

impl ChatClientEvent {
    /// Wire name of this event, for logs and counters.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "joinRoom",
            Self::Message { .. } => "message",
            Self::PrivateMessage { .. } => "privateMessage",
        }
    }
}

/// Events the server sends to chat clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ChatServerEvent {
    /// A room message fanned out to the room's members, sender included.
    /// `user` is the sender's verified username.
    #[serde(rename = "message")]
    Message { user: String, message: String },

    /// A direct message delivered to its target. `fromUserId` echoes the
    /// sender's handshake user id and is omitted when none was supplied.
    #[serde(rename = "privateMessage")]
    PrivateMessage {
        message: String,
        #[serde(rename = "fromUserId", skip_serializing_if = "Option::is_none")]
        from_user_id: Option<String>,
    },

    /// A delivery failure reported back to the sender.
    #[serde(rename = "error")]
    Error { message: String },
}

impl ChatServerEvent {
    /// Build a room message as seen by recipients.
    pub fn message(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Message {
            user: user.into(),
            message: message.into(),
        }
    }

    /// Build a direct message as seen by its target.
    pub fn private_message(message: impl Into<String>, from_user_id: Option<String>) -> Self {
        Self::PrivateMessage {
            message: message.into(),
            from_user_id,
        }
    }

    /// Build an error report for the sender.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
