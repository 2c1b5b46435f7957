//! Signaling namespace events.
//!
//! Same `{"event", "data"}` envelope as the chat namespace. Session
//! descriptions and ICE candidates are opaque to the relay: they are carried
//! as raw JSON values and never inspected, so any shape a client pair agrees
//! on passes through unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Events a signaling client sends to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SignalClientEvent {
    /// Offer a session description to one registered user.
    #[serde(rename = "offer")]
    Offer {
        #[serde(rename = "toUserId")]
        to_user_id: String,
        offer: Value,
    },

    /// Answer a session description from one registered user.
    #[serde(rename = "answer")]
    Answer {
        #[serde(rename = "toUserId")]
        to_user_id: String,
        answer: Value,
    },

    /// Trickle an ICE candidate to one registered user.
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        #[serde(rename = "toUserId")]
        to_user_id: String,
        candidate: Value,
    },

    /// Offer a session description to every peer in a room.
    #[serde(rename = "room-offer")]
    RoomOffer { room: String, offer: Value },

    /// Answer toward every peer in a room.
    #[serde(rename = "room-answer")]
    RoomAnswer { room: String, answer: Value },

    /// Trickle an ICE candidate to every peer in a room.
    #[serde(rename = "room-ice-candidate")]
    RoomIceCandidate { room: String, candidate: Value },

    /// Join a signaling room, announcing the arrival to current members.
    #[serde(rename = "joinRoom")]
    JoinRoom(String),

    /// Leave a signaling room. Departures are not announced.
    #[serde(rename = "leaveVideoRoom")]
    LeaveRoom(String),
}

impl SignalClientEvent {
    /// Wire name of this event, for logs and counters.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice-candidate",
            Self::RoomOffer { .. } => "room-offer",
            Self::RoomAnswer { .. } => "room-answer",
            Self::RoomIceCandidate { .. } => "room-ice-candidate",
            Self::JoinRoom(_) => "joinRoom",
            Self::LeaveRoom(_) => "leaveVideoRoom",
        }
    }
}

/// Events the server sends to signaling clients.
///
/// Forwarded negotiation traffic is labeled with `fromUserId`, the sender's
/// handshake user id, omitted when the sender never supplied one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum SignalServerEvent {
    /// A forwarded direct offer.
    #[serde(rename = "offer")]
    Offer {
        offer: Value,
        #[serde(rename = "fromUserId", skip_serializing_if = "Option::is_none")]
        from_user_id: Option<String>,
    },

    /// A forwarded direct answer.
    #[serde(rename = "answer")]
    Answer {
        answer: Value,
        #[serde(rename = "fromUserId", skip_serializing_if = "Option::is_none")]
        from_user_id: Option<String>,
    },

    /// A forwarded direct ICE candidate.
    #[serde(rename = "ice-candidate")]
    IceCandidate {
        candidate: Value,
        #[serde(rename = "fromUserId", skip_serializing_if = "Option::is_none")]
        from_user_id: Option<String>,
    },

    /// A forwarded room offer.
    #[serde(rename = "room-offer")]
    RoomOffer {
        room: String,
        offer: Value,
        #[serde(rename = "fromUserId", skip_serializing_if = "Option::is_none")]
        from_user_id: Option<String>,
    },

    /// A forwarded room answer.
    #[serde(rename = "room-answer")]
    RoomAnswer {
        room: String,
        answer: Value,
        #[serde(rename = "fromUserId", skip_serializing_if = "Option::is_none")]
        from_user_id: Option<String>,
    },

    /// A forwarded room ICE candidate.
    #[serde(rename = "room-ice-candidate")]
    RoomIceCandidate {
        room: String,
        candidate: Value,
        #[serde(rename = "fromUserId", skip_serializing_if = "Option::is_none")]
        from_user_id: Option<String>,
    },

    /// Arrival announcement for a room join. `userId` carries the joiner's
    /// session id, the handle peers answer direct traffic toward.
    #[serde(rename = "user-joined")]
    UserJoined {
        #[serde(rename = "userId")]
        user_id: String,
    },
}

impl SignalServerEvent {
    /// Build a forwarded direct offer.
    pub fn offer(offer: Value, from_user_id: Option<String>) -> Self {
        Self::Offer {
            offer,
            from_user_id,
        }
    }

    /// Build a forwarded direct answer.
    pub fn answer(answer: Value, from_user_id: Option<String>) -> Self {
        Self::Answer {
            answer,
            from_user_id,
        }
    }

    /// Build a forwarded direct ICE candidate.
    pub fn ice_candidate(candidate: Value, from_user_id: Option<String>) -> Self {
        Self::IceCandidate {
            candidate,
            from_user_id,
        }
    }

    /// Build a forwarded room offer.
    pub fn room_offer(room: impl Into<String>, offer: Value, from_user_id: Option<String>) -> Self {
        Self::RoomOffer {
            room: room.into(),
            offer,
            from_user_id,
        }
    }

    /// Build a forwarded room answer.
    pub fn room_answer(
        room: impl Into<String>,
        answer: Value,
        from_user_id: Option<String>,
    ) -> Self {
        Self::RoomAnswer {
            room: room.into(),
            answer,
            from_user_id,
        }
    }

    /// Build a forwarded room ICE candidate.
    pub fn room_ice_candidate(
        room: impl Into<String>,
        candidate: Value,
        from_user_id: Option<String>,
    ) -> Self {
        Self::RoomIceCandidate {
            room: room.into(),
            candidate,
            from_user_id,
        }
    }

    /// Build an arrival announcement for a room join.
    pub fn user_joined(session_id: impl Into<String>) -> Self {
        Self::UserJoined {
            user_id: session_id.into(),
        }
    }
}
