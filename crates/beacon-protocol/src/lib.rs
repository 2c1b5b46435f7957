//! # beacon-protocol
//!
//! Wire protocol for the Beacon relay: the typed events of the chat and
//! signaling namespaces and the JSON codec that moves them on and off the
//! socket.
//!
//! ## Envelope
//!
//! Every event is one WebSocket text frame holding a JSON object:
//!
//! ```json
//! {"event": "message", "data": {"room": "lobby", "message": "hi"}}
//! ```
//!
//! The two namespaces have disjoint event sets and separate enums; a frame
//! that decodes in one namespace is not expected to decode in the other.
//! Inbound frames that fail to decode are the transport's problem to drop,
//! never a parse panic.

pub mod chat;
pub mod codec;
pub mod signal;

pub use chat::{ChatClientEvent, ChatServerEvent};
pub use codec::{decode, encode, ProtocolError, MAX_EVENT_SIZE};
pub use signal::{SignalClientEvent, SignalServerEvent};
