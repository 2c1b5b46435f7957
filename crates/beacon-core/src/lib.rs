//! # beacon-core
//!
//! Core relay primitives for the Beacon real-time presence and signaling
//! server: session identity, the connection registry, room membership, and
//! the [`Relay`] that ties them together.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │                     Relay                      │
//! │                                                │
//! │  Sessions: session id → peer handle            │
//! │  Registry: user id    → session id             │
//! │  Rooms:    room name  → member sessions        │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! A `Relay` knows nothing about sockets or wire formats. Transports admit
//! connections with [`Relay::connect`], hand every peer an outbound frame
//! queue, and tear state down with [`Relay::disconnect`]. Routers resolve
//! targets and fan frames out through the delivery methods.
//!
//! Namespaces are isolated by construction: the chat and signaling surfaces
//! each instantiate their own `Relay`, so a registration or room in one is
//! invisible to the other.

pub mod registry;
pub mod relay;
pub mod rooms;
pub mod session;

pub use registry::Registry;
pub use relay::{Relay, RelayError, RelayStats};
pub use rooms::RoomTable;
pub use session::{FrameSender, Identity, Peer, SessionId};
