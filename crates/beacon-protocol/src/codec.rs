//! JSON codec for event envelopes.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Upper bound on one encoded event. The transport caps frames at the same
/// value, so anything larger never reaches the parser from a well-behaved
/// peer.
pub const MAX_EVENT_SIZE: usize = 64 * 1024;

/// Codec failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Inbound text exceeded the event size limit.
    #[error("event too large: {size} bytes exceeds maximum {max}")]
    EventTooLarge { size: usize, max: usize },

    /// Event could not be serialized.
    #[error("failed to encode event")]
    Encode(#[source] serde_json::Error),

    /// Inbound text was not a well-formed envelope of a known event.
    #[error("malformed event")]
    Malformed(#[source] serde_json::Error),
}

/// Encode an event into its JSON wire form.
pub fn encode<T: Serialize>(event: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(ProtocolError::Encode)
}

/// Decode one inbound text frame into a typed event.
///
/// Oversized input is rejected before it touches the parser. Anything that
/// is not the `{"event": ..., "data": ...}` envelope of a known event comes
/// back as [`ProtocolError::Malformed`].
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    if text.len() > MAX_EVENT_SIZE {
        return Err(ProtocolError::EventTooLarge {
            size: text.len(),
            max: MAX_EVENT_SIZE,
        });
    }
    serde_json::from_str(text).map_err(ProtocolError::Malformed)
}
