//! Chat namespace: rooms, room messages, direct messages.

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use beacon_core::Relay;
use beacon_protocol::{codec, ChatClientEvent, ChatServerEvent};
use tracing::{debug, warn};

use crate::connection::{self, ConnCtx, EventRouter, WsQuery};
use crate::metrics;
use crate::state::AppState;

/// Exact text clients match on when a direct target cannot be reached.
pub const OFFLINE_MESSAGE: &str = "User is offline or not available.";

/// Chat endpoint upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let relay = state.chat.clone();
    connection::serve::<ChatRouter>(ws, query, state, relay).await
}

/// Router for the chat namespace.
pub struct ChatRouter;

impl EventRouter for ChatRouter {
    const NAMESPACE: &'static str = "chat";

    fn route(relay: &Relay, ctx: &ConnCtx, text: &str) -> Option<&'static str> {
        match codec::decode::<ChatClientEvent>(text) {
            Ok(event) => {
                let name = event.event_name();
                dispatch(relay, ctx, event);
                Some(name)
            }
            Err(err) => {
                warn!(session = %ctx.session, error = %err, "Dropping undecodable chat frame");
                metrics::event_error(Self::NAMESPACE, "malformed");
                None
            }
        }
    }
}

/// Apply one decoded chat event against the relay tables.
pub fn dispatch(relay: &Relay, ctx: &ConnCtx, event: ChatClientEvent) {
    match event {
        ChatClientEvent::JoinRoom(room) => {
            relay.rooms().join(room, ctx.session.clone());
        }
        ChatClientEvent::Message { room, message } => room_message(relay, ctx, &room, message),
        ChatClientEvent::PrivateMessage {
            to_user_id,
            message,
        } => private_message(relay, ctx, &to_user_id, message),
    }
}

/// Fan a room message out to every current member, the sender included when
/// joined. The `user` field carries the sender's verified username, never a
/// self-reported id.
fn room_message(relay: &Relay, ctx: &ConnCtx, room: &str, message: String) {
    let event = ChatServerEvent::message(ctx.identity.username.clone(), message);
    match codec::encode(&event) {
        Ok(frame) => {
            let delivered = relay.broadcast_to_room(room, &frame, None);
            debug!(session = %ctx.session, room = %room, delivered, "Room message");
        }
        Err(err) => warn!(session = %ctx.session, error = %err, "Failed to encode room message"),
    }
}

/// Deliver a direct message, or tell the sender the target is unreachable.
fn private_message(relay: &Relay, ctx: &ConnCtx, to_user_id: &str, message: String) {
    let event = ChatServerEvent::private_message(message, ctx.handshake_user_id.clone());
    let frame = match codec::encode(&event) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(session = %ctx.session, error = %err, "Failed to encode direct message");
            return;
        }
    };
    if let Err(err) = relay.send_to_user(to_user_id, frame) {
        debug!(
            session = %ctx.session,
            target = %to_user_id,
            error = %err,
            "Direct message undeliverable"
        );
        metrics::event_error(ChatRouter::NAMESPACE, "offline");
        report_error(relay, ctx, OFFLINE_MESSAGE);
    }
}

/// Queue an error event back to the sending session.
fn report_error(relay: &Relay, ctx: &ConnCtx, message: &str) {
    if let Ok(frame) = codec::encode(&ChatServerEvent::error(message)) {
        let _ = relay.send_to_session(&ctx.session, frame);
    }
}
