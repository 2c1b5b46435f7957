//! Signaling namespace: direct negotiation, room fan-out, arrival
//! announcements.

use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::Response;
use beacon_core::Relay;
use beacon_protocol::{codec, SignalClientEvent, SignalServerEvent};
use tracing::{debug, warn};

use crate::connection::{self, ConnCtx, EventRouter, WsQuery};
use crate::metrics;
use crate::state::AppState;

/// Video endpoint upgrade handler.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let relay = state.signal.clone();
    connection::serve::<SignalRouter>(ws, query, state, relay).await
}

/// Router for the signaling namespace.
pub struct SignalRouter;

impl EventRouter for SignalRouter {
    const NAMESPACE: &'static str = "video";

    fn route(relay: &Relay, ctx: &ConnCtx, text: &str) -> Option<&'static str> {
        match codec::decode::<SignalClientEvent>(text) {
            Ok(event) => {
                let name = event.event_name();
                dispatch(relay, ctx, event);
                Some(name)
            }
            Err(err) => {
                warn!(session = %ctx.session, error = %err, "Dropping undecodable signal frame");
                metrics::event_error(Self::NAMESPACE, "malformed");
                None
            }
        }
    }
}

/// Apply one decoded signaling event against the relay tables.
///
/// Undeliverable direct traffic is dropped without feedback; negotiation
/// recovery belongs to clients, not the relay.
pub fn dispatch(relay: &Relay, ctx: &ConnCtx, event: SignalClientEvent) {
    let origin = ctx.handshake_user_id.clone();
    match event {
        SignalClientEvent::Offer { to_user_id, offer } => {
            forward_direct(relay, ctx, &to_user_id, SignalServerEvent::offer(offer, origin));
        }
        SignalClientEvent::Answer { to_user_id, answer } => {
            forward_direct(
                relay,
                ctx,
                &to_user_id,
                SignalServerEvent::answer(answer, origin),
            );
        }
        SignalClientEvent::IceCandidate {
            to_user_id,
            candidate,
        } => {
            forward_direct(
                relay,
                ctx,
                &to_user_id,
                SignalServerEvent::ice_candidate(candidate, origin),
            );
        }
        SignalClientEvent::RoomOffer { room, offer } => {
            let event = SignalServerEvent::room_offer(room.clone(), offer, origin);
            forward_room(relay, ctx, &room, &event);
        }
        SignalClientEvent::RoomAnswer { room, answer } => {
            let event = SignalServerEvent::room_answer(room.clone(), answer, origin);
            forward_room(relay, ctx, &room, &event);
        }
        SignalClientEvent::RoomIceCandidate { room, candidate } => {
            let event = SignalServerEvent::room_ice_candidate(room.clone(), candidate, origin);
            forward_room(relay, ctx, &room, &event);
        }
        SignalClientEvent::JoinRoom(room) => join_room(relay, ctx, room),
        SignalClientEvent::LeaveRoom(room) => {
            relay.rooms().leave(&room, &ctx.session);
        }
    }
}

/// Forward a negotiation event to the session registered for `target`.
/// Unknown and stale targets are dropped silently.
fn forward_direct(relay: &Relay, ctx: &ConnCtx, target: &str, event: SignalServerEvent) {
    let frame = match codec::encode(&event) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(session = %ctx.session, error = %err, "Failed to encode signal");
            return;
        }
    };
    match relay.send_to_user(target, frame) {
        Ok(()) => debug!(session = %ctx.session, target = %target, "Forwarded signal"),
        Err(err) => {
            debug!(
                session = %ctx.session,
                target = %target,
                error = %err,
                "Dropping signal for unreachable target"
            );
            metrics::event_error(SignalRouter::NAMESPACE, "offline");
        }
    }
}

/// Fan a negotiation event out to a room, excluding the sender. An absent
/// room fans out to nobody.
fn forward_room(relay: &Relay, ctx: &ConnCtx, room: &str, event: &SignalServerEvent) {
    match codec::encode(event) {
        Ok(frame) => {
            let delivered = relay.broadcast_to_room(room, &frame, Some(&ctx.session));
            debug!(session = %ctx.session, room = %room, delivered, "Room signal");
        }
        Err(err) => warn!(session = %ctx.session, error = %err, "Failed to encode room signal"),
    }
}

/// Join a room and announce the arrival, by session id, to the peers already
/// there. The joiner hears nothing back; departures are never announced.
fn join_room(relay: &Relay, ctx: &ConnCtx, room: String) {
    relay.rooms().join(room.clone(), ctx.session.clone());
    match codec::encode(&SignalServerEvent::user_joined(ctx.session.as_str())) {
        Ok(frame) => {
            let notified = relay.broadcast_to_room(&room, &frame, Some(&ctx.session));
            debug!(session = %ctx.session, room = %room, notified, "Joined signaling room");
        }
        Err(err) => {
            warn!(session = %ctx.session, error = %err, "Failed to encode arrival announcement");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::Identity;
    use serde_json::{json, Value};
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn admit(
        relay: &Relay,
        id: &str,
        handshake: Option<&str>,
    ) -> (ConnCtx, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let identity = Identity::new(id, id);
        let session = relay.connect(identity.clone(), handshake.map(String::from), tx);
        let ctx = ConnCtx {
            session,
            identity,
            handshake_user_id: handshake.map(String::from),
        };
        (ctx, rx)
    }

    fn next_json(rx: &mut UnboundedReceiver<String>) -> Value {
        serde_json::from_str(&rx.try_recv().expect("expected a queued frame")).unwrap()
    }

    fn join(relay: &Relay, ctx: &ConnCtx, room: &str) {
        dispatch(relay, ctx, SignalClientEvent::JoinRoom(room.to_string()));
    }

    #[test]
    fn direct_offer_reaches_target_with_origin_and_intact_payload() {
        let relay = Relay::new();
        let (alice, _alice_rx) = admit(&relay, "u1", Some("u1"));
        let (_bob, mut bob_rx) = admit(&relay, "u2", None);
        let payload = json!({"type": "offer", "sdp": "v=0\r\nm=video 9 UDP/TLS/RTP/SAVPF 96\r\n"});

        dispatch(
            &relay,
            &alice,
            SignalClientEvent::Offer {
                to_user_id: "u2".to_string(),
                offer: payload.clone(),
            },
        );

        let frame = next_json(&mut bob_rx);
        assert_eq!(frame["event"], "offer");
        assert_eq!(frame["data"]["offer"], payload);
        assert_eq!(frame["data"]["fromUserId"], "u1");
    }

    #[test]
    fn direct_signal_to_offline_target_is_dropped_without_feedback() {
        let relay = Relay::new();
        let (alice, mut alice_rx) = admit(&relay, "u1", Some("u1"));

        dispatch(
            &relay,
            &alice,
            SignalClientEvent::IceCandidate {
                to_user_id: "u404".to_string(),
                candidate: json!("candidate:1 1 UDP 1 192.0.2.1 1 typ host"),
            },
        );

        // Unlike the chat namespace, the sender hears nothing.
        assert!(alice_rx.try_recv().is_err());
    }

    #[test]
    fn anonymous_sender_forwards_without_origin() {
        let relay = Relay::new();
        let (_alice, mut alice_rx) = admit(&relay, "u1", None);
        let (bob, _bob_rx) = admit(&relay, "u2", None);

        dispatch(
            &relay,
            &bob,
            SignalClientEvent::Answer {
                to_user_id: "u1".to_string(),
                answer: json!({"type": "answer"}),
            },
        );

        let frame = next_json(&mut alice_rx);
        assert_eq!(frame["event"], "answer");
        assert!(frame["data"].get("fromUserId").is_none());
    }

    #[test]
    fn join_announces_session_id_to_existing_members_only() {
        let relay = Relay::new();
        let (alice, mut alice_rx) = admit(&relay, "u1", Some("u1"));
        let (bob, mut bob_rx) = admit(&relay, "u2", Some("u2"));

        join(&relay, &alice, "standup");
        assert!(alice_rx.try_recv().is_err());

        join(&relay, &bob, "standup");
        assert_eq!(
            next_json(&mut alice_rx),
            json!({"event": "user-joined", "data": {"userId": bob.session.as_str()}})
        );
        assert!(bob_rx.try_recv().is_err());
    }

    #[test]
    fn rejoin_announces_again() {
        let relay = Relay::new();
        let (alice, mut alice_rx) = admit(&relay, "u1", None);
        let (bob, _bob_rx) = admit(&relay, "u2", None);
        join(&relay, &alice, "standup");

        join(&relay, &bob, "standup");
        join(&relay, &bob, "standup");

        assert_eq!(next_json(&mut alice_rx)["event"], "user-joined");
        assert_eq!(next_json(&mut alice_rx)["event"], "user-joined");
        assert_eq!(relay.rooms().members("standup").len(), 2);
    }

    #[test]
    fn room_relay_excludes_sender_even_as_non_member() {
        let relay = Relay::new();
        let (alice, mut alice_rx) = admit(&relay, "u1", None);
        let (bob, mut bob_rx) = admit(&relay, "u2", None);
        let (carol, mut carol_rx) = admit(&relay, "u3", Some("u3"));
        join(&relay, &alice, "standup");
        join(&relay, &bob, "standup");
        while alice_rx.try_recv().is_ok() {}

        // Carol relays into a room she never joined.
        dispatch(
            &relay,
            &carol,
            SignalClientEvent::RoomOffer {
                room: "standup".to_string(),
                offer: json!({"sdp": "x"}),
            },
        );

        for rx in [&mut alice_rx, &mut bob_rx] {
            let frame = next_json(rx);
            assert_eq!(frame["event"], "room-offer");
            assert_eq!(frame["data"]["room"], "standup");
            assert_eq!(frame["data"]["fromUserId"], "u3");
        }
        assert!(carol_rx.try_recv().is_err());

        // And as a member, her own relays skip her.
        join(&relay, &carol, "standup");
        while alice_rx.try_recv().is_ok() {}
        while bob_rx.try_recv().is_ok() {}
        dispatch(
            &relay,
            &carol,
            SignalClientEvent::RoomIceCandidate {
                room: "standup".to_string(),
                candidate: json!({}),
            },
        );
        assert_eq!(next_json(&mut alice_rx)["event"], "room-ice-candidate");
        assert_eq!(next_json(&mut bob_rx)["event"], "room-ice-candidate");
        assert!(carol_rx.try_recv().is_err());
    }

    #[test]
    fn room_answer_to_absent_room_is_silent() {
        let relay = Relay::new();
        let (alice, mut alice_rx) = admit(&relay, "u1", Some("u1"));

        dispatch(
            &relay,
            &alice,
            SignalClientEvent::RoomAnswer {
                room: "ghost".to_string(),
                answer: json!({"type": "answer"}),
            },
        );

        assert!(alice_rx.try_recv().is_err());
        assert!(!relay.rooms().contains("ghost"));
    }

    #[test]
    fn leave_is_unannounced_and_stops_delivery() {
        let relay = Relay::new();
        let (alice, mut alice_rx) = admit(&relay, "u1", None);
        let (bob, mut bob_rx) = admit(&relay, "u2", None);
        join(&relay, &alice, "standup");
        join(&relay, &bob, "standup");
        while alice_rx.try_recv().is_ok() {}

        dispatch(
            &relay,
            &bob,
            SignalClientEvent::LeaveRoom("standup".to_string()),
        );
        assert!(alice_rx.try_recv().is_err());

        dispatch(
            &relay,
            &alice,
            SignalClientEvent::RoomOffer {
                room: "standup".to_string(),
                offer: json!({}),
            },
        );
        assert!(bob_rx.try_recv().is_err());
    }
}
