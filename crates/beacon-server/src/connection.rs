//! WebSocket connection actor shared by both namespaces.
//!
//! Lifecycle: verify the handshake credential, admit the session, split the
//! socket into a writer task draining the outbound queue and a reader loop
//! routing inbound events, then tear every table down when either side ends.
//! Rejected handshakes still complete the upgrade so the client can read a
//! close code instead of a failed HTTP request.

use std::borrow::Cow;
use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::WebSocketUpgrade;
use axum::response::Response;
use beacon_core::{Identity, Relay, SessionId};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::AuthError;
use crate::metrics;
use crate::state::AppState;

/// Handshake query parameters. `token` carries the credential; `userId` is
/// the self-reported id echoed on traffic forwarded from this session.
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub token: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
}

/// Per-connection context handed to the namespace router.
pub struct ConnCtx {
    pub session: SessionId,
    pub identity: Identity,
    pub handshake_user_id: Option<String>,
}

/// One namespace's inbound-event routing.
pub trait EventRouter: Send + Sync + 'static {
    /// Namespace label for logs and metrics.
    const NAMESPACE: &'static str;

    /// Route one inbound text frame. Returns the wire event name when the
    /// frame decoded; a `None` means the router dropped it.
    fn route(relay: &Relay, ctx: &ConnCtx, text: &str) -> Option<&'static str>;
}

/// Shared upgrade path for both namespaces.
pub async fn serve<R: EventRouter>(
    ws: WebSocketUpgrade,
    query: WsQuery,
    state: AppState,
    relay: Arc<Relay>,
) -> Response {
    let ws = ws.max_message_size(state.config.limits.max_message_size);

    let verified = match query.token {
        Some(ref token) => state.verifier.verify(token).await,
        None => Err(AuthError::Missing),
    };

    match verified {
        Ok(identity) => {
            let user_id = query.user_id;
            ws.on_upgrade(move |socket| handle_socket::<R>(socket, relay, identity, user_id))
        }
        Err(err) => {
            warn!(namespace = R::NAMESPACE, error = %err, "Handshake rejected");
            metrics::event_error(R::NAMESPACE, "auth");
            let code = err.close_code();
            let reason = err.to_string();
            ws.on_upgrade(move |socket| reject(socket, code, reason))
        }
    }
}

/// Complete the upgrade, then close immediately with a policy code.
async fn reject(mut socket: WebSocket, code: u16, reason: String) {
    let frame = CloseFrame {
        code,
        reason: Cow::Owned(reason),
    };
    if let Err(err) = socket.send(Message::Close(Some(frame))).await {
        debug!(error = %err, "Close after rejected handshake failed");
    }
}

async fn handle_socket<R: EventRouter>(
    socket: WebSocket,
    relay: Arc<Relay>,
    identity: Identity,
    handshake_user_id: Option<String>,
) {
    let _guard = metrics::ConnectionGuard::accepted(R::NAMESPACE);
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let session = relay.connect(identity.clone(), handshake_user_id.clone(), tx);
    metrics::update_tables(R::NAMESPACE, &relay.stats());
    info!(
        namespace = R::NAMESPACE,
        session = %session,
        user = %identity.id,
        "Connection open"
    );

    let ctx = ConnCtx {
        session: session.clone(),
        identity,
        handshake_user_id,
    };

    // Writer: drain the outbound queue onto the socket in queue order.
    let mut write_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Reader: route frames sequentially until the peer goes away.
    let read_relay = relay.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = stream.next().await {
            let message = match message {
                Ok(message) => message,
                Err(err) => {
                    debug!(session = %ctx.session, error = %err, "Socket error");
                    break;
                }
            };
            match message {
                Message::Text(text) => route_text::<R>(&read_relay, &ctx, &text),
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => route_text::<R>(&read_relay, &ctx, &text),
                    Err(_) => {
                        warn!(session = %ctx.session, "Dropping non-UTF-8 binary frame");
                        metrics::event_error(R::NAMESPACE, "malformed");
                    }
                },
                // The protocol layer answers pings on the next socket op.
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Close(_) => break,
            }
        }
    });

    tokio::select! {
        _ = &mut write_task => read_task.abort(),
        _ = &mut read_task => write_task.abort(),
    }

    relay.disconnect(&session);
    metrics::update_tables(R::NAMESPACE, &relay.stats());
    info!(namespace = R::NAMESPACE, session = %session, "Connection closed");
}

fn route_text<R: EventRouter>(relay: &Relay, ctx: &ConnCtx, text: &str) {
    if let Some(event) = R::route(relay, ctx, text) {
        metrics::event_routed(R::NAMESPACE, event, text.len());
        metrics::update_tables(R::NAMESPACE, &relay.stats());
    }
}
