//! WebSocket chat transport.
//!
//! `/ws/chat?tenant=<id>` upgrades to a WebSocket. Each connection gets a
//! fresh server-generated connection id (UUID v7); any session id a client
//! supplies is ignored, the session is keyed purely by connection.
//!
//! The connection task multiplexes two directions with `tokio::select!`:
//! inbound text frames go to the orchestrator as message events, and
//! outbound frames pushed through the [`WsPushRegistry`] are written back
//! to the socket. Close frames, receive errors, and a dropped outbound
//! channel all end the loop, after which the disconnect event cleans up
//! the session rows.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use relay_types::event::EventStatus;

use crate::state::AppState;

/// Query parameters accepted on the upgrade request.
#[derive(Debug, serde::Deserialize)]
pub struct ConnectParams {
    /// Tenant identifier; sanitized by the orchestrator before use.
    pub tenant: Option<String>,
    /// Accepted for client compatibility, deliberately unused: sessions
    /// are keyed by the server-generated connection id.
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// Upgrade an HTTP request to the chat WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, params))
}

/// Core WebSocket connection handler.
async fn handle_ws_connection(socket: WebSocket, state: AppState, params: ConnectParams) {
    let connection_id = Uuid::now_v7().to_string();
    if params.session_id.is_some() {
        tracing::debug!(connection = %connection_id, "Ignoring client-supplied session id");
    }

    let (mut ws_sender, mut ws_receiver) = socket.split();
    let mut outbound = state.push.register(&connection_id);

    let status = state
        .orchestrator
        .handle_connect(&connection_id, params.tenant.as_deref())
        .await;
    if status != EventStatus::Ok {
        tracing::warn!(connection = %connection_id, code = status.code(), "Connect rejected");
        state.push.deregister(&connection_id);
        let _ = ws_sender.close().await;
        return;
    }

    loop {
        tokio::select! {
            // --- Branch 1: Forward orchestrator pushes to the client ---
            frame = outbound.recv() => {
                match frame {
                    Some(json) => {
                        if ws_sender.send(Message::Text(json.into())).await.is_err() {
                            // Client disconnected
                            break;
                        }
                    }
                    None => {
                        // Channel replaced or registry dropped
                        break;
                    }
                }
            }

            // --- Branch 2: Route inbound frames to the orchestrator ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        let status = state
                            .orchestrator
                            .handle_message(&connection_id, &text)
                            .await;
                        if status != EventStatus::Ok {
                            tracing::debug!(
                                connection = %connection_id,
                                code = status.code(),
                                "Message handled with error status"
                            );
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Client disconnected
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!(connection = %connection_id, "WebSocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    state.push.deregister(&connection_id);
    state.orchestrator.handle_disconnect(&connection_id).await;
    tracing::debug!(connection = %connection_id, "WebSocket connection closed");
}
