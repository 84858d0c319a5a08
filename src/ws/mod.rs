pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, Role, ServerMessage, PROTOCOL_VERSION};
use crate::state::AppState;
use crate::types::Player;
use handlers::Session;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub name: Option<String>,
    pub role: Option<String>,
    /// Checked by the auth middleware before the upgrade
    pub token: Option<String>,
}

impl WsQuery {
    pub fn wants_admin(&self) -> bool {
        self.role.as_deref().map(str::trim) == Some("admin")
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!(
        "WebSocket connection request: name={:?}, role={:?}",
        params.name,
        params.role
    );

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

fn session_for(params: &WsQuery) -> Session {
    let role = if params.wants_admin() {
        Role::Admin
    } else {
        Role::Player
    };
    let name = params
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| n.chars().take(32).collect::<String>())
        .or_else(|| petname::petname(2, "-"))
        .unwrap_or_else(|| "guest".to_string());

    Session {
        player: Player::new(ulid::Ulid::new().to_string(), name),
        role,
    }
}

async fn send_json(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize server message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let session = session_for(&params);

    tracing::info!(
        "WebSocket connected: {} ({:?})",
        session.player.name,
        session.role
    );

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        player_id: session.player.id.clone(),
        name: session.player.name.clone(),
        role: session.role,
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    let mut chat_rx = state.messenger.subscribe();

    loop {
        tokio::select! {
            outbound = chat_rx.recv() => {
                match outbound {
                    Ok(outbound) => {
                        if !outbound.is_for(&session.player.id) {
                            continue;
                        }
                        let msg = ServerMessage::Chat { text: outbound.text };
                        if !send_json(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("{} missed {} chat messages", session.player.name, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &session, &state).await
                                {
                                    if !send_json(&mut sender, &response).await {
                                        tracing::error!("Failed to send response");
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                let _ = send_json(&mut sender, &error).await;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for {}", session.player.name);
}
