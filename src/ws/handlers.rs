//! WebSocket message dispatch

use crate::broadcast::Messenger;
use crate::protocol::{ClientMessage, Role, ServerMessage};
use crate::state::AppState;
use crate::types::Player;
use std::sync::Arc;

/// One connected client
#[derive(Debug, Clone)]
pub struct Session {
    pub player: Player,
    pub role: Role,
}

/// Handle a client message and return an optional direct response
pub async fn handle_message(
    msg: ClientMessage,
    session: &Session,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Chat { text, msg_id } => {
            let text = text.trim_end().to_string();
            if text.is_empty() {
                return None;
            }
            let msg_id = msg_id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| ulid::Ulid::new().to_string());

            let consumed = state
                .game
                .chat(msg_id, session.player.clone(), text.clone())
                .await;
            if !consumed {
                state
                    .messenger
                    .broadcast(&format!("<{}> {}", session.player.name, text));
            }
            None
        }

        ClientMessage::Command { line } => {
            if session.role != Role::Admin {
                return Some(ServerMessage::Error {
                    code: "UNAUTHORIZED".to_string(),
                    msg: "Only admins can run trivia commands".to_string(),
                });
            }
            let reply = state.game.command(line).await;
            Some(ServerMessage::CommandResult {
                ok: reply.ok,
                text: reply.text,
            })
        }
    }
}
