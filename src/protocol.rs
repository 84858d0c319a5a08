use crate::types::PlayerId;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Player,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// A chat line; trivia answers are chat lines starting with the answer prefix
    Chat {
        text: String,
        /// Client-chosen identity used to drop resends
        #[serde(default)]
        msg_id: Option<String>,
    },
    /// Admin only, e.g. `/trivia status`
    Command { line: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        player_id: PlayerId,
        name: String,
        role: Role,
        server_now: String,
    },
    Chat {
        text: String,
    },
    CommandResult {
        ok: bool,
        text: String,
    },
    Error {
        code: String,
        msg: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_chat_without_msg_id() {
        let msg: ClientMessage = serde_json::from_str(r#"{"t":"chat","text":".Paris"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Chat {
                text: ".Paris".to_string(),
                msg_id: None
            }
        );
    }

    #[test]
    fn test_server_messages_are_tagged() {
        let json = serde_json::to_value(ServerMessage::CommandResult {
            ok: true,
            text: "done".to_string(),
        })
        .unwrap();
        assert_eq!(json["t"], "command_result");
        assert_eq!(json["ok"], true);

        let json = serde_json::to_value(ServerMessage::Welcome {
            protocol: PROTOCOL_VERSION.to_string(),
            player_id: "p1".to_string(),
            name: "brave-otter".to_string(),
            role: Role::Admin,
            server_now: "now".to_string(),
        })
        .unwrap();
        assert_eq!(json["t"], "welcome");
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"t":"vote"}"#).is_err());
    }
}
