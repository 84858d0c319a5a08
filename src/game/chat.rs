use super::TriviaGame;
use crate::types::{MessageId, Player, PlayerId};
use std::collections::{HashMap, VecDeque};

/// How many recent message ids are remembered for duplicate suppression
pub const RECENT_MESSAGE_CAPACITY: usize = 256;

/// Message ids are only unique per sender
type MessageKey = (PlayerId, MessageId);

/// Bounded memory of recent chat message ids and the decision taken for each
#[derive(Debug, Default)]
pub struct RecentMessages {
    order: VecDeque<MessageKey>,
    decisions: HashMap<MessageKey, bool>,
}

impl RecentMessages {
    pub fn get(&self, player: &str, id: &str) -> Option<bool> {
        self.decisions
            .get(&(player.to_string(), id.to_string()))
            .copied()
    }

    pub fn remember(&mut self, player: PlayerId, id: MessageId, consumed: bool) {
        let key = (player, id);
        if self.decisions.insert(key.clone(), consumed).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > RECENT_MESSAGE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.decisions.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl TriviaGame {
    /// Single entry point for chat lines.
    ///
    /// A message id the same player sent before gets the earlier decision back and is not
    /// processed again.
    pub fn handle_chat(&mut self, msg_id: &str, player: &Player, text: &str) -> bool {
        if let Some(consumed) = self.recent_messages.get(&player.id, msg_id) {
            tracing::debug!("Duplicate chat message {} from {}", msg_id, player.name);
            return consumed;
        }
        let consumed = self.submit_guess(player, text);
        self.recent_messages
            .remember(player.id.clone(), msg_id.to_string(), consumed);
        consumed
    }
}
