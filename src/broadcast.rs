//! Outbound chat messages
//!
//! The game talks to players only through [`Messenger`]. The server wires it to a
//! `tokio::sync::broadcast` channel that every WebSocket connection subscribes to.

use crate::types::PlayerId;
use serde::Serialize;
use std::sync::Mutex;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Recipient {
    All,
    Player(PlayerId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outbound {
    pub recipient: Recipient,
    pub text: String,
}

impl Outbound {
    pub fn is_for(&self, player: &PlayerId) -> bool {
        match &self.recipient {
            Recipient::All => true,
            Recipient::Player(id) => id == player,
        }
    }
}

/// Messaging sink used by the game and its collaborators
pub trait Messenger: Send + Sync {
    fn send_to_player(&self, player: &PlayerId, text: &str);
    fn broadcast(&self, text: &str);
}

/// Publishes every message on a broadcast channel
#[derive(Clone)]
pub struct BroadcastMessenger {
    tx: broadcast::Sender<Outbound>,
}

impl BroadcastMessenger {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.tx.subscribe()
    }

    fn publish(&self, recipient: Recipient, text: &str) {
        // No receivers connected is fine
        let _ = self.tx.send(Outbound {
            recipient,
            text: text.to_string(),
        });
    }
}

impl Messenger for BroadcastMessenger {
    fn send_to_player(&self, player: &PlayerId, text: &str) {
        self.publish(Recipient::Player(player.clone()), text);
    }

    fn broadcast(&self, text: &str) {
        tracing::debug!("Broadcast: {}", text);
        self.publish(Recipient::All, text);
    }
}

/// Keeps every message in memory, in order
#[derive(Default)]
pub struct MemoryMessenger {
    sent: Mutex<Vec<Outbound>>,
}

impl MemoryMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, recipient: Recipient, text: &str) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(Outbound {
                recipient,
                text: text.to_string(),
            });
    }

    pub fn messages(&self) -> Vec<Outbound> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn broadcasts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.recipient == Recipient::All)
            .map(|m| m.text)
            .collect()
    }

    pub fn sent_to(&self, player: &str) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| matches!(&m.recipient, Recipient::Player(id) if id == player))
            .map(|m| m.text)
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Messenger for MemoryMessenger {
    fn send_to_player(&self, player: &PlayerId, text: &str) {
        self.push(Recipient::Player(player.clone()), text);
    }

    fn broadcast(&self, text: &str) {
        self.push(Recipient::All, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_messenger_delivers_to_subscribers() {
        let messenger = BroadcastMessenger::new(16);
        let mut rx = messenger.subscribe();

        messenger.broadcast("hello");
        messenger.send_to_player(&"p1".to_string(), "psst");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.recipient, Recipient::All);
        let second = rx.recv().await.unwrap();
        assert!(second.is_for(&"p1".to_string()));
        assert!(!second.is_for(&"p2".to_string()));
    }

    #[test]
    fn test_send_without_subscribers_does_not_fail() {
        let messenger = BroadcastMessenger::new(4);
        messenger.broadcast("nobody listening");
    }

    #[test]
    fn test_memory_messenger_filters() {
        let messenger = MemoryMessenger::new();
        messenger.broadcast("all");
        messenger.send_to_player(&"p1".to_string(), "one");

        assert_eq!(messenger.broadcasts(), vec!["all".to_string()]);
        assert_eq!(messenger.sent_to("p1"), vec!["one".to_string()]);
        assert!(messenger.sent_to("p2").is_empty());
    }
}
