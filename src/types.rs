use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type MessageId = String;

/// Monotonic round counter. Bumped exactly once per new ACTIVE phase.
pub type RoundId = u64;

/// Fixed tick rate of the game loop
pub const TICKS_PER_SECOND: u64 = 20;

/// A connected user as seen by the game
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Cooldown,
    Active,
}

/// Immutable prompt/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    pub answer: String,
}

impl Question {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Key used by the no-repeat window. `None` for blank prompts, which are never tracked.
    pub fn history_key(&self) -> Option<String> {
        let prompt = self.question.trim();
        if prompt.is_empty() {
            return None;
        }
        Some(format!("{}\u{1f}{}", prompt, self.answer.trim()))
    }
}

/// Seconds to ticks, never less than one second worth of ticks
pub fn seconds_to_ticks(seconds: u64) -> u64 {
    seconds.max(1) * TICKS_PER_SECOND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_key_skips_blank_prompt() {
        assert!(Question::new("  ", "x").history_key().is_none());
        assert!(Question::new("Capital of France?", "Paris")
            .history_key()
            .is_some());
    }

    #[test]
    fn test_history_key_distinguishes_answers() {
        let a = Question::new("Q", "one").history_key();
        let b = Question::new("Q", "two").history_key();
        assert_ne!(a, b);
    }

    #[test]
    fn test_seconds_to_ticks_minimum() {
        assert_eq!(seconds_to_ticks(0), TICKS_PER_SECOND);
        assert_eq!(seconds_to_ticks(3), 3 * TICKS_PER_SECOND);
    }
}
