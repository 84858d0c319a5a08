//! Penalties for failed attempts

use crate::broadcast::Messenger;
use crate::config::TriviaConfig;
use crate::types::Player;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Fire-and-forget penalty hook
pub trait Punisher: Send {
    fn apply(&mut self, player: &Player, reason: &str);

    fn rebuild(&mut self, _config: &TriviaConfig) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Penalty {
    pub effect: String,
    pub duration_seconds: u32,
    /// 1-based level
    pub amplifier: u32,
}

/// Hands out a random status effect and tells the player about it
pub struct EffectPunisher {
    effects: Vec<String>,
    duration: (u32, u32),
    amplifier: (u32, u32),
    messenger: Arc<dyn Messenger>,
    rng: StdRng,
}

impl EffectPunisher {
    pub fn new(config: &TriviaConfig, messenger: Arc<dyn Messenger>) -> Self {
        let mut punisher = Self {
            effects: Vec::new(),
            duration: (1, 1),
            amplifier: (1, 1),
            messenger,
            rng: StdRng::from_rng(&mut rand::rng()),
        };
        punisher.rebuild(config);
        punisher
    }

    pub fn roll(&mut self) -> Option<Penalty> {
        if self.effects.is_empty() {
            return None;
        }
        let effect = self.effects[self.rng.random_range(0..self.effects.len())].clone();
        Some(Penalty {
            effect,
            duration_seconds: inclusive(&mut self.rng, self.duration),
            amplifier: inclusive(&mut self.rng, self.amplifier),
        })
    }
}

fn inclusive(rng: &mut StdRng, (a, b): (u32, u32)) -> u32 {
    let lo = a.min(b).max(1);
    let hi = a.max(b).max(1);
    rng.random_range(lo..=hi)
}

impl Punisher for EffectPunisher {
    fn apply(&mut self, player: &Player, reason: &str) {
        let Some(penalty) = self.roll() else {
            return;
        };
        tracing::info!(
            "Punishing {} ({}): {} {} for {}s",
            player.name,
            reason,
            penalty.effect,
            penalty.amplifier,
            penalty.duration_seconds
        );
        self.messenger.send_to_player(
            &player.id,
            &format!(
                "Trivia: failed ({}). You were given {} {} for {}s.",
                reason, penalty.effect, penalty.amplifier, penalty.duration_seconds
            ),
        );
    }

    fn rebuild(&mut self, config: &TriviaConfig) {
        self.effects = config
            .punish_effects
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        self.duration = (
            config.punish_effect_duration_seconds_min,
            config.punish_effect_duration_seconds_max,
        );
        self.amplifier = (
            config.punish_effect_amplifier_min,
            config.punish_effect_amplifier_max,
        );
        tracing::info!("Trivia punishment pool: {} effects", self.effects.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::MemoryMessenger;

    #[test]
    fn test_roll_respects_ranges() {
        let config = TriviaConfig {
            punish_effect_duration_seconds_min: 5,
            punish_effect_duration_seconds_max: 8,
            punish_effect_amplifier_min: 3,
            punish_effect_amplifier_max: 2,
            ..TriviaConfig::default()
        };
        let mut punisher = EffectPunisher::new(&config, Arc::new(MemoryMessenger::new()));
        for _ in 0..100 {
            let penalty = punisher.roll().unwrap();
            assert!((5..=8).contains(&penalty.duration_seconds));
            assert!((2..=3).contains(&penalty.amplifier));
        }
    }

    #[test]
    fn test_apply_messages_player_with_reason() {
        let messenger = Arc::new(MemoryMessenger::new());
        let mut punisher = EffectPunisher::new(&TriviaConfig::default(), messenger.clone());

        punisher.apply(&Player::new("p1", "Alice"), "time limit");

        let sent = messenger.sent_to("p1");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("failed (time limit)"));
    }

    #[test]
    fn test_empty_effect_pool_is_noop() {
        let messenger = Arc::new(MemoryMessenger::new());
        let config = TriviaConfig {
            punish_effects: vec![" ".to_string()],
            ..TriviaConfig::default()
        };
        let mut punisher = EffectPunisher::new(&config, messenger.clone());

        punisher.apply(&Player::new("p1", "Alice"), "max attempts");
        assert!(messenger.messages().is_empty());
    }
}
