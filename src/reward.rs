//! Rewards for correct answers

use crate::config::{RewardItem, TriviaConfig};
use crate::types::Player;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reward {
    pub count: u32,
    pub item_id: String,
    pub item_name: String,
}

impl Reward {
    pub fn describe(&self) -> String {
        format!("{}x {} ({})", self.count, self.item_id, self.item_name)
    }
}

/// Grants something to a player who solved the question
pub trait Rewarder: Send {
    /// `None` means there was nothing to grant
    fn grant(&mut self, player: &Player) -> Option<Reward>;

    /// Recompute internal pools from a fresh config snapshot
    fn rebuild(&mut self, _config: &TriviaConfig) {}
}

/// Random item from the configured pool, minus the blacklist
pub struct ItemPoolRewarder {
    pool: Vec<RewardItem>,
    count_override: i32,
    rng: StdRng,
}

impl ItemPoolRewarder {
    pub fn new(config: &TriviaConfig) -> Self {
        let mut rewarder = Self {
            pool: Vec::new(),
            count_override: -1,
            rng: StdRng::from_rng(&mut rand::rng()),
        };
        rewarder.rebuild(config);
        rewarder
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Items per grant. An override is clamped into `1..=max_stack` rather than rejected.
    fn count_for(&mut self, item: &RewardItem) -> u32 {
        let max_stack = item.max_stack.max(1);
        if self.count_override > 0 {
            (self.count_override as u32).min(max_stack)
        } else {
            self.rng.random_range(1..=max_stack)
        }
    }
}

impl Rewarder for ItemPoolRewarder {
    fn grant(&mut self, player: &Player) -> Option<Reward> {
        if self.pool.is_empty() {
            tracing::warn!("Reward pool is empty, nothing granted to {}", player.name);
            return None;
        }
        let item = self.pool[self.rng.random_range(0..self.pool.len())].clone();
        let count = self.count_for(&item);
        tracing::info!("Rewarding {} with {}x {}", player.name, count, item.id);
        Some(Reward {
            count,
            item_id: item.id,
            item_name: item.name,
        })
    }

    fn rebuild(&mut self, config: &TriviaConfig) {
        self.pool = config
            .reward_items
            .iter()
            .filter(|item| !config.item_blacklist.iter().any(|b| b.trim() == item.id))
            .cloned()
            .collect();
        self.count_override = config.reward_count_override;
        tracing::info!(
            "Trivia reward pool: {} items (blacklist: {})",
            self.pool.len(),
            config.item_blacklist.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, max_stack: u32) -> RewardItem {
        RewardItem {
            id: id.to_string(),
            name: id.to_string(),
            max_stack,
        }
    }

    fn player() -> Player {
        Player::new("p1", "Alice")
    }

    #[test]
    fn test_blacklist_removes_items() {
        let config = TriviaConfig {
            reward_items: vec![item("minecraft:air", 64), item("minecraft:stone", 64)],
            item_blacklist: vec!["minecraft:air".to_string()],
            ..TriviaConfig::default()
        };
        let rewarder = ItemPoolRewarder::new(&config);
        assert_eq!(rewarder.pool_size(), 1);
    }

    #[test]
    fn test_empty_pool_grants_nothing() {
        let config = TriviaConfig {
            reward_items: vec![],
            ..TriviaConfig::default()
        };
        let mut rewarder = ItemPoolRewarder::new(&config);
        assert!(rewarder.grant(&player()).is_none());
    }

    #[test]
    fn test_override_is_clamped_to_stack_size() {
        let config = TriviaConfig {
            reward_items: vec![item("minecraft:diamond_sword", 1)],
            reward_count_override: 32,
            ..TriviaConfig::default()
        };
        let mut rewarder = ItemPoolRewarder::new(&config);
        assert_eq!(rewarder.grant(&player()).unwrap().count, 1);
    }

    #[test]
    fn test_override_used_when_within_stack() {
        let config = TriviaConfig {
            reward_items: vec![item("minecraft:diamond", 64)],
            reward_count_override: 5,
            ..TriviaConfig::default()
        };
        let mut rewarder = ItemPoolRewarder::new(&config);
        assert_eq!(rewarder.grant(&player()).unwrap().count, 5);
    }

    #[test]
    fn test_random_count_stays_in_range() {
        let config = TriviaConfig {
            reward_items: vec![item("minecraft:ender_pearl", 16)],
            reward_count_override: -1,
            ..TriviaConfig::default()
        };
        let mut rewarder = ItemPoolRewarder::new(&config);
        for _ in 0..100 {
            let count = rewarder.grant(&player()).unwrap().count;
            assert!((1..=16).contains(&count));
        }
    }

    #[test]
    fn test_describe() {
        let reward = Reward {
            count: 3,
            item_id: "minecraft:diamond".to_string(),
            item_name: "Diamond".to_string(),
        };
        assert_eq!(reward.describe(), "3x minecraft:diamond (Diamond)");
    }
}
