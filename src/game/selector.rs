//! No-repeat question selection

use crate::types::Question;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Upper bound on how many recent questions are kept out of rotation
pub const MAX_HISTORY: usize = 20;

/// Picks questions uniformly at random while avoiding the most recent picks.
///
/// The window is `min(MAX_HISTORY, pool.len() - 1)`, so a pool of N questions
/// never repeats within N - 1 picks (capped at 20).
pub struct QuestionSelector {
    history: VecDeque<String>,
    rng: StdRng,
}

impl QuestionSelector {
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_HISTORY),
            rng,
        }
    }

    pub fn pick(&mut self, pool: &[Question]) -> Option<Question> {
        if pool.is_empty() {
            return None;
        }
        let window = MAX_HISTORY.min(pool.len() - 1);
        while self.history.len() > window {
            self.history.pop_front();
        }

        let fresh: Vec<&Question> = pool
            .iter()
            .filter(|q| match q.history_key() {
                Some(key) => !self.history.contains(&key),
                None => true,
            })
            .collect();

        let picked = if fresh.is_empty() {
            pool[self.rng.random_range(0..pool.len())].clone()
        } else {
            fresh[self.rng.random_range(0..fresh.len())].clone()
        };

        if window > 0 {
            if let Some(key) = picked.history_key() {
                self.history.push_back(key);
                while self.history.len() > window {
                    self.history.pop_front();
                }
            }
        }
        Some(picked)
    }
}

impl Default for QuestionSelector {
    fn default() -> Self {
        Self::new()
    }
}
