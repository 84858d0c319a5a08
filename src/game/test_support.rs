use super::{Collaborators, TriviaGame};
use crate::ai::{AiJob, AiOrchestrator, RateLimiter};
use crate::broadcast::MemoryMessenger;
use crate::config::{ConfigStore, TriviaConfig};
use crate::punish::Punisher;
use crate::questions::StaticQuestions;
use crate::reward::{Reward, Rewarder};
use crate::types::{Player, PlayerId, Question};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub struct RecordingRewarder {
    granted: Arc<Mutex<Vec<PlayerId>>>,
}

impl Rewarder for RecordingRewarder {
    fn grant(&mut self, player: &Player) -> Option<Reward> {
        self.granted.lock().unwrap().push(player.id.clone());
        Some(Reward {
            count: 1,
            item_id: "minecraft:diamond".to_string(),
            item_name: "Diamond".to_string(),
        })
    }
}

pub struct RecordingPunisher {
    applied: Arc<Mutex<Vec<(PlayerId, String)>>>,
}

impl Punisher for RecordingPunisher {
    fn apply(&mut self, player: &Player, reason: &str) {
        self.applied
            .lock()
            .unwrap()
            .push((player.id.clone(), reason.to_string()));
    }
}

pub struct Harness {
    pub game: TriviaGame,
    pub messenger: Arc<MemoryMessenger>,
    rewards: Arc<Mutex<Vec<PlayerId>>>,
    penalties: Arc<Mutex<Vec<(PlayerId, String)>>>,
    jobs: mpsc::Receiver<AiJob>,
}

impl Harness {
    pub fn new(config: TriviaConfig) -> Self {
        Self::with_questions(
            config,
            vec![Question::new("What is the capital of France?", "Paris")],
        )
    }

    pub fn with_questions(config: TriviaConfig, questions: Vec<Question>) -> Self {
        Self::build(config, questions, RateLimiter::new(Duration::ZERO))
    }

    pub fn with_limiter(config: TriviaConfig, limiter: RateLimiter) -> Self {
        Self::build(
            config,
            vec![Question::new("What is the capital of France?", "Paris")],
            limiter,
        )
    }

    fn build(config: TriviaConfig, questions: Vec<Question>, limiter: RateLimiter) -> Self {
        let messenger = Arc::new(MemoryMessenger::new());
        let rewards = Arc::new(Mutex::new(Vec::new()));
        let penalties = Arc::new(Mutex::new(Vec::new()));
        let (ai, jobs) = AiOrchestrator::with_queue(limiter);

        let game = TriviaGame::new(
            ConfigStore::in_memory(config),
            Box::new(StaticQuestions(questions)),
            Collaborators {
                rewarder: Box::new(RecordingRewarder {
                    granted: rewards.clone(),
                }),
                punisher: Box::new(RecordingPunisher {
                    applied: penalties.clone(),
                }),
                messenger: messenger.clone(),
            },
            ai,
        );
        messenger.clear();

        Self {
            game,
            messenger,
            rewards,
            penalties,
            jobs,
        }
    }

    pub fn tick_n(&mut self, n: u64) {
        for _ in 0..n {
            self.game.tick();
        }
    }

    pub fn rewards(&self) -> Vec<PlayerId> {
        self.rewards.lock().unwrap().clone()
    }

    pub fn penalties(&self) -> Vec<(PlayerId, String)> {
        self.penalties.lock().unwrap().clone()
    }

    pub fn drain_jobs(&mut self) -> Vec<AiJob> {
        let mut jobs = Vec::new();
        while let Ok(job) = self.jobs.try_recv() {
            jobs.push(job);
        }
        jobs
    }
}

pub fn ai_config() -> TriviaConfig {
    TriviaConfig {
        ai_enabled: true,
        open_ai_api_key: "sk-test".to_string(),
        ..TriviaConfig::default()
    }
}

pub fn alice() -> Player {
    Player::new("p-alice", "Alice")
}

pub fn bob() -> Player {
    Player::new("p-bob", "Bob")
}

pub fn carol() -> Player {
    Player::new("p-carol", "Carol")
}

pub fn dave() -> Player {
    Player::new("p-dave", "Dave")
}
