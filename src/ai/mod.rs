//! AI-assisted answer validation and hints
//!
//! The game decides *whether* to ask the judge; [`AiOrchestrator`] gates admission through a
//! global [`RateLimiter`] and a bounded job queue. Worker tasks run the jobs and post an
//! [`AiOutcome`] back to the game loop, which re-checks the round before applying anything.

mod judge;
mod rate_limit;
mod worker;

use crate::config::TriviaConfig;
use crate::matcher::loose_distance_within;
use crate::types::{PlayerId, RoundId};
use std::time::Duration;
use tokio::sync::mpsc;

pub use judge::{
    parse_validation, sanitize_hint, JudgeService, LlmJudge, UnavailableJudge, Verdict,
    HINT_UNAVAILABLE_MESSAGE, HINT_UNAVAILABLE_TOKEN, MAX_HINT_CHARS,
};
pub use rate_limit::{now_millis, RateLimiter};
pub use worker::{run_job, spawn_ai_workers, AI_WORKERS};

/// Minimum spacing between outbound judge requests
pub const AI_REQUEST_INTERVAL: Duration = Duration::from_secs(2);
/// Capacity of the job queue shared by hints and validations
pub const AI_QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintScope {
    /// Sent privately to one player
    Private(PlayerId),
    /// Broadcast to everyone after consensus
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiJobKind {
    Validate { player: PlayerId, guess: String },
    Hint { scope: HintScope },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiJob {
    pub round_id: RoundId,
    pub question: String,
    pub answer: String,
    pub timeout: Duration,
    pub kind: AiJobKind,
}

/// Result of a job, always produced even when the call failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome {
    Validation {
        player: PlayerId,
        round_id: RoundId,
        verdict: Verdict,
    },
    Hint {
        scope: HintScope,
        round_id: RoundId,
        text: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Queued,
    /// Rate limited or queue full; nothing was sent
    Busy,
}

pub struct AiOrchestrator {
    limiter: RateLimiter,
    jobs: mpsc::Sender<AiJob>,
}

impl AiOrchestrator {
    pub fn new(limiter: RateLimiter, jobs: mpsc::Sender<AiJob>) -> Self {
        Self { limiter, jobs }
    }

    /// Orchestrator plus the receiving end of its job queue
    pub fn with_queue(limiter: RateLimiter) -> (Self, mpsc::Receiver<AiJob>) {
        let (tx, rx) = mpsc::channel(AI_QUEUE_CAPACITY);
        (Self::new(limiter, tx), rx)
    }

    /// Hints need the AI feature switched on and credentials present
    pub fn hints_available(config: &TriviaConfig) -> bool {
        config.ai_configured()
    }

    /// Edit-distance bound for consulting the judge, wider than the local fuzzy tier
    pub fn consult_distance(config: &TriviaConfig) -> usize {
        let fuzzy = config.fuzzy_max_edit_distance.max(0) as usize;
        (fuzzy.max(3) + 2).max(2)
    }

    /// True when a near miss is worth an external judgment
    pub fn should_consult(config: &TriviaConfig, canonical: &str, guess: &str) -> bool {
        if !config.ai_configured() || !config.ai_semantic_answer_validation {
            return false;
        }
        loose_distance_within(canonical, guess, Self::consult_distance(config))
    }

    pub fn submit(&self, job: AiJob) -> Admission {
        if !self.limiter.try_acquire() {
            tracing::debug!("AI request rejected by rate limiter");
            return Admission::Busy;
        }
        match self.jobs.try_send(job) {
            Ok(()) => Admission::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("AI job queue is full");
                Admission::Busy
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("AI workers are gone; dropping job");
                Admission::Busy
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ai_config() -> TriviaConfig {
        TriviaConfig {
            ai_enabled: true,
            open_ai_api_key: "sk-test".to_string(),
            fuzzy_max_edit_distance: 1,
            ..TriviaConfig::default()
        }
    }

    fn job() -> AiJob {
        AiJob {
            round_id: 1,
            question: "Capital of France?".to_string(),
            answer: "Paris".to_string(),
            timeout: Duration::from_secs(1),
            kind: AiJobKind::Hint {
                scope: HintScope::Global,
            },
        }
    }

    #[test]
    fn test_consult_distance_is_wider_than_fuzzy() {
        let mut config = ai_config();
        assert_eq!(AiOrchestrator::consult_distance(&config), 5);
        config.fuzzy_max_edit_distance = 6;
        assert_eq!(AiOrchestrator::consult_distance(&config), 8);
        config.fuzzy_max_edit_distance = 0;
        assert_eq!(AiOrchestrator::consult_distance(&config), 5);
    }

    #[test]
    fn test_should_consult_near_miss_only() {
        let config = ai_config();
        assert!(AiOrchestrator::should_consult(
            &config,
            "United States",
            "United Stats of"
        ));
        assert!(!AiOrchestrator::should_consult(
            &config,
            "Paris",
            "Constantinople"
        ));
        assert!(!AiOrchestrator::should_consult(&config, "Paris", "!!!"));
    }

    #[test]
    fn test_should_consult_requires_ai() {
        let mut config = ai_config();
        config.ai_semantic_answer_validation = false;
        assert!(!AiOrchestrator::should_consult(&config, "Paris", "Pariss"));

        let config = TriviaConfig::default();
        assert!(!AiOrchestrator::should_consult(&config, "Paris", "Pariss"));
    }

    #[test]
    fn test_rate_limited_submit_never_reaches_queue() {
        let (orchestrator, mut rx) =
            AiOrchestrator::with_queue(RateLimiter::new(Duration::from_secs(60)));

        assert_eq!(orchestrator.submit(job()), Admission::Queued);
        assert_eq!(orchestrator.submit(job()), Admission::Busy);

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_queue_is_busy() {
        let (orchestrator, rx) = AiOrchestrator::with_queue(RateLimiter::new(Duration::ZERO));
        drop(rx);
        assert_eq!(orchestrator.submit(job()), Admission::Busy);
    }
}
