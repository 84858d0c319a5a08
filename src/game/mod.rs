//! Round scheduler
//!
//! [`TriviaGame`] owns all round state and is driven from a single game loop:
//! `tick()` at 20 Hz, `handle_chat()` for chat lines, and `apply_ai_outcome()` for finished
//! judge calls. Nothing here is shared across threads, so no locking is needed.

mod chat;
mod consensus;
mod guess;
mod hint;
mod round;
mod selector;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat::RecentMessages;
pub use consensus::{EligibilityUpdate, GlobalHintConsensus, Progress, VoteOutcome};
pub use round::{PlayerAttemptState, RoundState, Winner};
pub use selector::{QuestionSelector, MAX_HISTORY};

use crate::ai::{AiOrchestrator, AiOutcome};
use crate::broadcast::Messenger;
use crate::config::{ConfigError, ConfigStore, TriviaConfig};
use crate::punish::Punisher;
use crate::questions::QuestionSource;
use crate::reward::Rewarder;
use crate::types::{seconds_to_ticks, Phase, Question, RoundId, TICKS_PER_SECOND};
use serde::Serialize;
use std::sync::Arc;

/// Retry delay when a round should start but the pool is empty
pub const EMPTY_POOL_RETRY_SECONDS: u64 = 60;

/// Read-only view for the admin surface
#[derive(Debug, Clone, Serialize)]
pub struct GameStatus {
    pub enabled: bool,
    pub phase: Phase,
    pub round_id: RoundId,
    pub seconds_remaining: u64,
    pub question_pool_size: usize,
    pub active_question: Option<Question>,
    pub players_attempted: usize,
    pub players_solved: usize,
}

/// Collaborators the game reports to
pub struct Collaborators {
    pub rewarder: Box<dyn Rewarder>,
    pub punisher: Box<dyn Punisher>,
    pub messenger: Arc<dyn Messenger>,
}

pub struct TriviaGame {
    config: ConfigStore,
    questions: Box<dyn QuestionSource>,
    pool: Vec<Question>,
    selector: QuestionSelector,
    rewarder: Box<dyn Rewarder>,
    punisher: Box<dyn Punisher>,
    messenger: Arc<dyn Messenger>,
    ai: AiOrchestrator,

    phase: Phase,
    phase_ticks_remaining: u64,
    round_id: RoundId,
    round: RoundState,
    recent_messages: RecentMessages,
}

impl TriviaGame {
    /// Build the game, load the pool and start in COOLDOWN
    pub fn new(
        config: ConfigStore,
        questions: Box<dyn QuestionSource>,
        collaborators: Collaborators,
        ai: AiOrchestrator,
    ) -> Self {
        let mut game = Self {
            config,
            questions,
            pool: Vec::new(),
            selector: QuestionSelector::new(),
            rewarder: collaborators.rewarder,
            punisher: collaborators.punisher,
            messenger: collaborators.messenger,
            ai,
            phase: Phase::Cooldown,
            phase_ticks_remaining: 0,
            round_id: 0,
            round: RoundState::default(),
            recent_messages: RecentMessages::default(),
        };
        game.rebuild_pools();
        game.reset_to_cooldown();
        game
    }

    pub fn config(&self) -> Arc<TriviaConfig> {
        self.config.snapshot()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_id(&self) -> RoundId {
        self.round_id
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn phase_ticks_remaining(&self) -> u64 {
        self.phase_ticks_remaining
    }

    pub fn active_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Active => self.round.active_question.as_ref(),
            Phase::Cooldown => None,
        }
    }

    pub fn status(&self) -> GameStatus {
        GameStatus {
            enabled: self.config.snapshot().enabled,
            phase: self.phase,
            round_id: self.round_id,
            seconds_remaining: self.phase_ticks_remaining.div_ceil(TICKS_PER_SECOND),
            question_pool_size: self.pool.len(),
            active_question: self.active_question().cloned(),
            players_attempted: self.round.attempted_count(),
            players_solved: self.round.winners().len(),
        }
    }

    /// Advance one tick. Phase transitions happen when the countdown reaches zero.
    pub fn tick(&mut self) {
        let config = self.config.snapshot();
        if !config.enabled {
            return;
        }

        if self.phase == Phase::Active {
            self.retry_global_hint(&config);
        }

        self.phase_ticks_remaining = self.phase_ticks_remaining.saturating_sub(1);
        if self.phase_ticks_remaining > 0 {
            return;
        }

        match self.phase {
            Phase::Cooldown => self.start_round(),
            Phase::Active => self.end_round(),
        }
    }

    /// Start a round now, skipping the rest of the cooldown, unless one is already running
    pub fn force_start_if_idle(&mut self) -> bool {
        if !self.config.snapshot().enabled {
            return false;
        }
        if self.phase == Phase::Active && self.round.active_question.is_some() {
            return false;
        }
        tracing::info!("Forcing a trivia round to start");
        self.phase = Phase::Cooldown;
        self.phase_ticks_remaining = 0;
        self.start_round();
        self.phase == Phase::Active
    }

    /// Drop the current round, re-read config and questions, rebuild pools, back to COOLDOWN
    pub fn reload(&mut self) {
        self.config.reload();
        self.rebuild_pools();
        self.reset_to_cooldown();
        tracing::info!("Trivia reloaded ({} questions)", self.pool.len());
    }

    /// Persist a config change, then reload so the new snapshot takes effect everywhere
    pub fn update_config(
        &mut self,
        edit: impl FnOnce(&mut TriviaConfig),
    ) -> Result<Arc<TriviaConfig>, ConfigError> {
        self.config.update(edit)?;
        self.rebuild_pools();
        self.reset_to_cooldown();
        Ok(self.config.snapshot())
    }

    /// Route a finished judge call back into the round
    pub fn apply_ai_outcome(&mut self, outcome: AiOutcome) {
        match outcome {
            AiOutcome::Validation {
                player,
                round_id,
                verdict,
            } => self.finalize_validation(&player, round_id, verdict),
            AiOutcome::Hint {
                scope,
                round_id,
                text,
            } => self.deliver_hint(scope, round_id, &text),
        }
    }

    fn rebuild_pools(&mut self) {
        let config = self.config.snapshot();
        self.pool = self.questions.load();
        self.rewarder.rebuild(&config);
        self.punisher.rebuild(&config);
    }

    fn reset_to_cooldown(&mut self) {
        let config = self.config.snapshot();
        self.phase = Phase::Cooldown;
        self.phase_ticks_remaining = seconds_to_ticks(config.cooldown_seconds);
        self.round = RoundState::default();
        tracing::info!("Trivia cooldown started: {}s", config.cooldown_seconds);
    }
}
