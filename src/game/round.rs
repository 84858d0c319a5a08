use super::{TriviaGame, EMPTY_POOL_RETRY_SECONDS};
use crate::ai::AiOrchestrator;
use crate::game::consensus::{GlobalHintConsensus, Progress};
use crate::types::{seconds_to_ticks, Phase, Player, PlayerId, Question, RoundId};
use std::collections::{HashMap, HashSet};

/// Per player, per round. `solved` and `failed` are terminal and never cleared within a round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerAttemptState {
    pub name: String,
    pub attempts_used: u32,
    pub guessed_once: bool,
    pub solved: bool,
    pub failed: bool,
    pub ai_validation_pending: bool,
    pub ai_validation_round_id: Option<RoundId>,
    /// Guess text waiting on the judge, used for the wrong-guess broadcast
    pub pending_guess_display: Option<String>,
    pub last_hint_millis: u64,
    pub last_hint_round_id: Option<RoundId>,
}

impl PlayerAttemptState {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.solved || self.failed
    }

    /// At least one wrong attempt and still playing
    pub fn is_hint_eligible(&self) -> bool {
        self.attempts_used > 0 && !self.is_terminal()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub name: String,
    pub reward: Option<String>,
}

/// Everything that belongs to the current round and is dropped with it
#[derive(Debug, Default)]
pub struct RoundState {
    pub active_question: Option<Question>,
    pub players: HashMap<PlayerId, PlayerAttemptState>,
    pub consensus: GlobalHintConsensus,
    /// Latch fired but the hint request has not been admitted yet
    pub pending_global_hint: bool,
    pub(super) announced_progress: Option<Progress>,
    winners: Vec<Winner>,
}

impl RoundState {
    pub fn new(question: Question) -> Self {
        Self {
            active_question: Some(question),
            ..Self::default()
        }
    }

    /// Attempt state for `player`, created on first use
    pub fn player_mut(&mut self, player: &Player) -> &mut PlayerAttemptState {
        let state = self
            .players
            .entry(player.id.clone())
            .or_insert_with(|| PlayerAttemptState::new(&player.name));
        state.name.clone_from(&player.name);
        state
    }

    pub fn eligible_players(&self) -> HashSet<PlayerId> {
        self.players
            .iter()
            .filter(|(_, state)| state.is_hint_eligible())
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn attempted_count(&self) -> usize {
        self.players.values().filter(|s| s.guessed_once).count()
    }

    pub fn winners(&self) -> &[Winner] {
        &self.winners
    }

    pub(super) fn push_winner(&mut self, name: &str, reward: Option<String>) {
        self.winners.push(Winner {
            name: name.to_string(),
            reward,
        });
    }
}

impl TriviaGame {
    pub(super) fn start_round(&mut self) {
        let config = self.config.snapshot();
        let Some(question) = self.selector.pick(&self.pool) else {
            tracing::warn!(
                "No trivia questions available, retrying in {}s",
                EMPTY_POOL_RETRY_SECONDS
            );
            self.phase = Phase::Cooldown;
            self.phase_ticks_remaining = seconds_to_ticks(EMPTY_POOL_RETRY_SECONDS);
            return;
        };

        self.round_id += 1;
        self.round = RoundState::new(question.clone());
        self.phase = Phase::Active;
        self.phase_ticks_remaining = seconds_to_ticks(config.question_duration_seconds);
        tracing::info!(
            "Trivia round {} started: {}",
            self.round_id,
            question.question
        );

        self.messenger
            .broadcast(&format!("Trivia: {}", question.question));
        if config.show_answer_instructions {
            let mut line = format!(
                "Answer with {}<answer> (tries: {}, time: {}s)",
                config.answer_prefix,
                config.tries_text(),
                config.question_duration_seconds
            );
            if AiOrchestrator::hints_available(&config) {
                line.push_str(&format!(
                    " | {}hint after a wrong guess",
                    config.answer_prefix
                ));
            }
            line.push_str(" | Admin: /trivia hint off to hide this line");
            self.messenger.broadcast(&line);
        }
    }

    pub(super) fn end_round(&mut self) {
        let answer = self
            .round
            .active_question
            .as_ref()
            .map(|q| q.answer.trim_end().to_string())
            .unwrap_or_default();

        let mut timed_out: Vec<Player> = self
            .round
            .players
            .iter_mut()
            .filter(|(_, state)| state.guessed_once && !state.is_terminal())
            .map(|(id, state)| {
                state.failed = true;
                Player::new(id.clone(), state.name.clone())
            })
            .collect();
        timed_out.sort_by(|a, b| a.id.cmp(&b.id));
        for player in &timed_out {
            self.punisher.apply(player, "time limit");
        }

        tracing::info!(
            "Trivia round {} ended: {} solved, {} timed out",
            self.round_id,
            self.round.winners().len(),
            timed_out.len()
        );
        self.messenger
            .broadcast(&format!("Trivia: time is up. Answer: {}", answer));
        if self.round.winners().is_empty() {
            self.messenger.broadcast("Trivia: nobody solved it.");
        } else {
            let names: Vec<String> = self
                .round
                .winners()
                .iter()
                .map(|w| match &w.reward {
                    Some(reward) => format!("{} ({})", w.name, reward),
                    None => w.name.clone(),
                })
                .collect();
            self.messenger
                .broadcast(&format!("Trivia: solved by {}", names.join(", ")));
        }

        self.reset_to_cooldown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriviaConfig;
    use crate::game::test_support::*;
    use crate::types::TICKS_PER_SECOND;

    #[test]
    fn test_eligible_players_excludes_terminal_and_untried() {
        let mut round = RoundState::new(Question::new("Q", "A"));
        round.player_mut(&alice()).attempts_used = 1;
        round.player_mut(&bob()).guessed_once = true;
        let carol_state = round.player_mut(&carol());
        carol_state.attempts_used = 2;
        carol_state.failed = true;
        let dave_state = round.player_mut(&dave());
        dave_state.attempts_used = 1;
        dave_state.solved = true;

        let eligible = round.eligible_players();
        assert_eq!(eligible.len(), 1);
        assert!(eligible.contains(&alice().id));
    }

    #[test]
    fn test_start_round_broadcasts_prompt_and_instructions() {
        let mut h = Harness::new(TriviaConfig::default());
        h.game.force_start_if_idle();

        let broadcasts = h.messenger.broadcasts();
        assert_eq!(broadcasts[0], "Trivia: What is the capital of France?");
        assert!(broadcasts[1].starts_with("Answer with .<answer> (tries: 3, time: 60s)"));
    }

    #[test]
    fn test_instructions_line_can_be_hidden() {
        let mut h = Harness::new(TriviaConfig {
            show_answer_instructions: false,
            ..TriviaConfig::default()
        });
        h.game.force_start_if_idle();
        assert_eq!(h.messenger.broadcasts().len(), 1);
    }

    #[test]
    fn test_end_round_penalizes_unresolved_guessers_only() {
        let mut h = Harness::new(TriviaConfig {
            question_duration_seconds: 1,
            ..TriviaConfig::default()
        });
        h.game.force_start_if_idle();
        h.game.submit_guess(&alice(), ".Lyon");
        h.game.submit_guess(&bob(), ".Paris");

        h.tick_n(TICKS_PER_SECOND);

        assert_eq!(
            h.penalties(),
            vec![(alice().id, "time limit".to_string())]
        );
        let broadcasts = h.messenger.broadcasts();
        assert!(broadcasts.contains(&"Trivia: time is up. Answer: Paris".to_string()));
        assert!(broadcasts.contains(&"Trivia: solved by Bob (1x minecraft:diamond (Diamond))".to_string()));
    }

    #[test]
    fn test_end_round_with_no_winners() {
        let mut h = Harness::new(TriviaConfig {
            question_duration_seconds: 1,
            ..TriviaConfig::default()
        });
        h.game.force_start_if_idle();
        h.tick_n(TICKS_PER_SECOND);

        assert!(h.penalties().is_empty());
        assert_eq!(
            h.messenger.broadcasts().last().map(String::as_str),
            Some("Trivia: nobody solved it.")
        );
    }
}
