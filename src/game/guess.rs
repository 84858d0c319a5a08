use super::TriviaGame;
use crate::ai::{Admission, AiJob, AiJobKind, AiOrchestrator, Verdict};
use crate::config::TriviaConfig;
use crate::matcher::is_likely_correct;
use crate::reward::Reward;
use crate::types::{Phase, Player, PlayerId, RoundId};
use std::time::Duration;

pub(super) const AI_BUSY_MESSAGE: &str = "Trivia: AI is busy; try again in a moment.";

impl TriviaGame {
    /// Offer a chat line as a trivia attempt.
    ///
    /// Returns `true` when the line was consumed; `false` lets it through as ordinary chat.
    pub fn submit_guess(&mut self, player: &Player, raw: &str) -> bool {
        let config = self.config.snapshot();
        if !config.enabled {
            return false;
        }
        let Some(body) = raw.strip_prefix(config.answer_prefix.as_str()) else {
            return false;
        };
        let Some(question) = self.active_question().cloned() else {
            self.messenger
                .send_to_player(&player.id, "Trivia: no active question right now.");
            return false;
        };

        let guess = body.trim();
        if guess.is_empty() {
            self.messenger
                .send_to_player(&player.id, "Trivia: empty answer.");
            return true;
        }
        if super::hint::is_hint_keyword(guess) {
            self.request_hint(player, &config);
            return true;
        }

        let state = self.round.player_mut(player);
        let reply = if state.solved {
            Some("Trivia: you already solved this one.")
        } else if state.failed {
            Some("Trivia: you already failed this one.")
        } else if state.ai_validation_pending {
            Some("Trivia: still checking your last answer.")
        } else {
            None
        };
        if let Some(reply) = reply {
            self.messenger.send_to_player(&player.id, reply);
            return true;
        }

        if is_likely_correct(
            &question.answer,
            guess,
            config.fuzzy_matching_enabled,
            config.fuzzy_max_edit_distance,
        ) {
            tracing::debug!("{} answered correctly", player.name);
            self.mark_correct(player, &config);
            return true;
        }

        if AiOrchestrator::should_consult(&config, &question.answer, guess) {
            tracing::debug!("{} is close, asking the judge", player.name);
            self.request_validation(player, guess, &config);
            return true;
        }

        tracing::debug!("{} answered wrong", player.name);
        self.mark_wrong(player, guess, &config);
        true
    }

    fn request_validation(&mut self, player: &Player, guess: &str, config: &TriviaConfig) {
        let Some(question) = self.round.active_question.clone() else {
            return;
        };
        let job = AiJob {
            round_id: self.round_id,
            question: question.question,
            answer: question.answer,
            timeout: Duration::from_secs(config.ai_request_timeout_seconds),
            kind: AiJobKind::Validate {
                player: player.id.clone(),
                guess: guess.to_string(),
            },
        };

        match self.ai.submit(job) {
            Admission::Queued => {
                let round_id = self.round_id;
                let state = self.round.player_mut(player);
                state.guessed_once = true;
                state.ai_validation_pending = true;
                state.ai_validation_round_id = Some(round_id);
                state.pending_guess_display = Some(guess.to_string());
                self.messenger
                    .send_to_player(&player.id, "Trivia: checking your answer...");
            }
            // Not counted as an attempt
            Admission::Busy => self.messenger.send_to_player(&player.id, AI_BUSY_MESSAGE),
        }
    }

    /// Apply a judge verdict, unless the round moved on or the player is already resolved
    pub(super) fn finalize_validation(
        &mut self,
        player_id: &PlayerId,
        round_id: RoundId,
        verdict: Verdict,
    ) {
        if self.phase != Phase::Active || round_id != self.round_id {
            tracing::debug!("Dropping stale validation for {} (round {})", player_id, round_id);
            return;
        }
        let Some(state) = self.round.players.get_mut(player_id) else {
            tracing::debug!("Dropping validation for unknown player {}", player_id);
            return;
        };
        if !state.ai_validation_pending
            || state.ai_validation_round_id != Some(round_id)
            || state.is_terminal()
        {
            tracing::debug!("Dropping stale validation for {}", player_id);
            return;
        }

        state.ai_validation_pending = false;
        let guess = state.pending_guess_display.take().unwrap_or_default();
        let player = Player::new(player_id.clone(), state.name.clone());
        let config = self.config.snapshot();

        tracing::debug!(
            "Judge says {} for {}: {}",
            verdict.is_correct,
            player.name,
            verdict.reason
        );
        if verdict.is_correct {
            self.mark_correct(&player, &config);
        } else {
            self.mark_wrong(&player, &guess, &config);
        }
    }

    pub(super) fn mark_correct(&mut self, player: &Player, config: &TriviaConfig) {
        let answer = self
            .round
            .active_question
            .as_ref()
            .map(|q| q.answer.trim_end().to_string())
            .unwrap_or_default();

        let state = self.round.player_mut(player);
        state.guessed_once = true;
        state.solved = true;
        state.ai_validation_pending = false;

        let reward = self.rewarder.grant(player);
        self.round
            .push_winner(&player.name, reward.as_ref().map(Reward::describe));

        self.messenger
            .send_to_player(&player.id, &format!("Trivia: correct. Answer: {}", answer));
        let reward_line = match &reward {
            Some(reward) => format!("Trivia: reward: {}", reward.describe()),
            None => "Trivia: nothing to grant.".to_string(),
        };
        self.messenger.send_to_player(&player.id, &reward_line);
        if config.announce_correct_guesses {
            self.messenger
                .broadcast(&format!("Trivia: {} guessed correctly!", player.name));
        }

        self.refresh_consensus(config);
    }

    pub(super) fn mark_wrong(&mut self, player: &Player, guess: &str, config: &TriviaConfig) {
        let state = self.round.player_mut(player);
        state.guessed_once = true;
        state.attempts_used += 1;
        let attempts = state.attempts_used;
        let exhausted = config.max_attempts >= 0 && attempts as i64 >= config.max_attempts as i64;
        if exhausted {
            state.failed = true;
        }

        if exhausted {
            self.messenger
                .send_to_player(&player.id, "Trivia: wrong. No tries left.");
            self.punisher.apply(player, "max attempts");
        } else {
            let tries_left = if config.max_attempts < 0 {
                "unlimited".to_string()
            } else {
                (config.max_attempts as i64 - attempts as i64).max(0).to_string()
            };
            self.messenger.send_to_player(
                &player.id,
                &format!("Trivia: wrong. Tries left: {}", tries_left),
            );
        }

        if config.battle_mode_wrong_guess_broadcast {
            let who = if config.battle_mode_show_wrong_guesser_name {
                player.name.as_str()
            } else {
                "Someone"
            };
            let mut line = format!("Trivia: {}'s guess of \"{}\" was wrong", who, guess);
            if config.show_answer_instructions {
                line.push_str(&format!(" | answer with {}<answer>", config.answer_prefix));
            }
            self.messenger.broadcast(&line);
        }

        self.refresh_consensus(config);
    }
}
