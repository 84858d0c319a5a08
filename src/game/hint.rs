use super::consensus::{Progress, VoteOutcome};
use super::guess::AI_BUSY_MESSAGE;
use super::TriviaGame;
use crate::ai::{now_millis, Admission, AiJob, AiJobKind, AiOrchestrator, HintScope};
use crate::config::TriviaConfig;
use crate::types::{Phase, Player, RoundId};
use std::time::Duration;

const HINT_KEYWORDS: [&str; 2] = ["hint", "h"];

pub(super) fn is_hint_keyword(body: &str) -> bool {
    let body = body.trim().to_lowercase();
    HINT_KEYWORDS.contains(&body.as_str())
}

fn progress_line(progress: Progress) -> String {
    format!(
        "Trivia: hint requests {}/{}",
        progress.requested, progress.eligible
    )
}

impl TriviaGame {
    pub(super) fn request_hint(&mut self, player: &Player, config: &TriviaConfig) {
        if !AiOrchestrator::hints_available(config) {
            self.messenger
                .send_to_player(&player.id, "Trivia: hints are not available.");
            return;
        }

        let state = self.round.players.get(&player.id);
        let reply = match state {
            Some(s) if s.solved => Some("Trivia: you already solved this one."),
            Some(s) if s.failed => Some("Trivia: you already failed this one."),
            Some(s) if s.attempts_used > 0 => None,
            _ => Some("Trivia: hints unlock after your first wrong guess."),
        };
        if let Some(reply) = reply {
            self.messenger.send_to_player(&player.id, reply);
            return;
        }

        if config.ai_global_hint_consensus {
            self.vote_global_hint(player, config);
        } else {
            self.request_private_hint(player, config);
        }
    }

    fn request_private_hint(&mut self, player: &Player, config: &TriviaConfig) {
        let round_id = self.round_id;
        let now = now_millis();
        let cooldown_ms = config.ai_hint_cooldown_seconds.saturating_mul(1000);

        let state = self.round.player_mut(player);
        if state.last_hint_round_id == Some(round_id) {
            let elapsed = now.saturating_sub(state.last_hint_millis);
            if elapsed < cooldown_ms {
                let wait = (cooldown_ms - elapsed).div_ceil(1000);
                self.messenger.send_to_player(
                    &player.id,
                    &format!("Trivia: next hint available in {}s.", wait),
                );
                return;
            }
        }

        match self.submit_hint_job(HintScope::Private(player.id.clone()), config) {
            Admission::Queued => {
                let state = self.round.player_mut(player);
                state.last_hint_millis = now;
                state.last_hint_round_id = Some(round_id);
                self.messenger
                    .send_to_player(&player.id, "Trivia: generating a hint...");
            }
            Admission::Busy => self.messenger.send_to_player(&player.id, AI_BUSY_MESSAGE),
        }
    }

    fn vote_global_hint(&mut self, player: &Player, config: &TriviaConfig) {
        let eligible = self.round.eligible_players();
        match self.round.consensus.vote(&player.id, &eligible) {
            VoteOutcome::NotEligible => self.messenger.send_to_player(
                &player.id,
                "Trivia: you can't request a hint right now.",
            ),
            VoteOutcome::AlreadyRevealed => self
                .messenger
                .send_to_player(&player.id, "Trivia: the hint was already revealed."),
            VoteOutcome::AlreadyRequested(progress) => self.messenger.send_to_player(
                &player.id,
                &format!(
                    "Trivia: you already requested a hint ({}/{}).",
                    progress.requested, progress.eligible
                ),
            ),
            VoteOutcome::Recorded(progress) => {
                self.round.announced_progress = Some(progress);
                self.messenger.broadcast(&format!(
                    "Trivia: {} wants a hint ({}/{}). Everyone still guessing must ask.",
                    player.name, progress.requested, progress.eligible
                ));
            }
            VoteOutcome::Unanimous(progress) => {
                self.round.announced_progress = Some(progress);
                self.messenger.broadcast(&progress_line(progress));
                self.reveal_global_hint(config);
            }
        }
    }

    /// Re-check consensus after someone entered or left the eligible set
    pub(super) fn refresh_consensus(&mut self, config: &TriviaConfig) {
        if !config.ai_global_hint_consensus || !AiOrchestrator::hints_available(config) {
            return;
        }
        let eligible = self.round.eligible_players();
        let Some(update) = self.round.consensus.eligibility_changed(&eligible) else {
            return;
        };
        if self.round.announced_progress != Some(update.progress) {
            self.round.announced_progress = Some(update.progress);
            self.messenger.broadcast(&progress_line(update.progress));
        }
        if update.unanimous {
            self.reveal_global_hint(config);
        }
    }

    fn reveal_global_hint(&mut self, config: &TriviaConfig) {
        tracing::info!("Global hint consensus reached in round {}", self.round_id);
        self.messenger
            .broadcast("Trivia: everyone asked for a hint. Generating one...");
        self.round.pending_global_hint = true;
        self.dispatch_global_hint(config);
    }

    /// Submit the global hint if it is still waiting for admission. Called every tick.
    pub(super) fn retry_global_hint(&mut self, config: &TriviaConfig) {
        if self.round.pending_global_hint {
            self.dispatch_global_hint(config);
        }
    }

    fn dispatch_global_hint(&mut self, config: &TriviaConfig) {
        match self.submit_hint_job(HintScope::Global, config) {
            Admission::Queued => self.round.pending_global_hint = false,
            Admission::Busy => {
                tracing::debug!("Global hint not admitted yet, retrying next tick");
            }
        }
    }

    fn submit_hint_job(&self, scope: HintScope, config: &TriviaConfig) -> Admission {
        let Some(question) = self.round.active_question.clone() else {
            return Admission::Busy;
        };
        self.ai.submit(AiJob {
            round_id: self.round_id,
            question: question.question,
            answer: question.answer,
            timeout: Duration::from_secs(config.ai_request_timeout_seconds),
            kind: AiJobKind::Hint { scope },
        })
    }

    pub(super) fn deliver_hint(&mut self, scope: HintScope, round_id: RoundId, text: &str) {
        if self.phase != Phase::Active || round_id != self.round_id {
            tracing::debug!("Dropping stale hint for round {}", round_id);
            return;
        }
        let line = format!("Trivia hint: {}", text);
        match scope {
            HintScope::Private(player) => self.messenger.send_to_player(&player, &line),
            HintScope::Global => self.messenger.broadcast(&line),
        }
    }
}
