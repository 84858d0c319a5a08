//! The game loop task
//!
//! One tokio task owns the [`TriviaGame`]. Ticks, chat lines, admin commands and finished AI
//! jobs all arrive here as events and are applied one at a time.

use crate::ai::AiOutcome;
use crate::commands::{AdminCommand, CommandReply};
use crate::game::TriviaGame;
use crate::types::{MessageId, Player, TICKS_PER_SECOND};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// 20 Hz
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / TICKS_PER_SECOND);
const EVENT_QUEUE_CAPACITY: usize = 256;

pub enum GameEvent {
    Tick,
    Chat {
        msg_id: MessageId,
        player: Player,
        text: String,
        reply: oneshot::Sender<bool>,
    },
    Command {
        line: String,
        reply: oneshot::Sender<CommandReply>,
    },
    AiCompleted(AiOutcome),
    Shutdown,
}

/// Where ticks come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ticking {
    Interval(Duration),
    /// Only explicit `GameEvent::Tick`s advance the game
    Manual,
}

/// Cheap, cloneable sender side of the game loop
#[derive(Clone)]
pub struct GameHandle {
    events: mpsc::Sender<GameEvent>,
}

impl GameHandle {
    /// Offer a chat line. `false` means it should be shown as normal chat.
    pub async fn chat(&self, msg_id: MessageId, player: Player, text: String) -> bool {
        let (reply, rx) = oneshot::channel();
        let event = GameEvent::Chat {
            msg_id,
            player,
            text,
            reply,
        };
        if self.events.send(event).await.is_err() {
            return false;
        }
        rx.await.unwrap_or(false)
    }

    pub async fn command(&self, line: impl Into<String>) -> CommandReply {
        let (reply, rx) = oneshot::channel();
        let event = GameEvent::Command {
            line: line.into(),
            reply,
        };
        if self.events.send(event).await.is_err() {
            return CommandReply::failed("Trivia is not running.");
        }
        rx.await
            .unwrap_or_else(|_| CommandReply::failed("Trivia is not running."))
    }

    pub async fn tick(&self) {
        let _ = self.events.send(GameEvent::Tick).await;
    }

    pub async fn ai_completed(&self, outcome: AiOutcome) {
        let _ = self.events.send(GameEvent::AiCompleted(outcome)).await;
    }

    pub async fn shutdown(&self) {
        let _ = self.events.send(GameEvent::Shutdown).await;
    }
}

/// Move `game` into its own task. AI outcomes from the worker pool arrive on `outcomes`.
///
/// The task returns the game when it stops, which happens on `Shutdown` or when every
/// handle has been dropped.
pub fn spawn_game_loop(
    game: TriviaGame,
    outcomes: mpsc::UnboundedReceiver<AiOutcome>,
    ticking: Ticking,
) -> (GameHandle, JoinHandle<TriviaGame>) {
    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let task = tokio::spawn(run_game_loop(game, rx, outcomes, ticking));
    (GameHandle { events: tx }, task)
}

async fn run_game_loop(
    mut game: TriviaGame,
    mut events: mpsc::Receiver<GameEvent>,
    mut outcomes: mpsc::UnboundedReceiver<AiOutcome>,
    ticking: Ticking,
) -> TriviaGame {
    let mut interval = match ticking {
        Ticking::Interval(period) => {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        }
        Ticking::Manual => None,
    };
    tracing::info!("Trivia game loop started ({:?})", ticking);

    loop {
        tokio::select! {
            _ = async {
                match &mut interval {
                    Some(interval) => interval.tick().await,
                    None => std::future::pending::<tokio::time::Instant>().await,
                }
            } => game.tick(),

            Some(outcome) = outcomes.recv() => game.apply_ai_outcome(outcome),

            event = events.recv() => {
                let Some(event) = event else {
                    break;
                };
                if !handle_event(&mut game, event) {
                    break;
                }
            }
        }
    }

    tracing::info!("Trivia game loop stopped");
    game
}

/// Returns `false` when the loop should stop
fn handle_event(game: &mut TriviaGame, event: GameEvent) -> bool {
    match event {
        GameEvent::Tick => game.tick(),
        GameEvent::Chat {
            msg_id,
            player,
            text,
            reply,
        } => {
            let consumed = game.handle_chat(&msg_id, &player, &text);
            let _ = reply.send(consumed);
        }
        GameEvent::Command { line, reply } => {
            let result = match AdminCommand::parse(&line) {
                Ok(command) => {
                    tracing::info!("Admin command: {}", line.trim());
                    command.execute(game)
                }
                Err(e) => CommandReply::failed(e.to_string()),
            };
            let _ = reply.send(result);
        }
        GameEvent::AiCompleted(outcome) => game.apply_ai_outcome(outcome),
        GameEvent::Shutdown => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TriviaConfig;
    use crate::game::test_support::*;
    use crate::types::Phase;

    #[tokio::test]
    async fn test_chat_and_command_round_trip() {
        let h = Harness::new(TriviaConfig::default());
        let messenger = h.messenger.clone();
        let (_outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (handle, task) = spawn_game_loop(h.game, outcomes_rx, Ticking::Manual);

        let reply = handle.command("/trivia ask").await;
        assert!(reply.ok, "{}", reply.text);

        assert!(handle.chat("m1".into(), alice(), ".Paris".into()).await);
        assert!(!handle.chat("m2".into(), alice(), "gg".into()).await);

        handle.shutdown().await;
        let game = task.await.unwrap();
        assert_eq!(game.round().winners().len(), 1);
        assert!(messenger
            .sent_to(&alice().id)
            .contains(&"Trivia: correct. Answer: Paris".to_string()));
    }

    #[tokio::test]
    async fn test_manual_ticks_drive_phases() {
        let h = Harness::new(TriviaConfig {
            cooldown_seconds: 1,
            ..TriviaConfig::default()
        });
        let (_outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (handle, task) = spawn_game_loop(h.game, outcomes_rx, Ticking::Manual);

        for _ in 0..TICKS_PER_SECOND {
            handle.tick().await;
        }
        handle.shutdown().await;

        let game = task.await.unwrap();
        assert_eq!(game.phase(), Phase::Active);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_ticks_at_twenty_hertz() {
        let h = Harness::new(TriviaConfig {
            cooldown_seconds: 2,
            ..TriviaConfig::default()
        });
        let (_outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (handle, task) =
            spawn_game_loop(h.game, outcomes_rx, Ticking::Interval(TICK_INTERVAL));

        tokio::time::sleep(Duration::from_millis(2_100)).await;
        handle.shutdown().await;

        let game = task.await.unwrap();
        assert_eq!(game.phase(), Phase::Active);
        assert_eq!(game.round_id(), 1);
    }

    #[tokio::test]
    async fn test_ai_outcomes_are_applied_on_the_loop() {
        let mut h = Harness::new(ai_config());
        h.game.force_start_if_idle();
        h.game.submit_guess(&alice(), ".Parisian");
        let round_id = h.game.round_id();

        let (_outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (handle, task) = spawn_game_loop(h.game, outcomes_rx, Ticking::Manual);
        handle
            .ai_completed(AiOutcome::Validation {
                player: alice().id,
                round_id,
                verdict: crate::ai::Verdict {
                    is_correct: true,
                    reason: "ok".to_string(),
                },
            })
            .await;
        handle.shutdown().await;

        let game = task.await.unwrap();
        assert!(game.round().players[&alice().id].solved);
    }

    #[tokio::test]
    async fn test_dropped_handles_stop_the_loop() {
        let h = Harness::new(TriviaConfig::default());
        let (_outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let (handle, task) = spawn_game_loop(h.game, outcomes_rx, Ticking::Manual);
        drop(handle);
        assert!(task.await.is_ok());
    }
}
