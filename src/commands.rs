//! Admin commands
//!
//! Lines such as `/trivia status` or `/trivia battle name off` are parsed into an
//! [`AdminCommand`] and applied on the game loop. Every flag change is persisted first and
//! then takes effect through a reload.

use crate::config::TriviaConfig;
use crate::game::TriviaGame;
use crate::types::Phase;
use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown trivia command: {0}")]
    Unknown(String),

    #[error("Usage: /trivia {0}")]
    Usage(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandReply {
    pub ok: bool,
    pub text: String,
}

impl CommandReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            ok: true,
            text: text.into(),
        }
    }

    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            ok: false,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
    Toggle,
}

impl Switch {
    fn parse(word: Option<&str>) -> Option<Self> {
        match word? {
            "on" | "enable" => Some(Switch::On),
            "off" | "disable" => Some(Switch::Off),
            "toggle" => Some(Switch::Toggle),
            _ => None,
        }
    }

    fn apply(self, current: bool) -> bool {
        match self {
            Switch::On => true,
            Switch::Off => false,
            Switch::Toggle => !current,
        }
    }
}

/// Boolean settings reachable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Enabled,
    AnswerInstructions,
    WrongGuessBroadcast,
    WrongGuesserName,
    AnnounceCorrect,
    Ai,
    GlobalHintConsensus,
}

impl Flag {
    fn label(self) -> &'static str {
        match self {
            Flag::Enabled => "Trivia",
            Flag::AnswerInstructions => "Answer instructions",
            Flag::WrongGuessBroadcast => "Battle mode wrong-guess broadcast",
            Flag::WrongGuesserName => "Battle mode guesser names",
            Flag::AnnounceCorrect => "Correct-guess announcements",
            Flag::Ai => "AI",
            Flag::GlobalHintConsensus => "Global hint consensus",
        }
    }

    fn get(self, config: &TriviaConfig) -> bool {
        match self {
            Flag::Enabled => config.enabled,
            Flag::AnswerInstructions => config.show_answer_instructions,
            Flag::WrongGuessBroadcast => config.battle_mode_wrong_guess_broadcast,
            Flag::WrongGuesserName => config.battle_mode_show_wrong_guesser_name,
            Flag::AnnounceCorrect => config.announce_correct_guesses,
            Flag::Ai => config.ai_enabled,
            Flag::GlobalHintConsensus => config.ai_global_hint_consensus,
        }
    }

    fn set(self, config: &mut TriviaConfig, value: bool) {
        let field = match self {
            Flag::Enabled => &mut config.enabled,
            Flag::AnswerInstructions => &mut config.show_answer_instructions,
            Flag::WrongGuessBroadcast => &mut config.battle_mode_wrong_guess_broadcast,
            Flag::WrongGuesserName => &mut config.battle_mode_show_wrong_guesser_name,
            Flag::AnnounceCorrect => &mut config.announce_correct_guesses,
            Flag::Ai => &mut config.ai_enabled,
            Flag::GlobalHintConsensus => &mut config.ai_global_hint_consensus,
        };
        *field = value;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Status,
    Reload,
    /// Start a question now if none is active
    Ask,
    Set(Flag, Switch),
}

impl AdminCommand {
    /// Parse a command line. The leading `/trivia` is optional.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let lowered = line.trim().to_lowercase();
        let mut words = lowered.split_whitespace().peekable();
        if matches!(words.peek(), Some(&"/trivia") | Some(&"trivia")) {
            words.next();
        }

        let Some(verb) = words.next() else {
            return Err(CommandError::Usage(
                "<enable|disable|toggle|status|reload|ask|hint|battle|announce|ai|globalhint>",
            ));
        };

        let flag = |flag: Flag, usage: &'static str, word: Option<&str>| {
            Switch::parse(word)
                .map(|switch| AdminCommand::Set(flag, switch))
                .ok_or(CommandError::Usage(usage))
        };

        let command = match verb {
            "enable" => AdminCommand::Set(Flag::Enabled, Switch::On),
            "disable" => AdminCommand::Set(Flag::Enabled, Switch::Off),
            "toggle" => AdminCommand::Set(Flag::Enabled, Switch::Toggle),
            "status" => AdminCommand::Status,
            "reload" => AdminCommand::Reload,
            "ask" | "next" => AdminCommand::Ask,
            "hint" => flag(Flag::AnswerInstructions, "hint <on|off|toggle>", words.next())?,
            "announce" => flag(Flag::AnnounceCorrect, "announce <on|off|toggle>", words.next())?,
            "ai" => flag(Flag::Ai, "ai <on|off|toggle>", words.next())?,
            "globalhint" => flag(
                Flag::GlobalHintConsensus,
                "globalhint <on|off|toggle>",
                words.next(),
            )?,
            "battle" => match words.next() {
                Some("name") => flag(
                    Flag::WrongGuesserName,
                    "battle name <on|off|toggle>",
                    words.next(),
                )?,
                other => flag(
                    Flag::WrongGuessBroadcast,
                    "battle <on|off|toggle> | battle name <on|off|toggle>",
                    other,
                )?,
            },
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }

    pub fn execute(self, game: &mut TriviaGame) -> CommandReply {
        match self {
            AdminCommand::Status => CommandReply::ok(status_text(game)),
            AdminCommand::Reload => {
                game.reload();
                CommandReply::ok("Trivia reloaded.")
            }
            AdminCommand::Ask => {
                if !game.config().enabled {
                    return CommandReply::failed("Trivia is disabled.");
                }
                if game.phase() == Phase::Active {
                    return CommandReply::failed("A trivia question is already active.");
                }
                if game.force_start_if_idle() {
                    CommandReply::ok("Started a new trivia question.")
                } else {
                    CommandReply::failed("No trivia questions available.")
                }
            }
            AdminCommand::Set(flag, switch) => set_flag(game, flag, switch),
        }
    }
}

fn set_flag(game: &mut TriviaGame, flag: Flag, switch: Switch) -> CommandReply {
    let current = flag.get(&game.config());
    let wanted = switch.apply(current);
    let state = if wanted { "enabled" } else { "disabled" };
    if wanted == current {
        return CommandReply::ok(format!("{} is already {}.", flag.label(), state));
    }

    match game.update_config(|cfg| flag.set(cfg, wanted)) {
        Ok(_) => {
            tracing::info!("{} {}", flag.label(), state);
            CommandReply::ok(format!("{} {}.", flag.label(), state))
        }
        Err(e) => {
            tracing::error!("Failed to save trivia settings: {}", e);
            CommandReply::failed(format!("Failed to save settings: {}", e))
        }
    }
}

fn status_text(game: &TriviaGame) -> String {
    let status = game.status();
    let config = game.config();
    let mut text = format!(
        "Trivia is {}. Phase: {:?}, round {}, {}s left, {} questions loaded.",
        if status.enabled { "enabled" } else { "disabled" },
        status.phase,
        status.round_id,
        status.seconds_remaining,
        status.question_pool_size
    );
    if let Some(question) = &status.active_question {
        text.push_str(&format!(
            " Question: {} Answer: {} ({} attempted, {} solved)",
            question.question,
            question.answer,
            status.players_attempted,
            status.players_solved
        ));
    }
    text.push_str(&format!(
        " AI: {}{}.",
        if config.ai_configured() {
            "on"
        } else if config.ai_enabled {
            "on (no credentials)"
        } else {
            "off"
        },
        if config.ai_global_hint_consensus {
            ", global hints"
        } else {
            ""
        }
    ));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::test_support::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(AdminCommand::parse("/trivia status"), Ok(AdminCommand::Status));
        assert_eq!(AdminCommand::parse("reload"), Ok(AdminCommand::Reload));
        assert_eq!(AdminCommand::parse("/trivia next"), Ok(AdminCommand::Ask));
        assert_eq!(
            AdminCommand::parse("/trivia DISABLE"),
            Ok(AdminCommand::Set(Flag::Enabled, Switch::Off))
        );
        assert_eq!(
            AdminCommand::parse("/trivia battle name toggle"),
            Ok(AdminCommand::Set(Flag::WrongGuesserName, Switch::Toggle))
        );
        assert_eq!(
            AdminCommand::parse("/trivia battle off"),
            Ok(AdminCommand::Set(Flag::WrongGuessBroadcast, Switch::Off))
        );
        assert_eq!(
            AdminCommand::parse("/trivia globalhint on"),
            Ok(AdminCommand::Set(Flag::GlobalHintConsensus, Switch::On))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            AdminCommand::parse("/trivia dance"),
            Err(CommandError::Unknown("dance".to_string()))
        );
        assert!(matches!(
            AdminCommand::parse("/trivia hint maybe"),
            Err(CommandError::Usage(_))
        ));
        assert!(matches!(
            AdminCommand::parse("/trivia"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn test_flag_already_set() {
        let mut h = Harness::new(TriviaConfig::default());
        let reply = AdminCommand::Set(Flag::Enabled, Switch::On).execute(&mut h.game);
        assert_eq!(reply, CommandReply::ok("Trivia is already enabled."));
    }

    #[test]
    fn test_toggle_flips_and_persists_in_snapshot() {
        let mut h = Harness::new(TriviaConfig::default());
        let reply = AdminCommand::parse("/trivia announce toggle")
            .unwrap()
            .execute(&mut h.game);
        assert!(reply.ok);
        assert_eq!(reply.text, "Correct-guess announcements disabled.");
        assert!(!h.game.config().announce_correct_guesses);
    }

    #[test]
    fn test_disable_stops_the_round() {
        let mut h = Harness::new(TriviaConfig::default());
        h.game.force_start_if_idle();

        let reply = AdminCommand::parse("disable").unwrap().execute(&mut h.game);

        assert!(reply.ok);
        assert_eq!(h.game.phase(), Phase::Cooldown);
        assert!(!h.game.submit_guess(&alice(), ".Paris"));
    }

    #[test]
    fn test_ask_refuses_when_active_or_disabled() {
        let mut h = Harness::new(TriviaConfig::default());
        assert!(AdminCommand::Ask.execute(&mut h.game).ok);

        let reply = AdminCommand::Ask.execute(&mut h.game);
        assert_eq!(
            reply,
            CommandReply::failed("A trivia question is already active.")
        );

        AdminCommand::Set(Flag::Enabled, Switch::Off).execute(&mut h.game);
        assert_eq!(
            AdminCommand::Ask.execute(&mut h.game),
            CommandReply::failed("Trivia is disabled.")
        );
    }

    #[test]
    fn test_ask_with_empty_pool() {
        let mut h = Harness::with_questions(TriviaConfig::default(), vec![]);
        assert_eq!(
            AdminCommand::Ask.execute(&mut h.game),
            CommandReply::failed("No trivia questions available.")
        );
    }

    #[test]
    fn test_status_shows_answer_to_admin() {
        let mut h = Harness::new(TriviaConfig::default());
        h.game.force_start_if_idle();
        let reply = AdminCommand::Status.execute(&mut h.game);
        assert!(reply.text.contains("Phase: Active, round 1"));
        assert!(reply.text.contains("Answer: Paris"));
    }
}
