//! Trivia settings
//!
//! Settings are read from `settings.json` into an immutable [`TriviaConfig`] snapshot.
//! The game only ever holds an `Arc` to a snapshot; changes build a new snapshot and swap it in.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const SETTINGS_FILE: &str = "settings.json";
pub const QUESTIONS_FILE: &str = "questions.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// An item that can be handed out as a reward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardItem {
    pub id: String,
    pub name: String,
    #[serde(default = "default_max_stack")]
    pub max_stack: u32,
}

fn default_max_stack() -> u32 {
    64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TriviaConfig {
    pub enabled: bool,

    pub question_duration_seconds: u64,
    pub cooldown_seconds: u64,

    /// Max attempts per player per round, -1 for unlimited
    pub max_attempts: i32,
    pub answer_prefix: String,
    pub show_answer_instructions: bool,

    /// Broadcast "<player> guessed correctly!"
    pub announce_correct_guesses: bool,
    /// Broadcast wrong guesses to everyone
    pub battle_mode_wrong_guess_broadcast: bool,
    pub battle_mode_show_wrong_guesser_name: bool,

    /// Items per reward, <= 0 picks a random count
    pub reward_count_override: i32,
    pub reward_items: Vec<RewardItem>,
    pub item_blacklist: Vec<String>,

    pub punish_effects: Vec<String>,
    pub punish_effect_duration_seconds_min: u32,
    pub punish_effect_duration_seconds_max: u32,
    pub punish_effect_amplifier_min: u32,
    pub punish_effect_amplifier_max: u32,

    pub fuzzy_matching_enabled: bool,
    pub fuzzy_max_edit_distance: i32,

    pub ai_enabled: bool,
    pub open_ai_api_key: String,
    pub open_ai_model: String,
    pub ollama_base_url: Option<String>,
    pub ai_request_timeout_seconds: u64,
    pub ai_semantic_answer_validation: bool,
    pub ai_hint_cooldown_seconds: u64,
    pub ai_global_hint_consensus: bool,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            question_duration_seconds: 60,
            cooldown_seconds: 540,
            max_attempts: 3,
            answer_prefix: ".".to_string(),
            show_answer_instructions: true,
            announce_correct_guesses: true,
            battle_mode_wrong_guess_broadcast: true,
            battle_mode_show_wrong_guesser_name: true,
            reward_count_override: -1,
            reward_items: default_reward_items(),
            item_blacklist: vec!["minecraft:air".to_string()],
            punish_effects: default_punish_effects(),
            punish_effect_duration_seconds_min: 10,
            punish_effect_duration_seconds_max: 600,
            punish_effect_amplifier_min: 1,
            punish_effect_amplifier_max: 10,
            fuzzy_matching_enabled: true,
            fuzzy_max_edit_distance: 1,
            ai_enabled: false,
            open_ai_api_key: String::new(),
            open_ai_model: "gpt-4o-mini".to_string(),
            ollama_base_url: None,
            ai_request_timeout_seconds: 10,
            ai_semantic_answer_validation: true,
            ai_hint_cooldown_seconds: 30,
            ai_global_hint_consensus: false,
        }
    }
}

fn default_reward_items() -> Vec<RewardItem> {
    [
        ("minecraft:diamond", "Diamond", 64),
        ("minecraft:emerald", "Emerald", 64),
        ("minecraft:golden_apple", "Golden Apple", 64),
        ("minecraft:ender_pearl", "Ender Pearl", 16),
        ("minecraft:diamond_sword", "Diamond Sword", 1),
    ]
    .into_iter()
    .map(|(id, name, max_stack)| RewardItem {
        id: id.to_string(),
        name: name.to_string(),
        max_stack,
    })
    .collect()
}

fn default_punish_effects() -> Vec<String> {
    ["slowness", "mining_fatigue", "nausea", "blindness", "hunger", "weakness"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl TriviaConfig {
    /// Clamp out-of-range values so consumers never see a partially-invalid snapshot
    pub fn sanitized(mut self) -> Self {
        if self.answer_prefix.trim().is_empty() {
            self.answer_prefix = ".".to_string();
        }
        self.question_duration_seconds = self.question_duration_seconds.max(1);
        self.cooldown_seconds = self.cooldown_seconds.max(1);
        if self.max_attempts < -1 {
            self.max_attempts = -1;
        }
        self.fuzzy_max_edit_distance = self.fuzzy_max_edit_distance.max(0);
        self.ai_request_timeout_seconds = self.ai_request_timeout_seconds.max(1);
        if self.open_ai_model.trim().is_empty() {
            self.open_ai_model = "gpt-4o-mini".to_string();
        }
        self.ollama_base_url = self
            .ollama_base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let (lo, hi) = ordered_min_one(
            self.punish_effect_duration_seconds_min,
            self.punish_effect_duration_seconds_max,
        );
        self.punish_effect_duration_seconds_min = lo;
        self.punish_effect_duration_seconds_max = hi;
        let (lo, hi) = ordered_min_one(
            self.punish_effect_amplifier_min,
            self.punish_effect_amplifier_max,
        );
        self.punish_effect_amplifier_min = lo;
        self.punish_effect_amplifier_max = hi;

        for item in &mut self.reward_items {
            item.max_stack = item.max_stack.max(1);
        }
        self
    }

    /// Apply credential overrides from the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(key) = env_non_empty("OPENAI_API_KEY") {
            self.open_ai_api_key = key;
        }
        if let Some(model) = env_non_empty("OPENAI_MODEL") {
            self.open_ai_model = model;
        }
        if let Some(url) = env_non_empty("OLLAMA_BASE_URL") {
            self.ollama_base_url = Some(url);
        }
        self
    }

    /// True when the AI feature is switched on and some provider has credentials
    pub fn ai_configured(&self) -> bool {
        self.ai_enabled
            && (!self.open_ai_api_key.trim().is_empty() || self.ollama_base_url.is_some())
    }

    pub fn tries_text(&self) -> String {
        if self.max_attempts < 0 {
            "unlimited".to_string()
        } else {
            self.max_attempts.to_string()
        }
    }
}

fn ordered_min_one(a: u32, b: u32) -> (u32, u32) {
    let a = a.max(1);
    let b = b.max(1);
    (a.min(b), a.max(b))
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Directory holding settings and questions, from `TRIVIA_CONFIG_DIR` or `./config/trivia`
pub fn config_dir_from_env() -> PathBuf {
    env_non_empty("TRIVIA_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config").join("trivia"))
}

/// Owner of the active settings snapshot
pub struct ConfigStore {
    path: Option<PathBuf>,
    current: Arc<TriviaConfig>,
}

impl ConfigStore {
    /// In-memory store, nothing is persisted
    pub fn in_memory(config: TriviaConfig) -> Self {
        Self {
            path: None,
            current: Arc::new(config.sanitized()),
        }
    }

    /// Load from `path`, writing defaults first if the file does not exist.
    /// Any failure falls back to defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let config = match load_or_create(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("Failed to load trivia settings: {}; using defaults", e);
                TriviaConfig::default()
            }
        };
        Self {
            path: Some(path),
            current: Arc::new(config.with_env_overrides().sanitized()),
        }
    }

    pub fn snapshot(&self) -> Arc<TriviaConfig> {
        Arc::clone(&self.current)
    }

    /// Re-read the settings file and swap the snapshot
    pub fn reload(&mut self) {
        let Some(path) = self.path.clone() else {
            return;
        };
        match load_or_create(&path) {
            Ok(config) => {
                self.current = Arc::new(config.with_env_overrides().sanitized());
                tracing::info!("Trivia settings reloaded from {}", path.display());
            }
            Err(e) => {
                tracing::error!("Failed to reload trivia settings: {}; keeping current", e);
            }
        }
    }

    /// Build a modified snapshot, persist it, and swap it in
    pub fn update(
        &mut self,
        edit: impl FnOnce(&mut TriviaConfig),
    ) -> Result<Arc<TriviaConfig>, ConfigError> {
        let mut next = (*self.current).clone();
        edit(&mut next);
        let next = next.sanitized();
        if let Some(path) = &self.path {
            save(path, &next)?;
        }
        self.current = Arc::new(next);
        Ok(self.snapshot())
    }
}

fn load_or_create(path: &Path) -> Result<TriviaConfig, ConfigError> {
    if !path.exists() {
        save(path, &TriviaConfig::default())?;
    }
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

fn save(path: &Path, config: &TriviaConfig) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    // Credentials from the environment are not written back.
    let mut on_disk = config.clone();
    if env_non_empty("OPENAI_API_KEY").as_deref() == Some(config.open_ai_api_key.as_str()) {
        on_disk.open_ai_api_key = String::new();
    }
    let json = serde_json::to_string_pretty(&on_disk)?;
    std::fs::write(path, json).map_err(io_err)
}
