// Public API for integration tests and the server binary

pub mod ai;
pub mod auth;
pub mod commands;
pub mod config;
pub mod game;
pub mod llm;
pub mod matcher;
pub mod protocol;
pub mod punish;
pub mod questions;
pub mod reward;
pub mod runtime;
pub mod server;
pub mod state;
pub mod types;
pub mod ws;

// Re-export broadcast for testing
pub mod broadcast;
