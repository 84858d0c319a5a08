use crate::auth::AdminAuth;
use crate::broadcast::BroadcastMessenger;
use crate::runtime::GameHandle;
use std::sync::Arc;

/// Shared by every connection
#[derive(Clone)]
pub struct AppState {
    pub game: GameHandle,
    /// Outbound chat, fanned out to every socket
    pub messenger: BroadcastMessenger,
    pub auth: Arc<AdminAuth>,
}

impl AppState {
    pub fn new(game: GameHandle, messenger: BroadcastMessenger, auth: Arc<AdminAuth>) -> Self {
        Self {
            game,
            messenger,
            auth,
        }
    }
}
