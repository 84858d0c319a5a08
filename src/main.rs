use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chat_trivia::ai::{
    spawn_ai_workers, AiOrchestrator, JudgeService, LlmJudge, RateLimiter, UnavailableJudge,
    AI_REQUEST_INTERVAL,
};
use chat_trivia::auth::AdminAuth;
use chat_trivia::broadcast::{BroadcastMessenger, Messenger};
use chat_trivia::config::{config_dir_from_env, ConfigStore, QUESTIONS_FILE, SETTINGS_FILE};
use chat_trivia::game::{Collaborators, TriviaGame};
use chat_trivia::punish::EffectPunisher;
use chat_trivia::questions::JsonQuestionFile;
use chat_trivia::reward::ItemPoolRewarder;
use chat_trivia::runtime::{spawn_game_loop, Ticking, TICK_INTERVAL};
use chat_trivia::state::AppState;
use chat_trivia::{llm, server};

const OUTBOUND_CHAT_CAPACITY: usize = 256;

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_trivia=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting chat trivia...");

    let config_dir = config_dir_from_env();
    let config = ConfigStore::open(config_dir.join(SETTINGS_FILE));
    let snapshot = config.snapshot();

    // Judge backend. Built once; credential changes need a restart.
    let judge: Arc<dyn JudgeService> = match llm::build_provider(&snapshot) {
        Ok(provider) => {
            tracing::info!("LLM provider initialized: {}", provider.name());
            Arc::new(LlmJudge::new(provider))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to initialize LLM provider: {}. AI validation and hints will not be available.",
                e
            );
            Arc::new(UnavailableJudge::new(e.to_string()))
        }
    };
    let (ai, jobs) = AiOrchestrator::with_queue(RateLimiter::new(AI_REQUEST_INTERVAL));
    let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
    spawn_ai_workers(judge, jobs, outcomes_tx);

    let messenger = BroadcastMessenger::new(OUTBOUND_CHAT_CAPACITY);
    let shared_messenger: Arc<dyn Messenger> = Arc::new(messenger.clone());
    let collaborators = Collaborators {
        rewarder: Box::new(ItemPoolRewarder::new(&snapshot)),
        punisher: Box::new(EffectPunisher::new(&snapshot, shared_messenger.clone())),
        messenger: shared_messenger,
    };
    let game = TriviaGame::new(
        config,
        Box::new(JsonQuestionFile::new(config_dir.join(QUESTIONS_FILE))),
        collaborators,
        ai,
    );
    let (game_handle, _game_task) =
        spawn_game_loop(game, outcomes_rx, Ticking::Interval(TICK_INTERVAL));

    let state = Arc::new(AppState::new(
        game_handle,
        messenger,
        Arc::new(AdminAuth::from_env()),
    ));
    let app = server::router(state);

    // 6573 is ascii for "AI"
    let addr: SocketAddr = std::env::var("TRIVIA_BIND")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 6573)));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
