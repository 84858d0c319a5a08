use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth, state::AppState, ws};

/// HTTP routes: the chat WebSocket, with admin upgrades gated by token
pub fn router(state: Arc<AppState>) -> Router {
    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth::admin_ws_auth_middleware,
        ));

    Router::new()
        .merge(ws_routes)
        .route("/health", get(|| async { "ok" }))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
