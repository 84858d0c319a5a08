//! Admin token check for the command surface

use axum::{
    body::Body,
    extract::{rejection::QueryRejection, Query, State},
    http::{Request, Response, StatusCode, Uri},
    middleware::Next,
};
use std::sync::Arc;

use crate::ws::WsQuery;

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Shared secret for admin connections (None = auth disabled)
    pub token: Option<String>,
}

impl AdminAuth {
    /// Load from `TRIVIA_ADMIN_TOKEN`
    pub fn from_env() -> Self {
        let token = std::env::var("TRIVIA_ADMIN_TOKEN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        if token.is_some() {
            tracing::info!("Admin authentication enabled");
        } else {
            tracing::warn!(
                "Admin authentication DISABLED - anyone can run trivia commands! Set TRIVIA_ADMIN_TOKEN"
            );
        }
        Self { token }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn validate(&self, token: Option<&str>) -> bool {
        match (&self.token, token) {
            (Some(expected), Some(given)) => constant_time_eq(expected.as_bytes(), given.as_bytes()),
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Decode the upgrade query the same way the WebSocket handler does
fn decode_query(uri: &Uri) -> Result<WsQuery, QueryRejection> {
    Query::<WsQuery>::try_from_uri(uri).map(|Query(params)| params)
}

fn status_response(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
}

/// Reject admin WebSocket upgrades that do not carry the admin token.
pub async fn admin_ws_auth_middleware(
    State(auth): State<Arc<AdminAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response<Body> {
    let params = match decode_query(request.uri()) {
        Ok(params) => params,
        Err(e) => {
            tracing::warn!("Rejected WebSocket with a malformed query: {}", e);
            return status_response(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };
    if !params.wants_admin() || auth.validate(params.token.as_deref()) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected admin WebSocket with a bad token");
    status_response(StatusCode::UNAUTHORIZED, "Unauthorized")
}
