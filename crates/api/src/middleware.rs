//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use greenwatch_core::{
    AccountService, LeaderboardService, ReportService, RewardService, SessionService,
};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub session_service: SessionService,
    pub report_service: ReportService,
    pub leaderboard_service: LeaderboardService,
    pub reward_service: RewardService,
}

/// Authentication middleware.
///
/// Resolves the session token from the `Authorization: Bearer` header or the
/// session cookie and stashes the user in request extensions. Requests with
/// no token or a stale token simply proceed unauthenticated; handlers that
/// need a user reject via the [`crate::extractors::AuthUser`] extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&req) {
        match state.session_service.authenticate(&token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => {
                tracing::debug!(error = %e, "session token rejected");
            }
        }
    }

    next.run(req).await
}

fn extract_token(req: &Request<Body>) -> Option<String> {
    if let Some(auth_header) = req.headers().get(header::AUTHORIZATION)
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.to_string());
    }

    let jar = CookieJar::from_headers(req.headers());
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}
