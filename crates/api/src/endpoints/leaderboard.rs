//! Leaderboard endpoints.

use axum::{Router, extract::State, routing::get};
use greenwatch_common::AppResult;
use greenwatch_core::leaderboard::{DEFAULT_TOP, LeaderboardEntry, Standing};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Leaderboard response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

/// The top users by points.
async fn top(State(state): State<AppState>) -> AppResult<ApiResponse<LeaderboardResponse>> {
    let entries = state.leaderboard_service.top(DEFAULT_TOP).await?;
    Ok(ApiResponse::ok(LeaderboardResponse { entries }))
}

/// The caller's own standing.
async fn me(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Standing>> {
    let standing = state.leaderboard_service.standing(&user.id).await?;
    Ok(ApiResponse::ok(standing))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(top)).route("/me", get(me))
}
