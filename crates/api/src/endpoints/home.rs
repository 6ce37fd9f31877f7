//! Public landing page data.

use axum::{Router, extract::State, routing::get};
use greenwatch_common::AppResult;
use greenwatch_core::{leaderboard::LeaderboardEntry, report::ReportStats};
use serde::Serialize;

use crate::{middleware::AppState, response::{ApiResponse, ReportView}};

const RECENT_REPORTS: u64 = 5;
const TOP_USERS: u64 = 3;

/// Landing page payload: recent verified reports, headline stats and a
/// leaderboard teaser.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub stats: ReportStats,
    pub recent_reports: Vec<ReportView>,
    pub top_users: Vec<LeaderboardEntry>,
}

async fn home(State(state): State<AppState>) -> AppResult<ApiResponse<HomeResponse>> {
    let stats = state.report_service.stats().await?;
    let recent = state.report_service.recent_verified(RECENT_REPORTS).await?;
    let top_users = state.leaderboard_service.top(TOP_USERS).await?;

    Ok(ApiResponse::ok(HomeResponse {
        stats,
        recent_reports: recent.into_iter().map(Into::into).collect(),
        top_users,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(home))
}
