//! Authenticated dashboard data.

use axum::{Json, Router, extract::State, routing::{get, post}};
use greenwatch_common::AppResult;
use greenwatch_core::{
    account::UpdateProfileInput, leaderboard::Standing, report::ReportStats,
    reward::ClaimedReward,
};
use greenwatch_db::entities::user_profile;
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, ReportView, UserView},
};

const MY_RECENT_REPORTS: u64 = 5;

/// Dashboard payload: who the caller is, their standing, their latest
/// reports and the site-wide report counters.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub user: UserView,
    pub profile: Option<user_profile::Model>,
    pub standing: Standing,
    pub my_reports: Vec<ReportView>,
    pub claimed_rewards: Vec<ClaimedReward>,
    pub stats: ReportStats,
}

async fn dashboard(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<DashboardResponse>> {
    let (user, profile) = state.account_service.get_with_profile(&user.id).await?;
    let standing = state.leaderboard_service.standing(&user.id).await?;
    let my_reports = state
        .report_service
        .recent_by_user(&user.id, MY_RECENT_REPORTS)
        .await?;
    let claimed_rewards = state.reward_service.claims_of(&user.id).await?;
    let stats = state.report_service.stats().await?;

    Ok(ApiResponse::ok(DashboardResponse {
        user: user.into(),
        profile,
        standing,
        my_reports: my_reports.into_iter().map(Into::into).collect(),
        claimed_rewards,
        stats,
    }))
}

/// Update the caller's profile (bio, address, avatar, location).
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<user_profile::Model>> {
    let profile = state.account_service.update_profile(&user.id, req).await?;
    Ok(ApiResponse::ok(profile))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard))
        .route("/profile", post(update_profile))
}
