//! Reward endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::{get, post},
};
use greenwatch_common::AppResult;
use greenwatch_core::reward::ClaimedReward;
use greenwatch_db::entities::reward;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Reward catalog response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogResponse {
    pub rewards: Vec<reward::Model>,
}

/// Claim response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub claim_id: String,
    pub reward_id: String,
    /// The caller's balance after the debit.
    pub points: i32,
}

/// List active rewards. Session-gated like the rest of the reward flow.
async fn catalog(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<CatalogResponse>> {
    let rewards = state.reward_service.catalog().await?;
    Ok(ApiResponse::ok(CatalogResponse { rewards }))
}

/// Claim a reward.
async fn claim(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ClaimResponse>> {
    let claim = state.reward_service.claim(&user.id, &id).await?;

    // Re-read the standing for the post-debit balance.
    let standing = state.leaderboard_service.standing(&user.id).await?;

    Ok(ApiResponse::ok(ClaimResponse {
        claim_id: claim.id,
        reward_id: claim.reward_id,
        points: standing.points,
    }))
}

/// Claimed rewards response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedResponse {
    pub claimed: Vec<ClaimedReward>,
}

/// List the caller's claimed rewards, newest first.
async fn claimed(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<ClaimedResponse>> {
    let claimed = state.reward_service.claims_of(&user.id).await?;
    Ok(ApiResponse::ok(ClaimedResponse { claimed }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog))
        .route("/claimed", get(claimed))
        .route("/{id}/claim", post(claim))
}
