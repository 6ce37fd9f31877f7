//! Reward service: catalog listing and claims.

use chrono::Utc;
use greenwatch_common::{AppError, AppResult};
use greenwatch_db::{
    entities::{reward, user_reward},
    repositories::RewardRepository,
};
use sea_orm::Set;
use serde::Serialize;

/// A reward the caller has claimed, joined with its catalog entry.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimedReward {
    pub claim: user_reward::Model,
    pub reward: Option<reward::Model>,
}

/// Reward service.
#[derive(Clone)]
pub struct RewardService {
    reward_repo: RewardRepository,
}

impl RewardService {
    /// Create a new reward service.
    #[must_use]
    pub const fn new(reward_repo: RewardRepository) -> Self {
        Self { reward_repo }
    }

    /// Active rewards, cheapest first.
    pub async fn catalog(&self) -> AppResult<Vec<reward::Model>> {
        self.reward_repo.find_active().await
    }

    /// Claim a reward for a user.
    ///
    /// Inactive and unknown rewards are not claimable. The claim row insert
    /// and the guarded points debit are one transaction in the repository,
    /// so concurrent double-claims and overdrafts cannot slip through.
    pub async fn claim(&self, user_id: &str, reward_id: &str) -> AppResult<user_reward::Model> {
        let reward = self.reward_repo.get_by_id(reward_id).await?;

        if !reward.is_active {
            return Err(AppError::BadRequest(format!(
                "reward {reward_id} is no longer active"
            )));
        }

        let model = user_reward::ActiveModel {
            id: Set(crate::generate_id()),
            user_id: Set(user_id.to_string()),
            reward_id: Set(reward_id.to_string()),
            claimed_at: Set(Utc::now().into()),
        };

        let claim = self
            .reward_repo
            .claim(model, user_id, reward.points_required)
            .await?;

        tracing::info!(
            user_id = user_id,
            reward_id = reward_id,
            cost = reward.points_required,
            "reward claimed"
        );

        Ok(claim)
    }

    /// The caller's claims, newest first, with catalog details attached.
    pub async fn claims_of(&self, user_id: &str) -> AppResult<Vec<ClaimedReward>> {
        let claims = self.reward_repo.find_claims_by_user(user_id).await?;

        let reward_ids: Vec<String> = claims.iter().map(|c| c.reward_id.clone()).collect();
        let rewards = self.reward_repo.find_by_ids(&reward_ids).await?;

        Ok(claims
            .into_iter()
            .map(|claim| {
                let reward = rewards.iter().find(|r| r.id == claim.reward_id).cloned();
                ClaimedReward { claim, reward }
            })
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_reward(id: &str, cost: i32, active: bool) -> reward::Model {
        reward::Model {
            id: id.to_string(),
            title: "Tote bag".to_string(),
            description: "Organic cotton tote".to_string(),
            points_required: cost,
            is_active: active,
            created_at: Utc::now().into(),
        }
    }

    fn service(db: sea_orm::DatabaseConnection) -> RewardService {
        RewardService::new(RewardRepository::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn test_claim_unknown_reward_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<reward::Model>::new()])
            .into_connection();

        let result = service(db).claim("user1", "missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_claim_inactive_reward_is_bad_request() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_reward("rw1", 20, false)]])
            .into_connection();

        let result = service(db).claim("user1", "rw1").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_claim_active_reward_succeeds() {
        let claim = user_reward::Model {
            id: "claim1".to_string(),
            user_id: "user1".to_string(),
            reward_id: "rw1".to_string(),
            claimed_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_reward("rw1", 20, true)]])
            .append_query_results([[claim]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let claimed = service(db).claim("user1", "rw1").await.unwrap();
        assert_eq!(claimed.reward_id, "rw1");
    }

    #[tokio::test]
    async fn test_claims_of_joins_catalog_details() {
        let claim = user_reward::Model {
            id: "claim1".to_string(),
            user_id: "user1".to_string(),
            reward_id: "rw1".to_string(),
            claimed_at: Utc::now().into(),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[claim]])
            .append_query_results([[test_reward("rw1", 20, true)]])
            .into_connection();

        let claims = service(db).claims_of("user1").await.unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].reward.as_ref().unwrap().title, "Tote bag");
    }
}
