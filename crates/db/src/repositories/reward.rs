//! Reward repository.

use std::sync::Arc;

use crate::entities::{Reward, UserReward, reward, user, user_reward};
use greenwatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, SqlErr, TransactionTrait,
    sea_query::Expr,
};

/// Reward repository for the catalog and claim bookkeeping.
#[derive(Clone)]
pub struct RewardRepository {
    db: Arc<DatabaseConnection>,
}

impl RewardRepository {
    /// Create a new reward repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// List active rewards, cheapest first.
    pub async fn find_active(&self) -> AppResult<Vec<reward::Model>> {
        Reward::find()
            .filter(reward::Column::IsActive.eq(true))
            .order_by_asc(reward::Column::PointsRequired)
            .order_by_asc(reward::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reward by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<reward::Model>> {
        Reward::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a reward by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<reward::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("reward {id} not found")))
    }

    /// Insert a reward into the catalog.
    pub async fn create(&self, model: reward::ActiveModel) -> AppResult<reward::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Claim a reward for a user in one transaction.
    ///
    /// Inserts the claim row first, so a concurrent duplicate claim trips
    /// the unique `(user_id, reward_id)` constraint before any points move.
    /// The debit is guarded (`points >= cost` in the WHERE clause); zero
    /// rows affected means the balance was short and the whole transaction
    /// rolls back.
    pub async fn claim(
        &self,
        claim: user_reward::ActiveModel,
        user_id: &str,
        cost: i32,
    ) -> AppResult<user_reward::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let claimed = match claim.insert(&txn).await {
            Ok(model) => model,
            Err(e) => {
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                return Err(claim_insert_error(e.sql_err(), &e));
            }
        };

        let debit = user::Entity::update_many()
            .col_expr(
                user::Column::Points,
                Expr::col(user::Column::Points).sub(cost),
            )
            .filter(user::Column::Id.eq(user_id))
            .filter(user::Column::Points.gte(cost))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if debit.rows_affected == 0 {
            let available = user::Entity::find_by_id(user_id)
                .one(&txn)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?
                .map_or(0, |u| u.points);
            txn.rollback()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Err(AppError::InsufficientPoints {
                required: cost,
                available,
            });
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(claimed)
    }

    /// All claims by a user, newest first.
    pub async fn find_claims_by_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<user_reward::Model>> {
        UserReward::find()
            .filter(user_reward::Column::UserId.eq(user_id))
            .order_by_desc(user_reward::Column::ClaimedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Fetch catalog rows for a set of reward IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<reward::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Reward::find()
            .filter(reward::Column::Id.is_in(ids.iter().map(String::as_str)))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Map a failed claim-row insert to the API error.
///
/// The unique `(user_id, reward_id)` index is what enforces at-most-once
/// claiming; tripping it means this user already holds the reward.
fn claim_insert_error(sql_err: Option<SqlErr>, err: &sea_orm::DbErr) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::AlreadyClaimed,
        _ => AppError::Database(err.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{ActiveValue::Set, DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_reward(id: &str, cost: i32) -> reward::Model {
        reward::Model {
            id: id.to_string(),
            title: "Reusable bottle".to_string(),
            description: "Steel bottle from the city recycling program".to_string(),
            points_required: cost,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    fn claim_model(id: &str, user_id: &str, reward_id: &str) -> user_reward::ActiveModel {
        user_reward::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            reward_id: Set(reward_id.to_string()),
            claimed_at: Set(Utc::now().into()),
        }
    }

    #[tokio::test]
    async fn test_find_active_returns_catalog() {
        let rewards = vec![create_test_reward("rw1", 20), create_test_reward("rw2", 50)];

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rewards])
                .into_connection(),
        );

        let repo = RewardRepository::new(db);
        let result = repo.find_active().await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].points_required, 20);
    }

    #[tokio::test]
    async fn test_claim_success_commits() {
        let claimed = user_reward::Model {
            id: "claim1".to_string(),
            user_id: "user1".to_string(),
            reward_id: "rw1".to_string(),
            claimed_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[claimed.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = RewardRepository::new(db);
        let result = repo
            .claim(claim_model("claim1", "user1", "rw1"), "user1", 20)
            .await
            .unwrap();

        assert_eq!(result.reward_id, "rw1");
    }

    #[tokio::test]
    async fn test_claim_short_balance_is_insufficient_points() {
        let claimed = user_reward::Model {
            id: "claim1".to_string(),
            user_id: "user1".to_string(),
            reward_id: "rw1".to_string(),
            claimed_at: Utc::now().into(),
        };
        let poor_user = user::Model {
            id: "user1".to_string(),
            name: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            password_hash: "$argon2id$stub".to_string(),
            role: user::Role::Community,
            location: None,
            points: 5,
            badges: None,
            created_at: Utc::now().into(),
            updated_at: None,
        };

        // Claim insert succeeds, guarded debit matches zero rows, then the
        // balance is read back for the error payload.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[claimed]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .append_query_results([[poor_user]])
                .into_connection(),
        );

        let repo = RewardRepository::new(db);
        let result = repo
            .claim(claim_model("claim1", "user1", "rw1"), "user1", 20)
            .await;

        match result {
            Err(AppError::InsufficientPoints {
                required,
                available,
            }) => {
                assert_eq!(required, 20);
                assert_eq!(available, 5);
            }
            _ => panic!("Expected InsufficientPoints error"),
        }
    }

    #[test]
    fn test_duplicate_claim_maps_to_already_claimed() {
        let db_err = sea_orm::DbErr::Custom("duplicate key".to_string());

        let mapped = claim_insert_error(
            Some(SqlErr::UniqueConstraintViolation(
                "idx_user_reward_user_reward".to_string(),
            )),
            &db_err,
        );
        assert!(matches!(mapped, AppError::AlreadyClaimed));

        // Anything else stays a database error.
        let mapped = claim_insert_error(None, &db_err);
        assert!(matches!(mapped, AppError::Database(_)));
    }
}
