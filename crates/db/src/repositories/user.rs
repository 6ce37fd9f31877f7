//! User repository.

use std::sync::Arc;

use crate::entities::{User, user, user_profile};
use greenwatch_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, SqlErr, TransactionTrait, sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by phone number.
    pub async fn find_by_phone(&self, phone: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Phone.eq(phone))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by login identifier (email or phone).
    pub async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Email.eq(identifier))
                    .add(user::Column::Phone.eq(identifier)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a user together with their empty profile row, atomically.
    ///
    /// A unique violation on email or phone maps to
    /// [`AppError::DuplicateIdentity`] and leaves no partial user behind.
    pub async fn create_with_profile(
        &self,
        user_model: user::ActiveModel,
        profile_model: user_profile::ActiveModel,
    ) -> AppResult<user::Model> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let user = match user_model.insert(&txn).await {
            Ok(user) => user,
            Err(e) => {
                txn.rollback()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                return Err(signup_insert_error(e.sql_err(), &e));
            }
        };

        profile_model
            .insert(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(user)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Adjust a user's points atomically (single UPDATE query, no fetch).
    pub async fn adjust_points(&self, user_id: &str, delta: i32) -> AppResult<()> {
        User::update_many()
            .col_expr(
                user::Column::Points,
                Expr::col(user::Column::Points).add(delta),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get the top users by points.
    ///
    /// Ordered by points descending, ties broken by ID ascending. IDs are
    /// ULIDs, so the tie-break is signup order.
    pub async fn top_by_points(&self, limit: u64) -> AppResult<Vec<user::Model>> {
        User::find()
            .order_by_desc(user::Column::Points)
            .order_by_asc(user::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count users strictly ahead of the given user in leaderboard order.
    ///
    /// The user's 1-based rank is this count plus one.
    pub async fn count_ranked_ahead(&self, points: i32, user_id: &str) -> AppResult<u64> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Points.gt(points))
                    .add(
                        Condition::all()
                            .add(user::Column::Points.eq(points))
                            .add(user::Column::Id.lt(user_id)),
                    ),
            )
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Map a failed user insert to the API error.
///
/// The unique indexes on email and phone backstop the service-level
/// duplicate pre-checks; a violation means the identity is taken.
fn signup_insert_error(sql_err: Option<SqlErr>, err: &sea_orm::DbErr) -> AppError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(msg)) => AppError::DuplicateIdentity(msg),
        _ => AppError::Database(err.to_string()),
    }
}
