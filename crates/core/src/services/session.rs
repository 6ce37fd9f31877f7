//! Session service for opaque login tokens.
//!
//! Tokens are random 128-bit values with no client-readable structure; all
//! session state lives server-side and a token stops working the moment its
//! row is deleted or expires.

use chrono::{Duration, Utc};
use greenwatch_common::{AppError, AppResult, IdGenerator, SessionConfig};
use greenwatch_db::{
    entities::{session, user},
    repositories::{SessionRepository, UserRepository},
};
use sea_orm::Set;

/// Session service.
#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionRepository,
    user_repo: UserRepository,
    id_generator: IdGenerator,
    ttl: Duration,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub fn new(
        session_repo: SessionRepository,
        user_repo: UserRepository,
        config: &SessionConfig,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            id_generator: IdGenerator::new(),
            ttl: Duration::days(config.ttl_days),
        }
    }

    /// Issue a fresh session for a user.
    pub async fn issue(&self, user_id: &str) -> AppResult<session::Model> {
        let now = Utc::now();
        let model = session::ActiveModel {
            id: Set(self.id_generator.generate_token()),
            user_id: Set(user_id.to_string()),
            created_at: Set(now.into()),
            expires_at: Set((now + self.ttl).into()),
        };

        let session = self.session_repo.create(model).await?;

        tracing::debug!(user_id = user_id, "session issued");

        Ok(session)
    }

    /// Resolve a token to its user.
    ///
    /// Unknown and expired tokens both map to [`AppError::Unauthorized`].
    /// Expired rows are removed on sight.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let Some(session) = self.session_repo.find_by_token(token).await? else {
            return Err(AppError::Unauthorized);
        };

        if session.expires_at < Utc::now() {
            self.session_repo.delete(token).await?;
            return Err(AppError::Unauthorized);
        }

        self.user_repo.get_by_id(&session.user_id).await
    }

    /// Revoke a single session (logout).
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        self.session_repo.delete(token).await
    }

    /// Revoke every session of a user.
    pub async fn revoke_all(&self, user_id: &str) -> AppResult<u64> {
        self.session_repo.delete_by_user(user_id).await
    }

    /// Remove expired sessions. Intended for a periodic sweep.
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let removed = self.session_repo.delete_expired().await?;
        if removed > 0 {
            tracing::info!(removed = removed, "expired sessions purged");
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use greenwatch_db::entities::user::Role;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn service(db: sea_orm::DatabaseConnection) -> SessionService {
        let db = Arc::new(db);
        SessionService::new(
            SessionRepository::new(db.clone()),
            UserRepository::new(db),
            &SessionConfig { ttl_days: 30 },
        )
    }

    fn test_session(expires_in: Duration) -> session::Model {
        session::Model {
            id: "token".to_string(),
            user_id: "user1".to_string(),
            created_at: Utc::now().into(),
            expires_at: (Utc::now() + expires_in).into(),
        }
    }

    fn test_user() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            name: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Community,
            location: None,
            points: 0,
            badges: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<session::Model>::new()])
            .into_connection();

        let result = service(db).authenticate("missing").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_expired_token_is_unauthorized() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_session(Duration::days(-1))]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let result = service(db).authenticate("token").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_valid_token_resolves_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[test_session(Duration::days(1))]])
            .append_query_results([[test_user()]])
            .into_connection();

        let user = service(db).authenticate("token").await.unwrap();
        assert_eq!(user.id, "user1");
    }
}
