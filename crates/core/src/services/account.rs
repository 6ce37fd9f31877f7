//! Account service for registration, login and profiles.

use chrono::Utc;
use greenwatch_common::{AppError, AppResult};
use greenwatch_db::{
    entities::{user, user::Role, user_profile},
    repositories::{UserProfileRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for creating an account.
///
/// At least one of `email` and `phone` must be present; both identify the
/// account at login and are unique across users.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 64))]
    pub first_name: String,
    #[validate(length(max = 64))]
    #[serde(default)]
    pub last_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 32))]
    pub phone: Option<String>,
    #[validate(length(min = 8, max = 128))]
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
}

/// Input for logging in with an email or phone identifier.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginInput {
    #[validate(length(min = 1, max = 256))]
    pub identifier: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Input for updating the caller's profile.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(max = 2048))]
    pub bio: Option<String>,
    #[validate(length(max = 512))]
    pub address: Option<String>,
    #[validate(length(max = 1024))]
    pub avatar_url: Option<String>,
    #[validate(length(max = 256))]
    pub location: Option<String>,
}

/// Account service.
#[derive(Clone)]
pub struct AccountService {
    user_repo: UserRepository,
    profile_repo: UserProfileRepository,
}

impl AccountService {
    /// Create a new account service.
    #[must_use]
    pub const fn new(user_repo: UserRepository, profile_repo: UserProfileRepository) -> Self {
        Self {
            user_repo,
            profile_repo,
        }
    }

    /// Register a new account.
    ///
    /// Fails with [`AppError::DuplicateIdentity`] when the email or phone is
    /// already registered. New accounts start with zero points; the role
    /// defaults to community when none is supplied.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        if input.password != input.confirm_password {
            return Err(AppError::Validation("passwords do not match".to_string()));
        }
        if input.email.is_none() && input.phone.is_none() {
            return Err(AppError::Validation(
                "either email or phone is required".to_string(),
            ));
        }

        if let Some(email) = &input.email
            && self.user_repo.find_by_email(email).await?.is_some()
        {
            return Err(AppError::DuplicateIdentity(email.clone()));
        }
        if let Some(phone) = &input.phone
            && self.user_repo.find_by_phone(phone).await?.is_some()
        {
            return Err(AppError::DuplicateIdentity(phone.clone()));
        }

        let name = match &input.last_name {
            Some(last) if !last.is_empty() => format!("{} {last}", input.first_name),
            _ => input.first_name.clone(),
        };

        let password_hash = hash_password(&input.password)?;
        let user_id = crate::generate_id();
        let now = Utc::now();

        let model = user::ActiveModel {
            id: Set(user_id.clone()),
            name: Set(name),
            email: Set(input.email),
            phone: Set(input.phone),
            password_hash: Set(password_hash),
            role: Set(input.role.unwrap_or(Role::Community)),
            location: Set(input.location),
            points: Set(0),
            badges: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        let profile = user_profile::ActiveModel {
            user_id: Set(user_id.clone()),
            bio: Set(None),
            address: Set(None),
            avatar_url: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };

        // The pre-checks race with concurrent signups; the unique indexes
        // settle it inside the transaction.
        let user = self.user_repo.create_with_profile(model, profile).await?;

        tracing::info!(user_id = %user.id, "account registered");

        Ok(user)
    }

    /// Verify login credentials.
    ///
    /// The identifier is matched against both email and phone. An unknown
    /// identifier is [`AppError::UserNotFound`]; a wrong password is
    /// [`AppError::InvalidCredential`].
    pub async fn login(&self, input: LoginInput) -> AppResult<user::Model> {
        input.validate()?;

        let Some(user) = self.user_repo.find_by_identifier(&input.identifier).await? else {
            return Err(AppError::UserNotFound(input.identifier));
        };

        if !verify_password(&input.password, &user.password_hash)? {
            return Err(AppError::InvalidCredential);
        }

        Ok(user)
    }

    /// Fetch a user with their optional profile row.
    pub async fn get_with_profile(
        &self,
        user_id: &str,
    ) -> AppResult<(user::Model, Option<user_profile::Model>)> {
        let user = self.user_repo.get_by_id(user_id).await?;
        let profile = self.profile_repo.find_by_user_id(user_id).await?;
        Ok((user, profile))
    }

    /// Update the caller's profile, creating the profile row on first write.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
    ) -> AppResult<user_profile::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;

        if let Some(location) = &input.location {
            let mut active: user::ActiveModel = user.into();
            active.location = Set(Some(location.clone()));
            active.updated_at = Set(Some(Utc::now().into()));
            self.user_repo.update(active).await?;
        }

        let profile = match self.profile_repo.find_by_user_id(user_id).await? {
            Some(existing) => {
                let mut active: user_profile::ActiveModel = existing.into();
                if let Some(bio) = input.bio {
                    active.bio = Set(Some(bio));
                }
                if let Some(address) = input.address {
                    active.address = Set(Some(address));
                }
                if let Some(avatar_url) = input.avatar_url {
                    active.avatar_url = Set(Some(avatar_url));
                }
                active.updated_at = Set(Some(Utc::now().into()));
                self.profile_repo.update(active).await?
            }
            None => {
                let model = user_profile::ActiveModel {
                    user_id: Set(user_id.to_string()),
                    bio: Set(input.bio),
                    address: Set(input.address),
                    avatar_url: Set(input.avatar_url),
                    created_at: Set(Utc::now().into()),
                    updated_at: Set(None),
                };
                self.profile_repo.create(model).await?
            }
        };

        Ok(profile)
    }
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    use argon2::{
        Argon2, PasswordHasher,
        password_hash::{SaltString, rand_core::OsRng},
    };

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    use argon2::{Argon2, PasswordVerifier, password_hash::PasswordHash};

    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn service(db: sea_orm::DatabaseConnection) -> AccountService {
        let db = Arc::new(db);
        AccountService::new(
            UserRepository::new(db.clone()),
            UserProfileRepository::new(db),
        )
    }

    fn existing_user(password_hash: &str) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            name: "alice".to_string(),
            email: Some("alice@example.com".to_string()),
            phone: None,
            password_hash: password_hash.to_string(),
            role: Role::Community,
            location: None,
            points: 0,
            badges: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    fn register_input() -> RegisterInput {
        RegisterInput {
            first_name: "Alice".to_string(),
            last_name: Some("Moser".to_string()),
            email: Some("alice@example.com".to_string()),
            phone: None,
            password: "hunter2hunter2".to_string(),
            confirm_password: "hunter2hunter2".to_string(),
            role: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_register_requires_identifier() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut input = register_input();
        input.email = None;
        input.phone = None;

        let result = svc.register(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_password_mismatch_rejected() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let mut input = register_input();
        input.confirm_password = "something-else".to_string();

        let result = svc.register(input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let taken = existing_user("$argon2id$stub");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[taken]])
            .into_connection();
        let svc = service(db);

        let result = svc.register(register_input()).await;

        match result {
            Err(AppError::DuplicateIdentity(id)) => assert_eq!(id, "alice@example.com"),
            _ => panic!("Expected DuplicateIdentity error"),
        }
    }

    #[tokio::test]
    async fn test_login_unknown_identifier_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let svc = service(db);

        let result = svc
            .login(LoginInput {
                identifier: "nobody@example.com".to_string(),
                password: "whatever".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_invalid_credential() {
        let hash = hash_password("correct-horse-battery").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing_user(&hash)]])
            .into_connection();
        let svc = service(db);

        let result = svc
            .login(LoginInput {
                identifier: "alice@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_login_success_returns_user() {
        let hash = hash_password("correct-horse-battery").unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing_user(&hash)]])
            .into_connection();
        let svc = service(db);

        let user = svc
            .login(LoginInput {
                identifier: "alice@example.com".to_string(),
                password: "correct-horse-battery".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(user.id, "user1");
    }
}
