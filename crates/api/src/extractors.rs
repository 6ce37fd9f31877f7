//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use greenwatch_common::AppError;
use greenwatch_db::entities::user;

/// Authenticated user extractor.
///
/// Reads the user the auth middleware stashed in request extensions and
/// rejects with [`AppError::Unauthorized`] when the request carried no
/// valid session.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<user::Model>()
            .cloned()
            .map(AuthUser)
            .ok_or(AppError::Unauthorized)
    }
}
