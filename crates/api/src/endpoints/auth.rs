//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use greenwatch_common::AppResult;
use greenwatch_core::account::{LoginInput, RegisterInput};
use serde::Serialize;

use crate::{
    extractors::AuthUser,
    middleware::{AppState, SESSION_COOKIE},
    response::{ApiResponse, UserView},
};

/// Signup/signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: UserView,
    /// Opaque session token, also set as an HTTP-only cookie.
    pub token: String,
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

/// Create a new account and start a session.
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterInput>,
) -> AppResult<(CookieJar, ApiResponse<SessionResponse>)> {
    let user = state.account_service.register(req).await?;
    let session = state.session_service.issue(&user.id).await?;

    let jar = jar.add(session_cookie(session.id.clone()));

    Ok((
        jar,
        ApiResponse::ok(SessionResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginInput>,
) -> AppResult<(CookieJar, ApiResponse<SessionResponse>)> {
    let user = state.account_service.login(req).await?;
    let session = state.session_service.issue(&user.id).await?;

    let jar = jar.add(session_cookie(session.id.clone()));

    Ok((
        jar,
        ApiResponse::ok(SessionResponse {
            user: user.into(),
            token: session.id,
        }),
    ))
}

/// Signout response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignoutResponse {
    pub ok: bool,
}

/// Sign out, revoking every session of the caller.
///
/// Revoking by user rather than by token also signs out clients that
/// authenticated with the bearer header instead of the cookie.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<SignoutResponse>)> {
    state.session_service.revoke_all(&user.id).await?;

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());

    Ok((jar, ApiResponse::ok(SignoutResponse { ok: true })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(signin))
        .route("/logout", post(signout))
}
