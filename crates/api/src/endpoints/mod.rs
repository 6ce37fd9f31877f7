//! API endpoints.

mod auth;
mod dashboard;
mod home;
mod leaderboard;
mod reports;
mod rewards;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/home", home::router())
        .nest("/dashboard", dashboard::router())
        .nest("/reports", reports::router())
        .nest("/leaderboard", leaderboard::router())
        .nest("/rewards", rewards::router())
}
