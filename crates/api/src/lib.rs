//! HTTP API layer for greenwatch.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: auth, reports, leaderboard, rewards, dashboard
//! - **Extractors**: authenticated-user extraction from request extensions
//! - **Middleware**: session resolution from cookie or bearer token
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::AppState;
