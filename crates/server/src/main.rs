//! Greenwatch server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use greenwatch_api::{AppState, router as api_router};
use greenwatch_classifier::Classifier;
use greenwatch_common::{Config, LocalStorage, StorageBackend};
use greenwatch_core::{
    AccountService, LeaderboardService, ReportService, RewardService, SessionService,
};
use greenwatch_db::repositories::{
    ReportRepository, RewardRepository, SessionRepository, UserProfileRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Uploaded photos are capped at this many bytes.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// How often expired sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Load the classifier named in the configuration, if any.
///
/// A missing or broken model degrades the service instead of stopping it:
/// submissions simply land as pending.
fn load_classifier(config: &Config) -> Option<Arc<Classifier>> {
    if config.classifier.model_path.is_none() {
        info!("no classifier model configured, submissions will not be auto-verified");
        return None;
    }

    match Classifier::load(&config.classifier) {
        Ok(classifier) => Some(Arc::new(classifier)),
        Err(e) => {
            warn!(error = %e, "classifier failed to load, continuing without it");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "greenwatch=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting greenwatch server...");

    let config = Config::load()?;

    let db = greenwatch_db::connect(&config.database).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    greenwatch_db::migrate(&db).await?;
    info!("Migrations completed");

    // Classifier load is an explicit startup step, not a lazy global.
    let classifier = load_classifier(&config);

    let storage: Arc<dyn StorageBackend> = Arc::new(LocalStorage::new(
        config.storage.base_path.clone(),
        config.storage.base_url.clone(),
    ));

    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let session_repo = SessionRepository::new(Arc::clone(&db));
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let reward_repo = RewardRepository::new(Arc::clone(&db));

    let account_service = AccountService::new(user_repo.clone(), profile_repo);
    let session_service = SessionService::new(session_repo, user_repo.clone(), &config.session);
    let report_service = ReportService::new(report_repo, storage, classifier, &config.classifier);
    let leaderboard_service = LeaderboardService::new(user_repo);
    let reward_service = RewardService::new(reward_repo);

    let state = AppState {
        account_service,
        session_service: session_service.clone(),
        report_service,
        leaderboard_service,
        reward_service,
    };

    // Periodic sweep of expired session rows.
    let sweeper = session_service;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = sweeper.purge_expired().await {
                tracing::error!(error = %e, "session sweep failed");
            }
        }
    });

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            greenwatch_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
