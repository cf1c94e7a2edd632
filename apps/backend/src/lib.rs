pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocab_core::ReviewDate;

use crate::config::Config;
use crate::db::SqliteRepository;
use crate::services::replication::RemoteReplicator;
use crate::services::sessions::SessionRegistry;
use crate::services::store::CardStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CardStore>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(store: CardStore) -> Self {
        Self::with_sessions(store, SessionRegistry::new())
    }

    pub fn with_sessions(store: CardStore, sessions: SessionRegistry) -> Self {
        Self {
            store: Arc::new(store),
            sessions: Arc::new(sessions),
        }
    }
}

/// How often idle study sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Build the full router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Card routes
        .route("/api/cards", get(routes::cards::list).post(routes::cards::create))
        .route("/api/cards/import", post(routes::cards::import))
        .route(
            "/api/cards/:id",
            get(routes::cards::get)
                .put(routes::cards::update)
                .delete(routes::cards::delete),
        )
        // Study routes
        .route("/api/study/sessions", post(routes::study::start))
        .route(
            "/api/study/sessions/:id",
            get(routes::study::get).delete(routes::study::end),
        )
        .route("/api/study/sessions/:id/check", post(routes::study::check))
        .route("/api/study/sessions/:id/tier", post(routes::study::set_tier))
        .route("/api/study/sessions/:id/schedule", post(routes::study::schedule))
        .route("/api/study/sessions/:id/next", post(routes::study::next))
        .route("/api/study/sessions/:id/previous", post(routes::study::previous))
        .route("/api/study/sessions/:id/summary", get(routes::study::summary))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!("Opening card store at {}", config.database_path.display());
    let repo = SqliteRepository::open(&config.database_path)?;

    let remote = match &config.remote_sync_url {
        Some(url) => {
            tracing::info!("Remote sync enabled: {}", url);
            Some(Arc::new(RemoteReplicator::new(url, config.remote_sync_timeout)?))
        }
        None => {
            tracing::info!("Remote sync disabled");
            None
        }
    };

    let store = CardStore::new(repo, remote)?;
    store.seed_from_remote(ReviewDate::today()).await;

    let sessions = SessionRegistry::with_limits(config.session_idle_ttl, config.max_sessions);
    let state = AppState::with_sessions(store, sessions);
    spawn_session_sweeper(Arc::clone(&state.sessions));

    let app = build_router(state);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn spawn_session_sweeper(sessions: Arc<SessionRegistry>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let evicted = sessions.sweep().await;
            if evicted > 0 {
                let live = sessions.len().await;
                tracing::debug!(evicted, live, "idle study sessions swept");
            }
        }
    });
}

async fn health_check() -> &'static str {
    "OK"
}
