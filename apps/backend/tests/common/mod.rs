//! Common test utilities and fixtures for integration tests.
//!
//! Every context runs against its own in-memory SQLite database, so tests
//! need no external services.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::TestServer;
use uuid::Uuid;
use vocab_core::{Card, CardPatch};

use vocab_trainer_backend::build_router;
use vocab_trainer_backend::db::{CardRepository, SqliteRepository};
use vocab_trainer_backend::services::replication::RemoteReplicator;
use vocab_trainer_backend::services::sessions::LiveSession;
use vocab_trainer_backend::services::store::CardStore;
use vocab_trainer_backend::AppState;

/// Test context holding the shared state and router.
pub struct TestContext {
    pub state: AppState,
    app: Router,
}

impl TestContext {
    /// Empty deck, no remote replication.
    pub fn new() -> Self {
        Self::with_cards(&[])
    }

    /// Deck pre-loaded with `cards`, no remote replication.
    pub fn with_cards(cards: &[Card]) -> Self {
        Self::build(cards, None)
    }

    /// Deck pre-loaded with `cards`, replicating to `url`.
    pub fn with_remote(cards: &[Card], url: &str) -> Self {
        let remote = RemoteReplicator::new(url, Duration::from_millis(500))
            .expect("Failed to build replicator");
        Self::build(cards, Some(Arc::new(remote)))
    }

    fn build(cards: &[Card], remote: Option<Arc<RemoteReplicator>>) -> Self {
        let repo = SqliteRepository::open_in_memory().expect("Failed to open in-memory database");
        for card in cards {
            repo.upsert_card(&CardPatch::from(card))
                .expect("Failed to seed card");
        }

        let store = CardStore::new(repo, remote).expect("Failed to open card store");
        let state = AppState::new(store);
        let app = build_router(state.clone());

        Self { state, app }
    }

    /// Get the router for use with axum-test.
    pub fn router(&self) -> Router {
        self.app.clone()
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(self.router()).expect("Failed to start test server")
    }

    /// Stored copy of a card.
    pub async fn stored_card(&self, id: &str) -> Card {
        self.state
            .store
            .get(id)
            .await
            .expect("Failed to read card")
            .unwrap_or_else(|| panic!("card {id} not stored"))
    }

    /// Live session behind an id returned by the API.
    pub async fn live_session(&self, id: &str) -> Arc<LiveSession> {
        let id: Uuid = id.parse().expect("session id is not a uuid");
        self.state
            .sessions
            .get(id)
            .await
            .expect("session not registered")
    }
}
