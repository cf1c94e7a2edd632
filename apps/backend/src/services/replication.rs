//! Best-effort replication of the deck to a remote sheet endpoint.
//!
//! The remote copy is replaced wholesale on every change: one `DELETE`
//! followed by a `POST` of the full card list in the sheet's column layout.
//! Replacements run one at a time, and a snapshot that has been superseded
//! before its turn comes is dropped.
//! The local store stays authoritative; failures here are logged and dropped.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use vocab_core::{Card, CardRecord};

/// Replication errors.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote error: {status} - {message}")]
    Remote { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// One card in the remote sheet's column layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRow {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Vietnamese")]
    pub source_text: String,
    #[serde(rename = "English")]
    pub target_text: String,
    #[serde(rename = "Note")]
    pub note: String,
    #[serde(rename = "Image_link")]
    pub image_link: String,
    #[serde(rename = "Created_date")]
    pub created_on: String,
    #[serde(rename = "Next_date")]
    pub next_review_on: String,
    #[serde(rename = "Status")]
    pub tier: String,
    #[serde(rename = "Count")]
    pub miss_count: u32,
}

impl From<&Card> for RemoteRow {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            source_text: card.source_text.clone(),
            target_text: card.target_text.clone(),
            note: card.note.clone(),
            image_link: card.image_link.clone(),
            created_on: card.created_on.clone(),
            next_review_on: card.next_review_on.clone(),
            tier: card.tier.to_string(),
            miss_count: card.miss_count,
        }
    }
}

/// HTTP client for the remote copy.
pub struct RemoteReplicator {
    client: Client,
    url: String,
    /// Held for the whole of one replacement.
    in_progress: Mutex<()>,
    /// Generation of the newest queued snapshot.
    queued: AtomicU64,
}

impl RemoteReplicator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            in_progress: Mutex::new(()),
            queued: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch every remote row as a loose record for ingestion.
    pub async fn fetch_all(&self) -> Result<Vec<CardRecord>, SyncError> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Remote { status, message });
        }

        resp.json::<Vec<CardRecord>>()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))
    }

    /// Replace the remote copy with `cards`.
    pub async fn replace_all(&self, cards: &[Card]) -> Result<(), SyncError> {
        // Clear first; a failed clear still lets the upload go through
        match self.client.delete(&self.url).send().await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::debug!(status = resp.status().as_u16(), "remote clear was not accepted");
            }
            Ok(_) => {}
            Err(e) => return Err(SyncError::Network(e.to_string())),
        }

        let rows: Vec<RemoteRow> = cards.iter().map(RemoteRow::from).collect();
        let resp = self
            .client
            .post(&self.url)
            .json(&rows)
            .send()
            .await
            .map_err(|e| SyncError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(SyncError::Remote { status, message });
        }

        Ok(())
    }

    /// Replace the remote copy in a detached task. The caller never waits on it.
    ///
    /// Snapshots must be queued in the order they were taken.
    pub fn spawn_replace(self: &Arc<Self>, cards: Vec<Card>) {
        let generation = self.queued.fetch_add(1, Ordering::SeqCst) + 1;
        let replicator = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = replicator.in_progress.lock().await;
            if replicator.queued.load(Ordering::SeqCst) != generation {
                tracing::debug!(generation, "remote snapshot superseded, skipped");
                return;
            }
            match replicator.replace_all(&cards).await {
                Ok(()) => tracing::debug!(cards = cards.len(), "remote copy replaced"),
                Err(e) => tracing::warn!(error = %e, "remote sync failed, local copy kept"),
            }
        });
    }
}
