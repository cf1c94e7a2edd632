//! API request and response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vocab_core::{
    Advance, Card, CardRecord, CheckOutcome, Progress, RejectedRecord, StudySession, SummaryRow,
    Tier,
};

// === Card Types ===

/// Create card request
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCardRequest {
    pub source_text: String,
    pub target_text: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub image_link: String,
}

/// Bulk import request: loose records in canonical or sheet column naming
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRequest {
    pub records: Vec<CardRecord>,
}

/// Bulk import response
#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub imported: usize,
    pub ids: Vec<String>,
    pub rejected: Vec<RejectedRecord>,
}

/// Card list response
#[derive(Debug, Clone, Serialize)]
pub struct CardListResponse {
    pub cards: Vec<Card>,
    pub total: usize,
}

// === Study Types ===

/// Start session request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Session date as `DD/MM/YYYY`; the server's local date when absent.
    #[serde(default)]
    pub today: Option<String>,
}

/// Answer check request
#[derive(Debug, Clone, Deserialize)]
pub struct CheckRequest {
    pub answer: String,
}

/// Tier change request
#[derive(Debug, Clone, Deserialize)]
pub struct TierRequest {
    pub tier: Tier,
}

/// Reschedule request. Validated into a whole number of days.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleRequest {
    pub days: f64,
}

/// The card being studied, without its answer.
#[derive(Debug, Clone, Serialize)]
pub struct StudyCard {
    pub id: String,
    pub source_text: String,
    pub note: String,
    pub image_link: String,
    pub tier: Tier,
    pub miss_count: u32,
    pub next_review_on: String,
}

impl From<&Card> for StudyCard {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id.clone(),
            source_text: card.source_text.clone(),
            note: card.note.clone(),
            image_link: card.image_link.clone(),
            tier: card.tier,
            miss_count: card.miss_count,
            next_review_on: card.next_review_on.clone(),
        }
    }
}

/// Session state response
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub today: String,
    pub progress: Progress,
    pub current: Option<StudyCard>,
}

impl SessionResponse {
    pub fn new(id: Uuid, session: &StudySession) -> Self {
        Self {
            id,
            today: session.today().to_string(),
            progress: session.progress(),
            current: session.current().map(StudyCard::from),
        }
    }
}

/// Answer check response
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CheckResponse {
    Checked(CheckOutcome),
    /// Another check on the same session was still running.
    Ignored,
}

/// Tier change response
#[derive(Debug, Clone, Serialize)]
pub struct TierResponse {
    pub card_id: String,
    pub tier: Tier,
}

/// Next-card response
#[derive(Debug, Clone, Serialize)]
pub struct AdvanceResponse {
    #[serde(flatten)]
    pub step: Advance,
    pub progress: Progress,
    pub current: Option<StudyCard>,
}

/// End-of-session summary
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub progress: Progress,
    pub rows: Vec<SummaryRow>,
}
