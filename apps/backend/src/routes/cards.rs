//! Card endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use vocab_core::{Card, CardPatch, ReviewDate};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::store::NewCard;
use crate::AppState;

/// GET /api/cards
pub async fn list(State(state): State<AppState>) -> Result<Json<CardListResponse>> {
    let cards = state.store.snapshot().await?;
    Ok(Json(CardListResponse {
        total: cards.len(),
        cards,
    }))
}

/// GET /api/cards/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Card>> {
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Card {id}")))
}

/// POST /api/cards
pub async fn create(
    State(state): State<AppState>,
    Json(payload): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>)> {
    let source_text = payload.source_text.trim().to_string();
    let target_text = payload.target_text.trim().to_string();
    if source_text.is_empty() || target_text.is_empty() {
        return Err(ApiError::BadRequest(
            "source_text and target_text are required".to_string(),
        ));
    }

    let card = state
        .store
        .create(
            NewCard {
                source_text,
                target_text,
                note: payload.note,
                image_link: payload.image_link,
            },
            ReviewDate::today(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(card)))
}

/// POST /api/cards/import
pub async fn import(
    State(state): State<AppState>,
    Json(payload): Json<ImportRequest>,
) -> Result<Json<ImportResponse>> {
    let ingested = state
        .store
        .import(payload.records, ReviewDate::today())
        .await?;

    Ok(Json(ImportResponse {
        imported: ingested.cards.len(),
        ids: ingested.cards.into_iter().map(|c| c.id).collect(),
        rejected: ingested.rejected,
    }))
}

/// PUT /api/cards/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut patch): Json<CardPatch>,
) -> Result<Json<Card>> {
    patch.id = id.clone();
    state
        .store
        .update(patch)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "Card {id} (new cards need source_text and target_text)"
            ))
        })
}

/// DELETE /api/cards/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    if state.store.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Card {id}")))
    }
}
