//! Study session endpoints

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use uuid::Uuid;
use vocab_core::{validate_interval, ReviewDate, ScheduleOutcome, StudySession};

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::services::sessions::LiveSession;
use crate::AppState;

async fn live_session(state: &AppState, id: Uuid) -> Result<Arc<LiveSession>> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Session {id}")))
}

/// POST /api/study/sessions
pub async fn start(
    State(state): State<AppState>,
    Json(payload): Json<StartSessionRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let today = match payload.today.as_deref() {
        Some(raw) => raw.trim().parse::<ReviewDate>()?,
        None => ReviewDate::today(),
    };

    let deck = state.store.snapshot().await?;
    let (id, live) = state
        .sessions
        .insert(StudySession::start(&deck, today))
        .await;

    let session = live.session.lock().await;
    tracing::info!(session_id = %id, due = session.due_cards().len(), %today, "study session created");
    Ok((StatusCode::CREATED, Json(SessionResponse::new(id, &session))))
}

/// GET /api/study/sessions/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let live = live_session(&state, id).await?;
    let session = live.session.lock().await;
    Ok(Json(SessionResponse::new(id, &session)))
}

/// DELETE /api/study/sessions/:id
pub async fn end(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<StatusCode> {
    if state.sessions.remove(id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Session {id}")))
    }
}

/// POST /api/study/sessions/:id/check
pub async fn check(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CheckRequest>,
) -> Result<Json<CheckResponse>> {
    let live = live_session(&state, id).await?;

    let Some(_ticket) = live.gate.try_enter() else {
        tracing::debug!(session_id = %id, "answer check already in flight, dropped");
        return Ok(Json(CheckResponse::Ignored));
    };

    let outcome = {
        let mut session = live.session.lock().await;
        session.check_answer(&payload.answer, Utc::now())?
    };
    tracing::debug!(
        session_id = %id,
        card_id = %outcome.card_id,
        correct = outcome.verdict.is_correct,
        similarity = outcome.verdict.similarity,
        "answer checked"
    );

    state.store.persist(&outcome.patch).await;
    Ok(Json(CheckResponse::Checked(outcome)))
}

/// POST /api/study/sessions/:id/tier
pub async fn set_tier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TierRequest>,
) -> Result<Json<TierResponse>> {
    let live = live_session(&state, id).await?;
    let patch = live.session.lock().await.set_tier(payload.tier)?;

    state.store.persist(&patch).await;
    Ok(Json(TierResponse {
        card_id: patch.id,
        tier: payload.tier,
    }))
}

/// POST /api/study/sessions/:id/schedule
pub async fn schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScheduleRequest>,
) -> Result<Json<ScheduleOutcome>> {
    let days = validate_interval(payload.days)?;
    let live = live_session(&state, id).await?;
    let outcome = live.session.lock().await.schedule(days)?;

    state.store.persist(&outcome.patch).await;
    Ok(Json(outcome))
}

/// POST /api/study/sessions/:id/next
pub async fn next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdvanceResponse>> {
    let live = live_session(&state, id).await?;
    let mut session = live.session.lock().await;
    let step = session.advance();

    Ok(Json(AdvanceResponse {
        step,
        progress: session.progress(),
        current: session.current().map(StudyCard::from),
    }))
}

/// POST /api/study/sessions/:id/previous
pub async fn previous(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>> {
    let live = live_session(&state, id).await?;
    let mut session = live.session.lock().await;
    session.previous();
    Ok(Json(SessionResponse::new(id, &session)))
}

/// GET /api/study/sessions/:id/summary
pub async fn summary(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SummaryResponse>> {
    let live = live_session(&state, id).await?;
    let session = live.session.lock().await;
    Ok(Json(SummaryResponse {
        progress: session.progress(),
        rows: session.summary(),
    }))
}
