// src/handlers/quiz.rs

use std::time::Duration;

use axum::{
    Extension, Json,
    extract::{Query, State, rejection::{JsonRejection, QueryRejection}},
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptKey, StartQuizRequest, SubmitQuizRequest},
        draft::{DraftQuery, SaveDraftRequest},
    },
    services::{
        draft::{self, DraftError, DraftOutcome},
        submission::{self, FinalizeRequest},
    },
    state::AppState,
    utils::{client_ip::ClientIp, jwt::Claims},
};

/// Enters a quiz, creating the student's attempt if it does not exist yet.
///
/// Calling it again returns the existing attempt untouched.
pub async fn start_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<StartQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let key = AttemptKey::new(claims.sub, req.quiz_id);
    let attempt = state
        .attempts
        .start_attempt(&key)
        .await
        .map_err(|e| AppError::internal("Failed to start quiz", e.to_string()))?
        .ok_or_else(|| AppError::NotFound("Quiz not found".to_string()))?;

    tracing::info!(student_id = %key.student_id, quiz_id = %key.quiz_id, "Quiz attempt started");

    Ok(Json(json!({
        "success": true,
        "data": attempt,
    })))
}

/// Final submission of a quiz.
///
/// * The session's subject is the student; the body cannot pick another one.
/// * Accepted at most once per (student, quiz); see `services::submission`.
/// * Records the resolved client address for auditing.
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ClientIp(client_ip): ClientIp,
    payload: Result<Json<SubmitQuizRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload?;
    req.validate()?;

    let key = AttemptKey::new(claims.sub, req.quiz_id);
    let request = FinalizeRequest {
        key: key.clone(),
        responses: req.responses,
        violations: req.violations,
        client_ip: client_ip.clone(),
    };

    let attempt = submission::finalize(
        state.attempts.as_ref(),
        state.window_policy(),
        request,
        Utc::now(),
    )
    .await
    .map_err(|e| {
        tracing::warn!(
            student_id = %key.student_id,
            quiz_id = %key.quiz_id,
            client_ip = %client_ip,
            "Quiz submission rejected: {}",
            e
        );
        AppError::from(e)
    })?;

    tracing::info!(
        student_id = %key.student_id,
        quiz_id = %key.quiz_id,
        client_ip = %client_ip,
        "Quiz submitted"
    );

    Ok(Json(json!({
        "success": true,
        "data": attempt,
    })))
}

/// Autosave tick: stores the current answers as the student's draft.
///
/// Returns `success: false` when the answer set is empty and nothing was written.
pub async fn save_draft(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SaveDraftRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|e| DraftError::InvalidInput(e.body_text()))?;
    req.validate()
        .map_err(|e| DraftError::InvalidInput(e.to_string()))?;

    let key = AttemptKey::new(claims.sub, req.quiz_id);
    let ttl = Duration::from_secs(state.config.draft_ttl_seconds);

    let outcome = draft::save_draft(state.drafts.as_ref(), ttl, &key, &req.responses).await?;

    Ok(Json(json!({
        "success": outcome == DraftOutcome::Stored,
    })))
}

/// Returns the student's last autosaved answers, or `null` when none are cached.
pub async fn get_draft(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<DraftQuery>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(query) = query?;
    query.validate()?;

    let key = AttemptKey::new(claims.sub, query.quiz_id);
    let responses = draft::load_draft(state.drafts.as_ref(), &key)
        .await
        .map_err(|e| AppError::internal("Failed to load draft", e.to_string()))?;

    Ok(Json(json!({
        "success": true,
        "data": responses,
    })))
}
