// src/services/submission.rs

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::{
    error::AppError,
    models::{
        attempt::{AttemptKey, FinalSubmission, QuizAttempt},
        quiz::WindowPolicy,
    },
    store::{AttemptStore, StoreError},
};

/// Reasons a final submission is refused.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("quiz not found")]
    QuizNotFound,

    #[error("quiz submission window closed")]
    WindowClosed,

    #[error("no quiz attempt found")]
    NoAttempt,

    #[error("quiz already submitted")]
    AlreadySubmitted,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::QuizNotFound => AppError::NotFound("Quiz not found".to_string()),
            SubmissionError::WindowClosed => {
                AppError::Forbidden("Quiz submission window closed".to_string())
            }
            SubmissionError::NoAttempt => AppError::NotFound("No quiz attempt found".to_string()),
            SubmissionError::AlreadySubmitted => {
                AppError::BadRequest("Quiz already submitted".to_string())
            }
            SubmissionError::Store(e) => AppError::internal("Failed to save quiz", e.to_string()),
        }
    }
}

/// Everything the student sends with a final submission.
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub key: AttemptKey,
    pub responses: Map<String, Value>,
    pub violations: Option<String>,
    pub client_ip: String,
}

/// Finalizes a student's attempt exactly once.
///
/// The window check, the attempt lookup and the latching write run in one
/// transaction. The write is conditional on the attempt still being open, so
/// a concurrent finalize that slipped past the lookup gets `AlreadySubmitted`
/// instead of overwriting the first commit.
pub async fn finalize(
    store: &dyn AttemptStore,
    policy: WindowPolicy,
    req: FinalizeRequest,
    now: DateTime<Utc>,
) -> Result<QuizAttempt, SubmissionError> {
    let mut tx = store.begin().await?;

    let window = tx
        .quiz_window(&req.key.quiz_id)
        .await?
        .ok_or(SubmissionError::QuizNotFound)?;

    if !policy.accepts(&window, now) {
        return Err(SubmissionError::WindowClosed);
    }

    let attempt = tx
        .lock_attempt(&req.key)
        .await?
        .ok_or(SubmissionError::NoAttempt)?;

    if attempt.is_submitted {
        return Err(SubmissionError::AlreadySubmitted);
    }

    let submission = FinalSubmission {
        responses: req.responses,
        violations: req.violations,
        submitted_at: now,
        ip: req.client_ip,
    };

    let updated = tx
        .mark_submitted(&req.key, &submission)
        .await?
        .ok_or(SubmissionError::AlreadySubmitted)?;

    tx.commit().await?;

    Ok(updated)
}
