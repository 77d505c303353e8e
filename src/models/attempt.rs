// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Composite identity of an attempt: one student, one quiz.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttemptKey {
    pub student_id: String,
    pub quiz_id: String,
}

impl AttemptKey {
    pub fn new(student_id: impl Into<String>, quiz_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            quiz_id: quiz_id.into(),
        }
    }
}

/// Represents the 'quiz_attempts' table in the database.
///
/// Once `is_submitted` flips to true the record is frozen for the submission
/// workflow; grading writes happen elsewhere.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
    pub student_id: String,
    pub quiz_id: String,

    /// Question id -> answer payload. Shape depends on the question type.
    pub responses: Json<Map<String, Value>>,

    pub is_submitted: bool,
    pub submitted_at: Option<DateTime<Utc>>,

    /// Client address recorded at submission time.
    pub ip: Option<String>,

    /// Free-form proctoring metadata.
    pub violations: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
}

impl QuizAttempt {
    /// A fresh, unsubmitted attempt.
    pub fn started(key: &AttemptKey, now: DateTime<Utc>) -> Self {
        Self {
            student_id: key.student_id.clone(),
            quiz_id: key.quiz_id.clone(),
            responses: Json(Map::new()),
            is_submitted: false,
            submitted_at: None,
            ip: None,
            violations: None,
            created_at: Some(now),
        }
    }
}

/// Values written by the submission guard when it latches an attempt.
#[derive(Debug, Clone)]
pub struct FinalSubmission {
    pub responses: Map<String, Value>,
    pub violations: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub ip: String,
}

/// DTO for the final submission of a quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitQuizRequest {
    #[validate(length(min = 1, max = 128, message = "quizId is required"))]
    pub quiz_id: String,

    pub responses: Map<String, Value>,

    #[validate(length(max = 20000))]
    pub violations: Option<String>,
}

/// DTO for entering a quiz.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct StartQuizRequest {
    #[validate(length(min = 1, max = 128, message = "quizId is required"))]
    pub quiz_id: String,
}
