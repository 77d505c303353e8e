// src/models/draft.rs

use serde::Deserialize;
use serde_json::{Map, Value};
use validator::Validate;

/// DTO for an autosave tick.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveDraftRequest {
    #[validate(length(min = 1, max = 128, message = "quizId is required"))]
    pub quiz_id: String,

    pub responses: Map<String, Value>,
}

/// Query string for reading a draft back.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DraftQuery {
    #[validate(length(min = 1, max = 128, message = "quizId is required"))]
    pub quiz_id: String,
}
