// src/services/draft.rs

use std::time::Duration;

use serde_json::{Map, Value};

use crate::{
    cache::{CacheError, DraftCache},
    config::DRAFT_KEY_PREFIX,
    error::AppError,
    models::attempt::AttemptKey,
};

#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("invalid draft payload: {0}")]
    InvalidInput(String),

    #[error("draft cache unavailable: {0}")]
    CacheUnavailable(#[from] CacheError),
}

impl From<DraftError> for AppError {
    fn from(err: DraftError) -> Self {
        match err {
            DraftError::InvalidInput(message) => AppError::BadRequest(message),
            DraftError::CacheUnavailable(e) => {
                AppError::internal("Failed to save draft", e.to_string())
            }
        }
    }
}

/// Result of an autosave tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftOutcome {
    Stored,
    /// Empty answer sets are not written.
    Skipped,
}

/// Cache key for a student's draft: `response:<quizId>:<studentId>`.
pub fn draft_key(key: &AttemptKey) -> String {
    format!("{}:{}:{}", DRAFT_KEY_PREFIX, key.quiz_id, key.student_id)
}

/// Overwrites the student's draft with `responses` (last write wins).
///
/// Drafts never touch the attempt record and are never read by finalize.
pub async fn save_draft(
    cache: &dyn DraftCache,
    ttl: Duration,
    key: &AttemptKey,
    responses: &Map<String, Value>,
) -> Result<DraftOutcome, DraftError> {
    if responses.is_empty() {
        return Ok(DraftOutcome::Skipped);
    }

    let payload =
        serde_json::to_string(responses).map_err(|e| DraftError::InvalidInput(e.to_string()))?;
    cache.put(&draft_key(key), &payload, ttl).await?;

    Ok(DraftOutcome::Stored)
}

/// Reads back the last autosaved answers, if they are still cached.
pub async fn load_draft(
    cache: &dyn DraftCache,
    key: &AttemptKey,
) -> Result<Option<Map<String, Value>>, DraftError> {
    let Some(raw) = cache.get(&draft_key(key)).await? else {
        return Ok(None);
    };
    let draft: Map<String, Value> = serde_json::from_str(&raw)
        .map_err(|e| CacheError::Backend(format!("corrupt draft entry: {e}")))?;
    Ok(Some(draft))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryDraftCache;
    use async_trait::async_trait;
    use serde_json::json;

    /// A cache whose backend is down.
    struct FailingCache;

    #[async_trait]
    impl DraftCache for FailingCache {
        async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }

        async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Backend("connection refused".into()))
        }
    }

    const TTL: Duration = Duration::from_secs(6_000_000);

    fn answers(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_key_format() {
        let key = AttemptKey::new("stu-1", "quiz-9");
        assert_eq!(draft_key(&key), "response:quiz-9:stu-1");
    }

    #[tokio::test]
    async fn test_later_draft_replaces_earlier() {
        let cache = MemoryDraftCache::new();
        let key = AttemptKey::new("stu-1", "quiz-9");

        let first = answers(&[("q1", json!("A")), ("q2", json!(["B", "C"]))]);
        let second = answers(&[("q1", json!("D"))]);

        assert_eq!(save_draft(&cache, TTL, &key, &first).await.unwrap(), DraftOutcome::Stored);
        assert_eq!(save_draft(&cache, TTL, &key, &second).await.unwrap(), DraftOutcome::Stored);

        // No merge: q2 from the first draft is gone
        assert_eq!(load_draft(&cache, &key).await.unwrap(), Some(second));
    }

    #[tokio::test]
    async fn test_empty_draft_is_a_no_op() {
        let cache = MemoryDraftCache::new();
        let key = AttemptKey::new("stu-1", "quiz-9");
        let saved = answers(&[("q1", json!("A"))]);

        save_draft(&cache, TTL, &key, &saved).await.unwrap();
        let outcome = save_draft(&cache, TTL, &key, &Map::new()).await.unwrap();

        assert_eq!(outcome, DraftOutcome::Skipped);
        assert_eq!(load_draft(&cache, &key).await.unwrap(), Some(saved));
    }

    #[tokio::test]
    async fn test_drafts_are_scoped_per_student() {
        let cache = MemoryDraftCache::new();
        let mine = AttemptKey::new("stu-1", "quiz-9");
        let theirs = AttemptKey::new("stu-2", "quiz-9");

        save_draft(&cache, TTL, &mine, &answers(&[("q1", json!("A"))]))
            .await
            .unwrap();

        assert_eq!(load_draft(&cache, &theirs).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_corrupt_cached_value_is_a_cache_failure() {
        let cache = MemoryDraftCache::new();
        let key = AttemptKey::new("stu-1", "quiz-9");
        cache.put(&draft_key(&key), "not json", TTL).await.unwrap();

        let result = load_draft(&cache, &key).await;
        assert!(matches!(result, Err(DraftError::CacheUnavailable(_))));
    }

    #[tokio::test]
    async fn test_cache_failure_is_reported() {
        let key = AttemptKey::new("stu-1", "quiz-9");
        let result = save_draft(&FailingCache, TTL, &key, &answers(&[("q1", json!("A"))])).await;

        let err = result.unwrap_err();
        assert!(matches!(err, DraftError::CacheUnavailable(_)));
        assert!(matches!(
            AppError::from(err),
            AppError::Internal { message: "Failed to save draft", .. }
        ));
    }

    #[tokio::test]
    async fn test_empty_draft_skips_a_failing_cache() {
        let key = AttemptKey::new("stu-1", "quiz-9");
        let outcome = save_draft(&FailingCache, TTL, &key, &Map::new()).await.unwrap();
        assert_eq!(outcome, DraftOutcome::Skipped);
    }

    #[test]
    fn test_invalid_input_is_a_bad_request() {
        let err = DraftError::InvalidInput("quiz_id: length".into());
        match AppError::from(err) {
            AppError::BadRequest(message) => assert_eq!(message, "quiz_id: length"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
