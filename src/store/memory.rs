// src/store/memory.rs

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{AttemptStore, AttemptTx, StoreError};
use crate::models::{
    attempt::{AttemptKey, FinalSubmission, QuizAttempt},
    quiz::QuizWindow,
};

#[derive(Debug, Default)]
struct Tables {
    quizzes: HashMap<String, QuizWindow>,
    attempts: HashMap<AttemptKey, QuizAttempt>,
}

/// In-process attempt store.
///
/// A transaction holds the table lock from `begin` until it is committed or
/// dropped, which gives serializable isolation.
#[derive(Debug, Clone, Default)]
pub struct MemoryAttemptStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryAttemptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a quiz and its acceptance window.
    pub async fn insert_quiz(&self, quiz_id: impl Into<String>, window: QuizWindow) {
        self.tables.lock().await.quizzes.insert(quiz_id.into(), window);
    }

    /// Snapshot of a stored attempt, outside of any transaction.
    pub async fn attempt(&self, key: &AttemptKey) -> Option<QuizAttempt> {
        self.tables.lock().await.attempts.get(key).cloned()
    }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
    async fn begin(&self) -> Result<Box<dyn AttemptTx>, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        Ok(Box::new(MemoryAttemptTx {
            guard,
            staged: HashMap::new(),
        }))
    }

    async fn start_attempt(&self, key: &AttemptKey) -> Result<Option<QuizAttempt>, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.quizzes.contains_key(&key.quiz_id) {
            return Ok(None);
        }

        let attempt = tables
            .attempts
            .entry(key.clone())
            .or_insert_with(|| QuizAttempt::started(key, Utc::now()))
            .clone();

        Ok(Some(attempt))
    }
}

/// Writes are staged and only reach the tables on commit.
struct MemoryAttemptTx {
    guard: OwnedMutexGuard<Tables>,
    staged: HashMap<AttemptKey, QuizAttempt>,
}

impl MemoryAttemptTx {
    fn current(&self, key: &AttemptKey) -> Option<&QuizAttempt> {
        self.staged.get(key).or_else(|| self.guard.attempts.get(key))
    }
}

#[async_trait]
impl AttemptTx for MemoryAttemptTx {
    async fn quiz_window(&mut self, quiz_id: &str) -> Result<Option<QuizWindow>, StoreError> {
        Ok(self.guard.quizzes.get(quiz_id).copied())
    }

    async fn lock_attempt(&mut self, key: &AttemptKey) -> Result<Option<QuizAttempt>, StoreError> {
        Ok(self.current(key).cloned())
    }

    async fn mark_submitted(
        &mut self,
        key: &AttemptKey,
        submission: &FinalSubmission,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let Some(existing) = self.current(key) else {
            return Ok(None);
        };
        if existing.is_submitted {
            return Ok(None);
        }

        let updated = QuizAttempt {
            responses: Json(submission.responses.clone()),
            violations: submission.violations.clone(),
            submitted_at: Some(submission.submitted_at),
            ip: Some(submission.ip.clone()),
            is_submitted: true,
            ..existing.clone()
        };
        self.staged.insert(key.clone(), updated.clone());

        Ok(Some(updated))
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryAttemptTx { mut guard, staged } = *self;
        guard.attempts.extend(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::{Map, json};

    async fn seeded() -> (MemoryAttemptStore, AttemptKey) {
        let store = MemoryAttemptStore::new();
        let now = Utc::now();
        store
            .insert_quiz(
                "quiz-1",
                QuizWindow {
                    start_time: now - Duration::minutes(5),
                    end_time: now + Duration::minutes(55),
                },
            )
            .await;
        let key = AttemptKey::new("student-1", "quiz-1");
        store.start_attempt(&key).await.unwrap();
        (store, key)
    }

    fn submission() -> FinalSubmission {
        let mut responses = Map::new();
        responses.insert("q1".to_string(), json!("A"));
        FinalSubmission {
            responses,
            violations: None,
            submitted_at: Utc::now(),
            ip: "10.0.0.1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let (store, key) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        let updated = tx.mark_submitted(&key, &submission()).await.unwrap();
        assert!(updated.is_some());
        drop(tx);

        let stored = store.attempt(&key).await.unwrap();
        assert!(!stored.is_submitted);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let (store, key) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        tx.mark_submitted(&key, &submission()).await.unwrap();
        tx.commit().await.unwrap();

        let stored = store.attempt(&key).await.unwrap();
        assert!(stored.is_submitted);
        assert_eq!(stored.ip.as_deref(), Some("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_mark_submitted_is_conditional() {
        let (store, key) = seeded().await;

        let mut tx = store.begin().await.unwrap();
        assert!(tx.mark_submitted(&key, &submission()).await.unwrap().is_some());
        assert!(tx.mark_submitted(&key, &submission()).await.unwrap().is_none());

        let missing = AttemptKey::new("student-2", "quiz-1");
        assert!(tx.mark_submitted(&missing, &submission()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_start_attempt_is_idempotent_and_needs_quiz() {
        let (store, key) = seeded().await;

        let again = store.start_attempt(&key).await.unwrap().unwrap();
        assert_eq!(Some(again), store.attempt(&key).await);

        let unknown = AttemptKey::new("student-1", "no-such-quiz");
        assert!(store.start_attempt(&unknown).await.unwrap().is_none());
    }
}
