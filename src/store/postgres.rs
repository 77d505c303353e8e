// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction, types::Json};

use super::{AttemptStore, AttemptTx, StoreError};
use crate::models::{
    attempt::{AttemptKey, FinalSubmission, QuizAttempt},
    quiz::QuizWindow,
};

const ATTEMPT_COLUMNS: &str = "student_id, quiz_id, responses, is_submitted, submitted_at, ip, violations, created_at";

/// PostgreSQL-backed attempt store.
#[derive(Debug, Clone)]
pub struct PgAttemptStore {
    pool: PgPool,
}

impl PgAttemptStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl AttemptStore for PgAttemptStore {
    async fn begin(&self) -> Result<Box<dyn AttemptTx>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgAttemptTx { tx }))
    }

    async fn start_attempt(&self, key: &AttemptKey) -> Result<Option<QuizAttempt>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let quiz_exists = sqlx::query_scalar::<_, i32>("SELECT 1 FROM quizzes WHERE id = $1")
            .bind(&key.quiz_id)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();

        if !quiz_exists {
            return Ok(None);
        }

        // Entering twice keeps the original row
        sqlx::query(
            r#"
            INSERT INTO quiz_attempts (student_id, quiz_id)
            VALUES ($1, $2)
            ON CONFLICT (student_id, quiz_id) DO NOTHING
            "#,
        )
        .bind(&key.student_id)
        .bind(&key.quiz_id)
        .execute(&mut *tx)
        .await?;

        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2"
        ))
        .bind(&key.student_id)
        .bind(&key.quiz_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(attempt))
    }
}

/// A live PostgreSQL transaction. Rolled back by sqlx on drop.
struct PgAttemptTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AttemptTx for PgAttemptTx {
    async fn quiz_window(&mut self, quiz_id: &str) -> Result<Option<QuizWindow>, StoreError> {
        let window = sqlx::query_as::<_, QuizWindow>(
            "SELECT start_time, end_time FROM quizzes WHERE id = $1",
        )
        .bind(quiz_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(window)
    }

    async fn lock_attempt(&mut self, key: &AttemptKey) -> Result<Option<QuizAttempt>, StoreError> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            "SELECT {ATTEMPT_COLUMNS} FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2 FOR UPDATE"
        ))
        .bind(&key.student_id)
        .bind(&key.quiz_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(attempt)
    }

    async fn mark_submitted(
        &mut self,
        key: &AttemptKey,
        submission: &FinalSubmission,
    ) -> Result<Option<QuizAttempt>, StoreError> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(&format!(
            r#"
            UPDATE quiz_attempts
            SET responses = $3,
                violations = $4,
                submitted_at = $5,
                ip = $6,
                is_submitted = TRUE
            WHERE student_id = $1 AND quiz_id = $2 AND is_submitted = FALSE
            RETURNING {ATTEMPT_COLUMNS}
            "#
        ))
        .bind(&key.student_id)
        .bind(&key.quiz_id)
        .bind(Json(&submission.responses))
        .bind(&submission.violations)
        .bind(submission.submitted_at)
        .bind(&submission.ip)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(attempt)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}
