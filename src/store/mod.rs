// src/store/mod.rs

//! Persistent storage for quiz attempts.
//!
//! All writes to an attempt happen inside an [`AttemptTx`]. A transaction that
//! is dropped without [`AttemptTx::commit`] is rolled back, so an early return
//! from the submission guard never leaves a partial write behind.

mod memory;
mod postgres;

pub use memory::MemoryAttemptStore;
pub use postgres::PgAttemptStore;

use async_trait::async_trait;

use crate::models::{
    attempt::{AttemptKey, FinalSubmission, QuizAttempt},
    quiz::QuizWindow,
};

/// Errors raised by an attempt store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Entry point to attempt storage.
///
/// Implementations must be shareable across request handlers.
#[async_trait]
pub trait AttemptStore: Send + Sync + 'static {
    /// Begin a transaction.
    async fn begin(&self) -> Result<Box<dyn AttemptTx>, StoreError>;

    /// Create the attempt for `key` unless it already exists, then return it.
    ///
    /// Returns `Ok(None)` if the quiz does not exist.
    async fn start_attempt(&self, key: &AttemptKey) -> Result<Option<QuizAttempt>, StoreError>;
}

/// An open storage transaction.
#[async_trait]
pub trait AttemptTx: Send {
    /// Read the acceptance window of a quiz.
    async fn quiz_window(&mut self, quiz_id: &str) -> Result<Option<QuizWindow>, StoreError>;

    /// Read an attempt and lock it until the transaction ends.
    async fn lock_attempt(&mut self, key: &AttemptKey) -> Result<Option<QuizAttempt>, StoreError>;

    /// Latch the attempt as submitted.
    ///
    /// The write is conditional on `is_submitted = false`. Returns `Ok(None)`
    /// when no row matched, i.e. the attempt is missing or already submitted.
    async fn mark_submitted(
        &mut self,
        key: &AttemptKey,
        submission: &FinalSubmission,
    ) -> Result<Option<QuizAttempt>, StoreError>;

    /// Commit and consume the transaction.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
