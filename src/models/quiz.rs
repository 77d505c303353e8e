// src/models/quiz.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Acceptance interval of a quiz, read from the 'quizzes' table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizWindow {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// How strictly a submission time is checked against a [`QuizWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowPolicy {
    /// The end bound is stored but historically never enforced; opt in here.
    pub enforce_end_time: bool,
}

impl WindowPolicy {
    pub fn accepts(&self, window: &QuizWindow, now: DateTime<Utc>) -> bool {
        if now < window.start_time {
            return false;
        }
        !(self.enforce_end_time && now > window.end_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn window() -> QuizWindow {
        let start = Utc::now();
        QuizWindow {
            start_time: start,
            end_time: start + Duration::hours(1),
        }
    }

    #[test]
    fn test_before_start_is_rejected() {
        let w = window();
        let policy = WindowPolicy::default();
        assert!(!policy.accepts(&w, w.start_time - Duration::seconds(1)));
        assert!(policy.accepts(&w, w.start_time));
    }

    #[test]
    fn test_end_time_only_enforced_when_enabled() {
        let w = window();
        let late = w.end_time + Duration::minutes(5);

        assert!(WindowPolicy::default().accepts(&w, late));
        assert!(!WindowPolicy { enforce_end_time: true }.accepts(&w, late));
        assert!(WindowPolicy { enforce_end_time: true }.accepts(&w, w.end_time));
    }
}
