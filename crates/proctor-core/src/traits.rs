//! Core trait definitions for exam backends.
//!
//! The session engine only talks to the outside world through
//! [`ExamBackend`], implemented by the `proctor-client` crate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{ExamDefinition, ExamQuery, ExamSummary, UserInfo};
use crate::scoring::ScoreResult;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Source of exam definitions and sink for finished attempts.
///
/// Every failure (transport or application-level rejection) is reported as
/// an error; callers treat them all as recoverable.
#[async_trait]
pub trait ExamBackend: Send + Sync {
    /// Human-readable backend name (e.g. "http").
    fn name(&self) -> &str;

    /// The exam catalogue, narrowed by `query`.
    async fn fetch_exams(&self, query: &ExamQuery) -> anyhow::Result<Vec<ExamSummary>>;

    /// Load an exam definition by id.
    async fn fetch_exam(&self, exam_id: &str) -> anyhow::Result<ExamDefinition>;

    /// Persist a scored attempt.
    async fn submit_report(&self, report: &ReportRequest) -> anyhow::Result<()>;

    /// The currently signed-in user.
    async fn fetch_user(&self) -> anyhow::Result<UserInfo>;

    /// Past attempts of a user, newest first.
    async fn fetch_reports(&self, user_id: &str) -> anyhow::Result<Vec<ReportRecord>>;
}

/// Payload sent to the report endpoint when an attempt is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Exam id.
    pub exam: String,
    pub result: ScoreResult,
    /// User id.
    pub user: String,
}

/// A persisted attempt, as listed in a user's history.
///
/// The attempted exam is embedded as a summary so the history can be shown
/// without fetching every exam again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    #[serde(alias = "_id")]
    pub id: String,
    pub exam: ExamSummary,
    pub result: ScoreResult,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Verdict;

    #[test]
    fn report_record_with_populated_exam() {
        let json = r#"{
            "_id": "r1",
            "exam": {"_id": "e1", "name": "Physics", "category": "JEE",
                     "duration": 600, "totalMarks": 12, "passingMarks": 6},
            "result": {"correctAnswers": [], "wrongAnswers": [],
                       "totalMarksObtained": 8, "verdict": "Pass"},
            "user": "u1",
            "createdAt": "2025-03-14T10:00:00.000Z",
            "updatedAt": "2025-03-14T10:00:00.000Z",
            "__v": 0
        }"#;
        let record: ReportRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.exam.name, "Physics");
        assert_eq!(record.exam.passing_marks, 6);
        assert_eq!(record.result.verdict, Verdict::Pass);
    }
}
