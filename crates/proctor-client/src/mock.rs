//! Mock backend for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use proctor_core::model::{ExamDefinition, ExamQuery, ExamSummary, UserInfo};
use proctor_core::traits::{ExamBackend, ReportRecord, ReportRequest};

use crate::error::ClientError;

/// An in-memory backend for driving sessions without a server.
///
/// Serves a fixed set of exams and keeps every accepted report. Submissions
/// can be made to fail on demand.
pub struct MockBackend {
    exams: Vec<ExamDefinition>,
    user: UserInfo,
    /// Number of submissions still to reject.
    failures_left: AtomicU32,
    /// Number of `submit_report` calls, accepted or not.
    submit_count: AtomicU32,
    /// Last report received.
    last_report: Mutex<Option<ReportRequest>>,
    /// Accepted reports.
    reports: Mutex<Vec<(String, ReportRecord)>>,
}

impl MockBackend {
    pub fn new(exams: Vec<ExamDefinition>) -> Self {
        Self {
            exams,
            user: UserInfo {
                id: "mock-user".into(),
                name: "Mock Candidate".into(),
                email: "mock@example.com".into(),
                is_admin: false,
            },
            failures_left: AtomicU32::new(0),
            submit_count: AtomicU32::new(0),
            last_report: Mutex::new(None),
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Mock serving a single exam.
    pub fn with_exam(exam: ExamDefinition) -> Self {
        Self::new(vec![exam])
    }

    /// Reject the next `n` submissions with a network error.
    pub fn fail_next_submits(&self, n: u32) {
        self.failures_left.store(n, Ordering::SeqCst);
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count.load(Ordering::SeqCst)
    }

    pub fn last_report(&self) -> Option<ReportRequest> {
        self.last_report
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of reports that were accepted.
    pub fn saved_count(&self) -> usize {
        self.reports.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl ExamBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_exams(&self, query: &ExamQuery) -> anyhow::Result<Vec<ExamSummary>> {
        Ok(self
            .exams
            .iter()
            .map(ExamSummary::from)
            .filter(|exam| query.matches(exam))
            .collect())
    }

    async fn fetch_exam(&self, exam_id: &str) -> anyhow::Result<ExamDefinition> {
        let exam = self
            .exams
            .iter()
            .find(|exam| exam.id == exam_id)
            .cloned()
            .ok_or_else(|| ClientError::ExamNotFound(exam_id.to_string()))?;
        Ok(exam)
    }

    async fn submit_report(&self, report: &ReportRequest) -> anyhow::Result<()> {
        self.submit_count.fetch_add(1, Ordering::SeqCst);
        *self.last_report.lock().unwrap_or_else(|e| e.into_inner()) = Some(report.clone());

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ClientError::Network("connection reset".into()).into());
        }

        let exam = self.fetch_exam(&report.exam).await?;
        let record = ReportRecord {
            id: format!("report-{}", self.submit_count()),
            exam: ExamSummary::from(&exam),
            result: report.result.clone(),
            created_at: Utc::now(),
        };
        self.reports
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((report.user.clone(), record));
        Ok(())
    }

    async fn fetch_user(&self) -> anyhow::Result<UserInfo> {
        Ok(self.user.clone())
    }

    async fn fetch_reports(&self, user_id: &str) -> anyhow::Result<Vec<ReportRecord>> {
        let reports = self.reports.lock().unwrap_or_else(|e| e.into_inner());
        Ok(reports
            .iter()
            .rev()
            .filter(|(user, _)| user == user_id)
            .map(|(_, record)| record.clone())
            .collect())
    }
}
