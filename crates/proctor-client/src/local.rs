//! Offline backend: exams from a directory, reports as JSON files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use proctor_core::model::{ExamDefinition, ExamQuery, ExamSummary, UserInfo};
use proctor_core::parser::load_exam_directory;
use proctor_core::traits::{ExamBackend, ReportRecord, ReportRequest};

use crate::error::ClientError;

/// On-disk form of a saved report.
#[derive(Debug, Serialize, Deserialize)]
struct StoredReport {
    user: String,
    record: ReportRecord,
}

/// Backend reading exam files from `exams_dir` and writing one JSON file per
/// submitted attempt into `reports_dir`.
pub struct LocalBackend {
    exams_dir: PathBuf,
    reports_dir: PathBuf,
    user: UserInfo,
}

impl LocalBackend {
    pub fn new(
        exams_dir: impl Into<PathBuf>,
        reports_dir: impl Into<PathBuf>,
        user: UserInfo,
    ) -> Self {
        Self {
            exams_dir: exams_dir.into(),
            reports_dir: reports_dir.into(),
            user,
        }
    }

    /// The user every local attempt is recorded for.
    pub fn local_user(name: &str) -> UserInfo {
        UserInfo {
            id: "local".into(),
            name: name.into(),
            email: String::new(),
            is_admin: false,
        }
    }

    pub fn exams_dir(&self) -> &Path {
        &self.exams_dir
    }

    pub fn reports_dir(&self) -> &Path {
        &self.reports_dir
    }

    async fn load_exams(&self) -> Result<Vec<ExamDefinition>> {
        let dir = self.exams_dir.clone();
        tokio::task::spawn_blocking(move || load_exam_directory(&dir))
            .await
            .context("exam loader panicked")?
    }

    async fn read_reports(&self) -> Result<Vec<StoredReport>> {
        let dir = self.reports_dir.clone();
        tokio::task::spawn_blocking(move || read_report_dir(&dir))
            .await
            .context("report reader panicked")?
    }
}

/// Parse every `*.json` report in `dir`, skipping files that do not decode.
fn read_report_dir(dir: &Path) -> Result<Vec<StoredReport>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut reports = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read reports: {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.extension().is_some_and(|ext| ext == "json") {
            continue;
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        match serde_json::from_str::<StoredReport>(&content) {
            Ok(report) => reports.push(report),
            Err(e) => tracing::warn!("skipping {}: {e}", path.display()),
        }
    }
    Ok(reports)
}

#[async_trait]
impl ExamBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch_exams(&self, query: &ExamQuery) -> anyhow::Result<Vec<ExamSummary>> {
        let exams = self
            .load_exams()
            .await?
            .iter()
            .map(ExamSummary::from)
            .filter(|exam| query.matches(exam))
            .collect();
        Ok(exams)
    }

    async fn fetch_exam(&self, exam_id: &str) -> anyhow::Result<ExamDefinition> {
        let exam = self
            .load_exams()
            .await?
            .into_iter()
            .find(|exam| exam.id == exam_id)
            .ok_or_else(|| ClientError::ExamNotFound(exam_id.to_string()))?;
        Ok(exam)
    }

    async fn submit_report(&self, report: &ReportRequest) -> anyhow::Result<()> {
        let exam = self.fetch_exam(&report.exam).await?;
        let stored = StoredReport {
            user: report.user.clone(),
            record: ReportRecord {
                id: Uuid::new_v4().to_string(),
                exam: ExamSummary::from(&exam),
                result: report.result.clone(),
                created_at: Utc::now(),
            },
        };

        tokio::fs::create_dir_all(&self.reports_dir)
            .await
            .with_context(|| format!("failed to create {}", self.reports_dir.display()))?;

        let path = self.reports_dir.join(format!("{}.json", stored.record.id));
        let json = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        tracing::debug!(path = %path.display(), "report written");
        Ok(())
    }

    async fn fetch_user(&self) -> anyhow::Result<UserInfo> {
        Ok(self.user.clone())
    }

    async fn fetch_reports(&self, user_id: &str) -> anyhow::Result<Vec<ReportRecord>> {
        let mut records: Vec<ReportRecord> = self
            .read_reports()
            .await?
            .into_iter()
            .filter(|report| report.user == user_id)
            .map(|report| report.record)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::scoring::{score, AnswerMap};

    const EXAM: &str = r#"
[exam]
id = "geo"
name = "Geography"
duration = 60
passing_marks = 4

[[questions]]
id = "q1"
name = "Capital of France?"
correct_option = "A"

[questions.options]
A = "Paris"
B = "Rome"
"#;

    fn backend(dir: &tempfile::TempDir) -> LocalBackend {
        let exams = dir.path().join("exams");
        std::fs::create_dir_all(&exams).unwrap();
        std::fs::write(exams.join("geo.toml"), EXAM).unwrap();
        LocalBackend::new(
            exams,
            dir.path().join("reports"),
            LocalBackend::local_user("tester"),
        )
    }

    #[tokio::test]
    async fn fetches_exam_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        let exam = backend.fetch_exam("geo").await.unwrap();
        assert_eq!(exam.name, "Geography");
        assert_eq!(exam.total_marks, 4);

        let err = backend.fetch_exam("history").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ClientError>(),
            Some(ClientError::ExamNotFound(id)) if id == "history"
        ));
    }

    #[tokio::test]
    async fn submitted_reports_show_up_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let exam = backend.fetch_exam("geo").await.unwrap();

        for key in ["A", "B"] {
            let answers: AnswerMap = [(0, key.to_string())].into_iter().collect();
            let request = ReportRequest {
                exam: "geo".into(),
                result: score(&exam.questions, &answers, exam.passing_marks),
                user: "local".into(),
            };
            backend.submit_report(&request).await.unwrap();
        }

        let reports = backend.fetch_reports("local").await.unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].created_at >= reports[1].created_at);
        assert!(reports.iter().all(|r| r.exam.name == "Geography"));

        assert!(backend.fetch_reports("someone-else").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn report_for_unknown_exam_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let exam = backend.fetch_exam("geo").await.unwrap();

        let request = ReportRequest {
            exam: "missing".into(),
            result: score(&exam.questions, &AnswerMap::new(), 0),
            user: "local".into(),
        };
        assert!(backend.submit_report(&request).await.is_err());
        assert!(!backend.reports_dir().exists());
    }

    #[tokio::test]
    async fn lists_catalogue_from_exam_dir() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        std::fs::write(
            backend.exams_dir().join("chem.toml"),
            EXAM.replace("\"geo\"", "\"chem\"")
                .replace("\"Geography\"", "\"Chemistry\"")
                .replace("duration = 60", "duration = 60\ncategory = \"Science\""),
        )
        .unwrap();

        let all = backend.fetch_exams(&ExamQuery::default()).await.unwrap();
        let mut ids: Vec<_> = all.iter().map(|e| e.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, ["chem", "geo"]);

        let science = ExamQuery {
            search: None,
            category: Some("science".into()),
        };
        let found = backend.fetch_exams(&science).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Chemistry");
        assert_eq!(found[0].total_marks, 4);

        let search = ExamQuery {
            search: Some("GEO".into()),
            category: None,
        };
        assert_eq!(backend.fetch_exams(&search).await.unwrap()[0].id, "geo");
    }

    #[tokio::test]
    async fn stored_report_embeds_exam_summary() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let exam = backend.fetch_exam("geo").await.unwrap();
        let request = ReportRequest {
            exam: "geo".into(),
            result: score(&exam.questions, &AnswerMap::new(), exam.passing_marks),
            user: "local".into(),
        };
        backend.submit_report(&request).await.unwrap();

        let file = std::fs::read_dir(backend.reports_dir())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let stored: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
        assert_eq!(stored["user"], "local");
        assert_eq!(stored["record"]["exam"]["name"], "Geography");
        assert_eq!(stored["record"]["exam"]["passingMarks"], 4);
    }

    #[tokio::test]
    async fn missing_reports_dir_is_empty_history() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        assert!(backend.fetch_reports("local").await.unwrap().is_empty());
        assert_eq!(backend.fetch_user().await.unwrap().name, "tester");
    }
}
