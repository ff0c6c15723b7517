//! HTTP exam backend.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::instrument;

use proctor_core::model::{ExamDefinition, ExamQuery, ExamSummary, UserInfo};
use proctor_core::traits::{ExamBackend, ReportRecord, ReportRequest};

use crate::envelope::ApiResponse;
use crate::error::ClientError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Items requested per page from listing endpoints.
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Client for the exam REST backend.
pub struct HttpBackend {
    base_url: String,
    token: Option<String>,
    timeout_secs: u64,
    page_size: u64,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Option<String>, timeout_secs: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
            timeout_secs,
            page_size: DEFAULT_PAGE_SIZE,
            client,
        })
    }

    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// POST `body` to `path` and decode the envelope.
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<ApiResponse<T>, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                ClientError::Network(format!("backend not reachable at {}", self.base_url))
            } else {
                ClientError::Network(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if status >= 400 {
            // Error bodies usually still carry an envelope with a message.
            let message = serde_json::from_str::<ApiResponse<serde_json::Value>>(&text)
                .map(|env| env.message)
                .unwrap_or(text);
            return Err(ClientError::Api { status, message });
        }

        serde_json::from_str(&text)
            .map_err(|e| ClientError::Malformed(format!("failed to parse response: {e}")))
    }

    /// Walk a `{page, limit}` listing until `total` items have been read.
    ///
    /// `filters` must be a JSON object; the paging fields are added to it.
    /// Endpoints that omit `total` are treated as a single page.
    async fn post_paged<T>(
        &self,
        path: &str,
        filters: serde_json::Value,
    ) -> Result<Vec<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1u64;
        loop {
            let mut body = filters.clone();
            if let Some(fields) = body.as_object_mut() {
                fields.insert("page".into(), json!(page));
                fields.insert("limit".into(), json!(self.page_size));
            }

            let envelope = self.post::<_, Vec<T>>(path, &body).await?;
            let total = envelope.total;
            let batch = envelope.into_data()?;
            let fetched = batch.len();
            items.extend(batch);

            match total {
                Some(total) if fetched > 0 && (items.len() as u64) < total => page += 1,
                _ => break,
            }
        }
        tracing::debug!(path, pages = page, items = items.len(), "listing fetched");
        Ok(items)
    }
}

#[async_trait]
impl ExamBackend for HttpBackend {
    fn name(&self) -> &str {
        "http"
    }

    #[instrument(skip(self))]
    async fn fetch_exams(&self, query: &ExamQuery) -> anyhow::Result<Vec<ExamSummary>> {
        let filters = json!({
            "search": query.search.as_deref().unwrap_or_default(),
            "category": query.category.as_deref().unwrap_or_default(),
        });
        let exams = self
            .post_paged::<ExamSummary>("/api/exams/get-all-exams", filters)
            .await?;
        Ok(exams)
    }

    #[instrument(skip(self))]
    async fn fetch_exam(&self, exam_id: &str) -> anyhow::Result<ExamDefinition> {
        let exam = self
            .post::<_, ExamDefinition>("/api/exams/get-exam-by-id", &json!({ "examId": exam_id }))
            .await?
            .into_data()?;
        Ok(exam)
    }

    #[instrument(skip(self, report), fields(exam = %report.exam, user = %report.user))]
    async fn submit_report(&self, report: &ReportRequest) -> anyhow::Result<()> {
        self.post::<_, serde_json::Value>("/api/reports/add-report", report)
            .await?
            .into_ack()?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_user(&self) -> anyhow::Result<UserInfo> {
        let user = self
            .post::<_, UserInfo>("/api/users/get-user-info", &json!({}))
            .await?
            .into_data()?;
        Ok(user)
    }

    /// The server derives the user from the bearer token, so `user_id` is
    /// only recorded on the span.
    #[instrument(skip(self))]
    async fn fetch_reports(&self, user_id: &str) -> anyhow::Result<Vec<ReportRecord>> {
        let mut reports = self
            .post_paged::<ReportRecord>("/api/reports/get-all-reports-by-user", json!({}))
            .await?;
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }
}
