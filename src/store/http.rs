//! 看板后端的 HTTP 存储实现

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::{Client, Response};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{JobStore, APPLIED_AT_FORMAT};
use crate::error::{AppError, AppResult, StoreError};
use crate::models::{JobRecord, JobStatus, RunSummary};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// 通过 REST 接口访问职位存储
#[derive(Clone)]
pub struct HttpJobStore {
    client: Client,
    base_url: String,
}

impl HttpJobStore {
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let base_url = base_url.into();
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::store_unreachable(&base_url, e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json(&self, endpoint: &str, body: serde_json::Value) -> AppResult<()> {
        let resp = self
            .client
            .post(endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::store_unreachable(endpoint, e))?;
        check_status(endpoint, resp).await?;
        Ok(())
    }
}

fn encode_body<T: serde::Serialize>(endpoint: &str, value: &T) -> AppResult<serde_json::Value> {
    serde_json::to_value(value).map_err(|e| {
        AppError::Store(StoreError::DecodeFailed {
            endpoint: endpoint.to_string(),
            source: Box::new(e),
        })
    })
}

async fn check_status(endpoint: &str, resp: Response) -> AppResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "<body unavailable>".to_string());
    Err(AppError::Store(StoreError::BadResponse {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    }))
}

#[async_trait]
impl JobStore for HttpJobStore {
    async fn unapplied_jobs(&self) -> AppResult<Vec<JobRecord>> {
        let endpoint = self.endpoint("/api/jobs/unapplied");
        let resp = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| AppError::store_unreachable(&endpoint, e))?;
        let resp = check_status(&endpoint, resp).await?;

        let jobs: Vec<JobRecord> = resp.json().await.map_err(|e| {
            AppError::Store(StoreError::DecodeFailed {
                endpoint: endpoint.clone(),
                source: Box::new(e),
            })
        })?;

        debug!("存储返回 {} 条职位", jobs.len());
        Ok(jobs.into_iter().filter(JobRecord::is_unapplied).collect())
    }

    async fn update_job_status(
        &self,
        id: i64,
        status: JobStatus,
        applied_at: Option<NaiveDateTime>,
    ) -> AppResult<()> {
        let endpoint = self.endpoint(&format!("/api/jobs/{}/status", id));
        let mut query = vec![("status", status.as_str().to_string())];
        if let Some(at) = applied_at {
            query.push(("appliedAt", at.format(APPLIED_AT_FORMAT).to_string()));
        }

        let resp = self
            .client
            .patch(&endpoint)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::store_unreachable(&endpoint, e))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::Store(StoreError::JobNotFound { id }));
        }
        check_status(&endpoint, resp).await?;
        Ok(())
    }

    async fn add_job(&self, job: &JobRecord) -> AppResult<()> {
        let endpoint = self.endpoint("/api/jobs/add");
        let body = encode_body(&endpoint, job)?;
        self.send_json(&endpoint, body).await
    }

    async fn push_progress(&self, progress: RunSummary) -> AppResult<()> {
        let endpoint = self.endpoint("/api/autoapply/update-progress");
        self.send_json(
            &endpoint,
            json!({
                "processed": progress.processed,
                "successful": progress.successful,
            }),
        )
        .await
    }

    async fn notify_stop(&self) -> AppResult<()> {
        let endpoint = self.endpoint("/api/autoapply/stop");
        self.send_json(&endpoint, json!({})).await
    }
}
