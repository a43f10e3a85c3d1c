//! 进程内存储：测试和本地试运行使用

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::{Mutex, MutexGuard};

use super::JobStore;
use crate::error::{AppError, AppResult, StoreError};
use crate::models::{JobRecord, JobStatus, RunSummary};

#[derive(Default)]
struct MemoryState {
    jobs: Vec<JobRecord>,
    next_id: i64,
    progress: Vec<RunSummary>,
    stop_signals: usize,
}

/// 内存中的职位存储
///
/// - 按 url 去重（空 url 不参与去重）
/// - 状态回写后写覆盖先写
/// - 记录所有进度推送和结束信号
#[derive(Default)]
pub struct MemoryJobStore {
    state: Mutex<MemoryState>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置职位，缺失的 ID 会自动分配
    pub fn with_jobs(jobs: impl IntoIterator<Item = JobRecord>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for job in jobs {
                state.insert(job);
            }
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn jobs(&self) -> Vec<JobRecord> {
        self.lock().jobs.clone()
    }

    pub fn job(&self, id: i64) -> Option<JobRecord> {
        self.lock().jobs.iter().find(|j| j.id == Some(id)).cloned()
    }

    pub fn progress_pushes(&self) -> Vec<RunSummary> {
        self.lock().progress.clone()
    }

    pub fn stop_signals(&self) -> usize {
        self.lock().stop_signals
    }
}

impl MemoryState {
    fn insert(&mut self, mut job: JobRecord) -> bool {
        if !job.url.is_empty() && self.jobs.iter().any(|j| j.url == job.url) {
            return false;
        }
        match job.id {
            Some(id) => self.next_id = self.next_id.max(id),
            None => {
                self.next_id += 1;
                job.id = Some(self.next_id);
            }
        }
        self.jobs.push(job);
        true
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn unapplied_jobs(&self) -> AppResult<Vec<JobRecord>> {
        Ok(self
            .lock()
            .jobs
            .iter()
            .filter(|j| j.is_unapplied())
            .cloned()
            .collect())
    }

    async fn update_job_status(
        &self,
        id: i64,
        status: JobStatus,
        applied_at: Option<NaiveDateTime>,
    ) -> AppResult<()> {
        let mut state = self.lock();
        let job = state
            .jobs
            .iter_mut()
            .find(|j| j.id == Some(id))
            .ok_or(AppError::Store(StoreError::JobNotFound { id }))?;

        job.status = status;
        job.applied_at = applied_at.filter(|_| status == JobStatus::Applied);
        Ok(())
    }

    async fn add_job(&self, job: &JobRecord) -> AppResult<()> {
        self.lock().insert(job.clone());
        Ok(())
    }

    async fn push_progress(&self, progress: RunSummary) -> AppResult<()> {
        self.lock().progress.push(progress);
        Ok(())
    }

    async fn notify_stop(&self) -> AppResult<()> {
        self.lock().stop_signals += 1;
        Ok(())
    }
}
