//! 职位存储接口
//!
//! 存储本身是外部协作方，这里只定义采集器和编排器需要的调用

pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::AppResult;
use crate::models::{JobRecord, JobStatus, RunSummary};

pub use http::HttpJobStore;
pub use memory::MemoryJobStore;

/// 投递时间在接口中的格式
pub const APPLIED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[async_trait]
pub trait JobStore: Send + Sync {
    /// 状态为空或 pending 的职位
    async fn unapplied_jobs(&self) -> AppResult<Vec<JobRecord>>;

    /// 回写投递状态（幂等，后写覆盖先写）
    async fn update_job_status(
        &self,
        id: i64,
        status: JobStatus,
        applied_at: Option<NaiveDateTime>,
    ) -> AppResult<()>;

    /// 追加职位，去重由存储负责
    async fn add_job(&self, job: &JobRecord) -> AppResult<()>;

    /// 推送批次进度
    async fn push_progress(&self, progress: RunSummary) -> AppResult<()>;

    /// 通知批次已结束
    async fn notify_stop(&self) -> AppResult<()>;
}
