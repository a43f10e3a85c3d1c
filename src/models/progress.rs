use chrono::NaiveDateTime;
use serde::Serialize;

/// 批次运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Finished,
    Error,
}

/// 一个批次的进度计数
///
/// 只由编排器的后台任务写入，状态查询读取快照
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunProgress {
    pub processed: usize,
    pub successful: usize,
    pub status: RunStatus,
    pub started_at: Option<NaiveDateTime>,
    pub error: Option<String>,
}

impl RunProgress {
    /// 新批次开始时的初始状态
    pub fn started(at: NaiveDateTime) -> Self {
        Self {
            status: RunStatus::Running,
            started_at: Some(at),
            ..Default::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            processed: self.processed,
            successful: self.successful,
        }
    }
}

/// 批次结束后返回给调用方的计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub processed: usize,
    pub successful: usize,
}
