use chrono::NaiveDateTime;

use crate::models::job::JobStatus;

/// 单次投递的结果
///
/// 只在一次投递中短暂存在，随即折叠进 `JobRecord.status`。
/// 用枚举表达，保证只有 `Applied` 携带投递时间。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// 投递成功
    Applied { at: NaiveDateTime },
    /// 需要去公司官网投递（主动移交，不算失败）
    Pending,
    /// 投递失败
    Failed { reason: String },
}

impl ApplyOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        ApplyOutcome::Failed {
            reason: reason.into(),
        }
    }

    /// 对应的职位状态
    pub fn status(&self) -> JobStatus {
        match self {
            ApplyOutcome::Applied { .. } => JobStatus::Applied,
            ApplyOutcome::Pending => JobStatus::Pending,
            ApplyOutcome::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn applied_at(&self) -> Option<NaiveDateTime> {
        match self {
            ApplyOutcome::Applied { at } => Some(*at),
            _ => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ApplyOutcome::Applied { .. })
    }
}
