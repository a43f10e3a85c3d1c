//! 投递上下文
//!
//! 封装"我正在处理批次中的第几个职位"这一信息，只用于日志

use std::fmt::Display;

use crate::models::JobRecord;

#[derive(Debug, Clone)]
pub struct ApplyCtx {
    /// 职位在批次中的序号（从1开始）
    pub index: usize,
    /// 批次中的职位总数
    pub total: usize,
    pub job_id: Option<i64>,
}

impl ApplyCtx {
    pub fn new(index: usize, total: usize, job: &JobRecord) -> Self {
        Self {
            index,
            total,
            job_id: job.id,
        }
    }

    /// 批次之外单独投递一个职位
    pub fn single(job: &JobRecord) -> Self {
        Self::new(1, 1, job)
    }
}

impl Display for ApplyCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.job_id {
            Some(id) => write!(f, "[职位 {}/{} #{}]", self.index, self.total, id),
            None => write!(f, "[职位 {}/{}]", self.index, self.total),
        }
    }
}
