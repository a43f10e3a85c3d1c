//! 投递记录写入服务 - 业务能力层
//!
//! 只负责"追加一行投递结果"，不关心流程

use chrono::Local;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{ApplyOutcome, JobRecord};

/// 投递记录写入服务
///
/// 每处理一个职位写一行：`<时间> | job <id> | <状态> | <标题>`
pub struct OutcomeWriter {
    log_file_path: String,
}

impl OutcomeWriter {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            log_file_path: path.into(),
        }
    }

    /// 写入文件头（覆盖旧内容）
    pub fn init_log_file(&self) -> AppResult<()> {
        ensure_parent_dir(&self.log_file_path)?;
        let header = format!(
            "{}\n自动投递日志 - {}\n{}\n\n",
            "=".repeat(60),
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            "=".repeat(60)
        );
        fs::write(&self.log_file_path, header)
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))
    }

    /// 追加一条投递结果
    pub fn write(&self, job: &JobRecord, outcome: &ApplyOutcome) -> AppResult<()> {
        let id = job.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        debug!("写入投递记录: job {} | {}", id, outcome.status().as_str());

        let mut line = format!(
            "{} | job {} | {} | {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            id,
            outcome.status().as_str(),
            job.title
        );
        if let ApplyOutcome::Failed { reason } = outcome {
            line.push_str(&format!(" | {}", reason));
        }
        line.push('\n');

        ensure_parent_dir(&self.log_file_path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file_path)
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| AppError::file_write_failed(&self.log_file_path, e))
    }
}

fn ensure_parent_dir(path: &str) -> AppResult<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| AppError::file_write_failed(path, e))?;
        }
    }
    Ok(())
}
