//! 投递凭证服务 - 业务能力层
//!
//! 每次投递成功保存一张截图，文件名由标题和职位 ID 组成

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::error::{AppError, AppResult, FileError};

/// 截图文件信息（不含图片内容）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactEntry {
    pub file_name: String,
    pub modified: DateTime<Local>,
}

/// 投递凭证目录
#[derive(Debug, Clone)]
pub struct ProofArtifacts {
    dir: PathBuf,
}

impl ProofArtifacts {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<清洗后的标题>_<id>.png`
    pub fn proof_path(&self, title: &str, job_id: Option<i64>) -> PathBuf {
        let id = job_id.map(|id| id.to_string()).unwrap_or_else(|| "new".to_string());
        self.dir.join(format!("{}_{}.png", sanitize_title(title), id))
    }

    /// 确保目录存在
    pub fn ensure_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| AppError::file_write_failed(self.dir.display().to_string(), e))
    }

    /// 最近的 `n` 张截图，按修改时间从新到旧
    ///
    /// 目录不存在时返回空列表
    pub fn list_recent(&self, n: usize) -> AppResult<Vec<ArtifactEntry>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::File(FileError::ReadFailed {
                    path: self.dir.display().to_string(),
                    source: Box::new(e),
                }))
            }
        };

        let mut artifacts: Vec<ArtifactEntry> = entries
            .filter_map(Result::ok)
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .filter_map(|entry| {
                let modified = entry.metadata().ok()?.modified().ok()?;
                Some(ArtifactEntry {
                    file_name: entry.file_name().to_string_lossy().into_owned(),
                    modified: DateTime::<Local>::from(modified),
                })
            })
            .collect();

        artifacts.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.file_name.cmp(&b.file_name))
        });
        artifacts.truncate(n);
        Ok(artifacts)
    }
}

/// 把标题中不适合做文件名的字符替换为 `_`
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(80)
        .collect();

    if cleaned.is_empty() {
        "job".to_string()
    } else {
        cleaned
    }
}
