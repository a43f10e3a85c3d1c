use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::outcome::ApplyOutcome;

/// 职位来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobSource {
    Telegram,
    Naukri,
    Wellfound,
}

impl JobSource {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            JobSource::Telegram => "Telegram",
            JobSource::Naukri => "Naukri",
            JobSource::Wellfound => "Wellfound",
        }
    }
}

/// 从字符串解析来源（忽略大小写）
impl FromStr for JobSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "telegram" => Ok(JobSource::Telegram),
            "naukri" => Ok(JobSource::Naukri),
            "wellfound" => Ok(JobSource::Wellfound),
            other => Err(format!("未知的职位来源: {}", other)),
        }
    }
}

impl fmt::Display for JobSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 投递状态
///
/// 只由投递引擎 / 编排器修改，采集器创建的记录一律为 `Pending`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Applied,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Applied => "applied",
            JobStatus::Failed => "failed",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "applied" => Ok(JobStatus::Applied),
            "failed" => Ok(JobStatus::Failed),
            other => Err(format!("未知的投递状态: {}", other)),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 经验要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExperienceRange {
    /// 年限区间（单个数值时 min == max）
    Range { min: u32, max: u32 },
    /// 应届生
    Fresher,
    /// 无法解析
    #[default]
    Unknown,
}

impl fmt::Display for ExperienceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperienceRange::Range { min, max } if min == max => write!(f, "{} Yrs", min),
            ExperienceRange::Range { min, max } => write!(f, "{}-{} Yrs", min, max),
            ExperienceRange::Fresher => write!(f, "Fresher"),
            ExperienceRange::Unknown => write!(f, "N/A"),
        }
    }
}

impl Serialize for ExperienceRange {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ExperienceRange {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text
            .as_deref()
            .map(crate::normalizer::parse_experience)
            .unwrap_or_default())
    }
}

/// 技能列表：去重，保持插入顺序（用于展示）
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Skills(Vec<String>);

impl Skills {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入技能，忽略空白和重复（不区分大小写）
    pub fn insert(&mut self, skill: impl AsRef<str>) -> bool {
        let skill = skill.as_ref().trim();
        if skill.is_empty() || self.contains(skill) {
            return false;
        }
        self.0.push(skill.to_string());
        true
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.0.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }

    /// 从逗号分隔的字符串解析
    pub fn from_csv(text: &str) -> Self {
        text.split(',').collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for Skills {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut skills = Skills::new();
        for skill in iter {
            skills.insert(skill);
        }
        skills
    }
}

impl fmt::Display for Skills {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

impl Serialize for Skills {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Skills {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(text.as_deref().map(Skills::from_csv).unwrap_or_default())
    }
}

/// 分类标签（类别 / 工作类型 / 职级）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobTags {
    #[serde(rename = "jobCategory", deserialize_with = "nullable")]
    pub category: String,
    #[serde(deserialize_with = "nullable")]
    pub job_type: String,
    #[serde(rename = "seniorityLevel", deserialize_with = "nullable")]
    pub seniority: String,
}

impl Default for JobTags {
    fn default() -> Self {
        Self {
            category: "General Tech".to_string(),
            job_type: "Full-time".to_string(),
            seniority: "Mid-level".to_string(),
        }
    }
}

/// 规范化后的职位记录
///
/// 不变式：`applied_at.is_some()` 当且仅当 `status == Applied`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub company: String,
    #[serde(default = "default_location", deserialize_with = "deserialize_location")]
    pub location: String,
    #[serde(default)]
    pub experience: ExperienceRange,
    #[serde(default)]
    pub skills: Skills,
    #[serde(default, deserialize_with = "nullable")]
    pub url: String,
    #[serde(default)]
    pub posted_at: Option<NaiveDateTime>,
    #[serde(default = "default_source", deserialize_with = "deserialize_source")]
    pub source: JobSource,
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: JobStatus,
    #[serde(default)]
    pub applied_at: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub tags: JobTags,
}

fn default_location() -> String {
    "N/A".to_string()
}

// Java 端的实体字段可能为 null
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn deserialize_location<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(default_location))
}

fn default_source() -> JobSource {
    JobSource::Naukri
}

// 后端历史数据里 source 可能为空或为其他值
fn deserialize_source<'de, D>(deserializer: D) -> Result<JobSource, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(default_source))
}

// status 缺失 / null 视为 pending
fn deserialize_status<'de, D>(deserializer: D) -> Result<JobStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    Ok(text
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}

impl JobRecord {
    /// 创建新的待投递记录
    pub fn new(title: impl Into<String>, company: impl Into<String>, source: JobSource) -> Self {
        Self {
            id: None,
            title: title.into(),
            company: company.into(),
            location: default_location(),
            experience: ExperienceRange::Unknown,
            skills: Skills::new(),
            url: String::new(),
            posted_at: None,
            source,
            status: JobStatus::Pending,
            applied_at: None,
            tags: JobTags::default(),
        }
    }

    /// 是否仍待投递
    pub fn is_unapplied(&self) -> bool {
        self.status == JobStatus::Pending
    }

    /// 写入一次投递结果，保持 status / applied_at 一致
    pub fn record_outcome(&mut self, outcome: &ApplyOutcome) {
        self.status = outcome.status();
        self.applied_at = outcome.applied_at();
    }

    /// 日志用的简短描述
    pub fn label(&self) -> String {
        format!("{} @ {}", self.title, self.company)
    }
}
