use crate::error::{AppResult, ConfigError};
use crate::models::job::ExperienceRange;

/// 经验筛选区间（闭区间，单位：年）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceFilter {
    pub min: u32,
    pub max: u32,
}

impl Default for ExperienceFilter {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

impl ExperienceFilter {
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    /// 解析 "min-max" 格式
    pub fn parse(text: &str) -> AppResult<Self> {
        let invalid = || ConfigError::InvalidExperienceFilter {
            value: text.to_string(),
        };
        let (min, max) = text.trim().split_once('-').ok_or_else(invalid)?;
        let min = min.trim().parse().map_err(|_| invalid())?;
        let max = max.trim().parse().map_err(|_| invalid())?;
        Ok(Self { min, max })
    }

    /// 解析失败时回退到默认区间 0-100
    pub fn parse_or_default(text: Option<&str>) -> Self {
        text.and_then(|t| Self::parse(t).ok()).unwrap_or_default()
    }

    /// 是否保留该经验要求
    ///
    /// - 应届生：总是保留
    /// - 区间：与筛选区间有交集则保留
    /// - 无法解析：丢弃
    pub fn keeps(&self, experience: &ExperienceRange) -> bool {
        match *experience {
            ExperienceRange::Fresher => true,
            ExperienceRange::Range { min, max } => max >= self.min && min <= self.max,
            ExperienceRange::Unknown => false,
        }
    }
}

/// 采集查询条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub role: String,
    pub location: String,
    pub page_count: u32,
    pub experience_filter: ExperienceFilter,
    /// 发布时间筛选（天数，如 "1" / "3" / "7"）
    pub posted_filter: Option<String>,
}

impl ListingQuery {
    pub fn new(role: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            location: location.into(),
            page_count: 1,
            experience_filter: ExperienceFilter::default(),
            posted_filter: None,
        }
    }

    pub fn with_pages(mut self, page_count: u32) -> Self {
        self.page_count = page_count;
        self
    }

    pub fn with_experience(mut self, filter: ExperienceFilter) -> Self {
        self.experience_filter = filter;
        self
    }

    pub fn with_posted(mut self, posted: impl Into<String>) -> Self {
        self.posted_filter = Some(posted.into());
        self
    }
}
