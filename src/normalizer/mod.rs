//! 记录规范化
//!
//! 把来源各异、结构松散的招聘信息统一成 `JobRecord`：
//! - 聊天消息（非结构化文本）：先做关键词过滤，再提取标题 / 公司 / 链接
//! - 招聘网站的职位卡片：已经过 DOM 选择，总是规范化

pub mod classify;
pub mod dates;
pub mod experience;
pub mod message;

use chrono::NaiveDateTime;

use crate::models::{JobRecord, JobSource, Skills};

pub use dates::{parse_posted_date, parse_posted_date_at};
pub use experience::{clean_experience_text, parse_experience};
pub use message::{normalize_message, MessageHints};

/// 规范化一条聊天消息，返回主记录（第一个候选链接）
///
/// 不含招聘关键词时返回 `None`
pub fn normalize(raw_text: &str, hints: &MessageHints) -> Option<JobRecord> {
    normalize_message(raw_text, hints).into_iter().next()
}

/// 从职位卡片中提取出的原始字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFields {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub experience_text: Option<String>,
    pub skills: Vec<String>,
    pub posted_text: Option<String>,
    pub url: Option<String>,
}

/// 规范化一张职位卡片
///
/// - 缺失的标题 / 公司为 "N/A"，缺失的地点取 `fallback_location`
/// - `posted_at` 由相对时间文本换算
pub fn normalize_listing(
    fields: &ListingFields,
    source: JobSource,
    fallback_location: &str,
    now: NaiveDateTime,
) -> JobRecord {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let title = non_empty(&fields.title).unwrap_or_else(|| "N/A".to_string());
    let company = non_empty(&fields.company).unwrap_or_else(|| "N/A".to_string());
    let location = non_empty(&fields.location).unwrap_or_else(|| fallback_location.to_string());
    let experience = fields
        .experience_text
        .as_deref()
        .map(parse_experience)
        .unwrap_or_default();

    let mut skills: Skills = fields.skills.iter().collect();
    if skills.is_empty() {
        skills = classify::detect_skills(&title);
    }
    let tags = classify::tag(&title, &skills);
    let posted_at = fields
        .posted_text
        .as_deref()
        .and_then(|t| parse_posted_date_at(t, now));

    JobRecord {
        location,
        experience,
        skills,
        url: non_empty(&fields.url).unwrap_or_default(),
        posted_at,
        tags,
        ..JobRecord::new(title, company, source)
    }
}
