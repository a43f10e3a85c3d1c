//! 聊天消息（非结构化文本）→ 职位记录

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

use crate::models::{JobRecord, JobSource};
use crate::normalizer::classify;

static RE_JOB_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(hir(e|ing)|job|opening|requirement|internship)").unwrap()
});
static RE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+([A-Za-z][A-Za-z ]*?)\s+(?:at|in)\s").unwrap()
});
static RE_COMPANY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:at|with)\s+([A-Za-z0-9][A-Za-z0-9 &.\-]*)").unwrap()
});
static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://[^\s]+").unwrap());

/// 标题回退时的最大长度（字符数）
pub const TITLE_FALLBACK_MAX_CHARS: usize = 60;

/// 消息附带的提示信息
#[derive(Debug, Clone)]
pub struct MessageHints {
    pub source: JobSource,
    /// 内联按钮上的链接，每个都视为一个独立的候选职位
    pub button_urls: Vec<String>,
    pub posted_at: Option<NaiveDateTime>,
}

impl MessageHints {
    pub fn new(source: JobSource) -> Self {
        Self {
            source,
            button_urls: Vec::new(),
            posted_at: None,
        }
    }

    pub fn with_buttons(mut self, urls: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.button_urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_posted_at(mut self, posted_at: NaiveDateTime) -> Self {
        self.posted_at = Some(posted_at);
        self
    }
}

/// 是否包含招聘关键词
pub fn has_job_keywords(text: &str) -> bool {
    RE_JOB_KEYWORDS.is_match(text)
}

/// 提取标题：`for <words> (at|in)`，否则取第一行（截断到 60 字符）
pub fn extract_title(text: &str) -> String {
    if let Some(title) = RE_TITLE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|t| !t.is_empty())
    {
        return title.to_string();
    }

    let first_line: String = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default()
        .chars()
        .take(TITLE_FALLBACK_MAX_CHARS)
        .collect();
    let first_line = first_line.trim();

    if first_line.is_empty() {
        "Job Post".to_string()
    } else {
        first_line.to_string()
    }
}

/// 提取公司：`(at|with) <words>`，否则为 "Unknown"
pub fn extract_company(text: &str) -> String {
    RE_COMPANY
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches(['.', '-', ' ']).trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// 提取文本中的所有链接（去掉末尾标点）
pub fn extract_links(text: &str) -> Vec<String> {
    RE_URL
        .find_iter(text)
        .map(|m| {
            m.as_str()
                .trim_end_matches(['.', ',', ';', ')', ']', '>', '"', '\''])
                .to_string()
        })
        .collect()
}

/// 候选链接：文本中的第一个链接 + 所有按钮链接（去重，保持顺序）
pub fn candidate_links(text: &str, button_urls: &[String]) -> Vec<String> {
    let mut links: Vec<String> = Vec::new();
    let first = extract_links(text).into_iter().next();
    for link in first.into_iter().chain(button_urls.iter().cloned()) {
        let link = link.trim().to_string();
        if !link.is_empty() && !links.contains(&link) {
            links.push(link);
        }
    }
    links
}

fn detect_location(text: &str) -> String {
    let lower = text.to_lowercase();
    if lower.contains("remote") || lower.contains("work from home") {
        "Remote".to_string()
    } else {
        "N/A".to_string()
    }
}

/// 规范化一条聊天消息
///
/// 不含招聘关键词 → 空列表；每个候选链接产生一条记录（标题 / 公司相同，URL 不同）。
/// 没有任何链接时仍产生一条 URL 为空的记录。
pub fn normalize_message(text: &str, hints: &MessageHints) -> Vec<JobRecord> {
    if !has_job_keywords(text) {
        return Vec::new();
    }

    let title = extract_title(text);
    let company = extract_company(text);
    let location = detect_location(text);
    let skills = classify::detect_skills(&title);
    let tags = classify::tag(&title, &skills);

    let template = JobRecord {
        location,
        skills,
        posted_at: hints.posted_at,
        tags,
        ..JobRecord::new(title, company, hints.source)
    };

    let links = candidate_links(text, &hints.button_urls);
    if links.is_empty() {
        return vec![template];
    }

    links
        .into_iter()
        .map(|url| JobRecord {
            url,
            ..template.clone()
        })
        .collect()
}
