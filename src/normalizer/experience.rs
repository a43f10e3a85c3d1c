//! 经验要求解析

use regex::Regex;
use std::sync::LazyLock;

use crate::models::ExperienceRange;

static RE_DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").unwrap());

/// 统一经验文本：不间断空格、长短破折号、"Years" → "Yrs"
pub fn clean_experience_text(text: &str) -> String {
    text.trim()
        .replace('\u{a0}', " ")
        .replace(['\u{2013}', '\u{2014}'], "-")
        .replace("Years", "Yrs")
}

/// 解析经验要求
///
/// - 含 "fresher" → `Fresher`
/// - 至少两组数字 → 取前两组 `(low, high)`
/// - 只有一组数字 → `(val, val)`
/// - 没有数字 → `Unknown`
pub fn parse_experience(text: &str) -> ExperienceRange {
    let normalized = clean_experience_text(text).to_lowercase();

    if normalized.contains("fresher") {
        return ExperienceRange::Fresher;
    }

    let numbers: Vec<u32> = RE_DIGITS
        .find_iter(&normalized)
        .filter_map(|m| m.as_str().parse().ok())
        .take(2)
        .collect();

    match numbers.as_slice() {
        [low, high] => ExperienceRange::Range {
            min: *low,
            max: *high,
        },
        [val] => ExperienceRange::Range {
            min: *val,
            max: *val,
        },
        _ => ExperienceRange::Unknown,
    }
}
