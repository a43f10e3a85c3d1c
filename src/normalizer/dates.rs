//! 发布时间解析：相对时间 → 绝对时间
//!
//! 尽力而为，无法识别的文本一律返回 `None`，不会报错

use chrono::{Duration, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

static RE_DAYS_AGO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)\+?\s*days?").unwrap());

/// 以当前本地时间为基准解析
pub fn parse_posted_date(text: &str) -> Option<NaiveDateTime> {
    parse_posted_date_at(text, chrono::Local::now().naive_local())
}

/// 以给定时间为基准解析
///
/// - "today" / "just now" → now
/// - "yesterday" → now - 1 天
/// - "N day(s) ago" → now - N 天
pub fn parse_posted_date_at(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    if text.contains("today") || text.contains("just now") {
        return Some(now);
    }
    if text.contains("yesterday") {
        return Some(now - Duration::days(1));
    }

    let days: i64 = RE_DAYS_AGO.captures(&text)?.get(1)?.as_str().parse().ok()?;
    now.checked_sub_signed(Duration::try_days(days)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_relative_days() {
        let now = fixed_now();
        assert_eq!(parse_posted_date_at("Today", now), Some(now));
        assert_eq!(
            parse_posted_date_at("Yesterday", now),
            Some(now - Duration::days(1))
        );
        assert_eq!(
            parse_posted_date_at("Posted 3 days ago", now),
            Some(now - Duration::days(3))
        );
        assert_eq!(
            parse_posted_date_at("30+ Days Ago", now),
            Some(now - Duration::days(30))
        );
    }

    #[test]
    fn test_monotonic_ordering() {
        let today = parse_posted_date("today").unwrap();
        let one = parse_posted_date("1 day ago").unwrap();
        let two = parse_posted_date("2 days ago").unwrap();
        assert!(today >= one);
        assert!(one >= two);
    }

    #[test]
    fn test_unparseable_is_none() {
        let now = fixed_now();
        assert_eq!(parse_posted_date(""), None);
        assert_eq!(parse_posted_date_at("N/A", now), None);
        assert_eq!(parse_posted_date_at("last week", now), None);
        assert_eq!(parse_posted_date_at("99999999999999999999 days ago", now), None);
        assert_eq!(parse_posted_date_at("9999999999999 days ago", now), None);
    }
}
