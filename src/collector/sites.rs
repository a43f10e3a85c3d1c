//! 招聘网站：搜索 URL 和职位卡片解析

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

use crate::error::{AppError, AppResult};
use crate::models::{JobSource, ListingQuery};
use crate::normalizer::ListingFields;

struct CardSelectors {
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    experience: Option<Selector>,
    posted: Option<Selector>,
    skills: Option<Selector>,
    link: Selector,
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static NAUKRI: LazyLock<CardSelectors> = LazyLock::new(|| CardSelectors {
    card: selector("div.cust-job-tuple"),
    title: selector("a.title"),
    company: selector("a.comp-name"),
    location: selector("span.loc"),
    experience: Some(selector("li.exp, span.exp")),
    posted: Some(selector("span.job-post-day")),
    skills: Some(selector("ul.tags-gt li, ul.tags.has-description li, span.chip")),
    link: selector("a.title[href]"),
});

static WELLFOUND: LazyLock<CardSelectors> = LazyLock::new(|| CardSelectors {
    card: selector("div[data-testid='JobResult'], li.job-result"),
    title: selector("h3"),
    company: selector("h4"),
    location: selector("span[data-testid='JobLocation']"),
    experience: None,
    posted: None,
    skills: None,
    link: selector("a[href]"),
});

/// 支持的招聘网站
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSite {
    Naukri,
    Wellfound,
}

impl ListingSite {
    pub fn source(self) -> JobSource {
        match self {
            ListingSite::Naukri => JobSource::Naukri,
            ListingSite::Wellfound => JobSource::Wellfound,
        }
    }

    /// 第 1 页的搜索 URL
    pub fn search_url(self, query: &ListingQuery) -> AppResult<Url> {
        let url = match self {
            ListingSite::Naukri => {
                let mut url = Url::parse(&format!(
                    "https://www.naukri.com/{}-jobs-in-{}",
                    slug(&query.role),
                    slug(&query.location)
                ))
                .map_err(|e| AppError::Other(format!("无效的搜索 URL: {}", e)))?;
                if let Some(posted) = query.posted_filter.as_deref().filter(|p| !p.trim().is_empty()) {
                    url.query_pairs_mut().append_pair("last", posted.trim());
                }
                url
            }
            ListingSite::Wellfound => {
                let mut url = Url::parse("https://wellfound.com/jobs")
                    .map_err(|e| AppError::Other(format!("无效的搜索 URL: {}", e)))?;
                url.query_pairs_mut()
                    .append_pair("remote", "true")
                    .append_pair("keywords", query.role.trim());
                url
            }
        };
        Ok(url)
    }

    /// 卡片上是否有经验信息；没有的站点不做经验筛选
    pub fn has_experience_signal(self) -> bool {
        matches!(self, ListingSite::Naukri)
    }

    /// 卡片上没有发布时间，以采集时间为准
    pub fn stamps_posted_now(self) -> bool {
        matches!(self, ListingSite::Wellfound)
    }

    /// 卡片上缺少地点时的默认值
    pub fn fallback_location(self, query: &ListingQuery) -> String {
        match self {
            ListingSite::Naukri => query.location.clone(),
            ListingSite::Wellfound => "N/A".to_string(),
        }
    }

    fn selectors(self) -> &'static CardSelectors {
        match self {
            ListingSite::Naukri => &NAUKRI,
            ListingSite::Wellfound => &WELLFOUND,
        }
    }

    /// 按 DOM 顺序解析职位卡片
    pub fn parse_cards(self, html: &str, page_url: &Url) -> Vec<ListingFields> {
        let document = Html::parse_document(html);
        let sel = self.selectors();

        document
            .select(&sel.card)
            .map(|card| {
                let mut fields = ListingFields {
                    title: first_text(card, &sel.title),
                    company: first_text(card, &sel.company),
                    location: first_text(card, &sel.location),
                    experience_text: sel.experience.as_ref().and_then(|s| first_text(card, s)),
                    skills: sel
                        .skills
                        .as_ref()
                        .map(|s| card.select(s).map(element_text).filter(|t| !t.is_empty()).collect())
                        .unwrap_or_default(),
                    posted_text: sel.posted.as_ref().and_then(|s| first_text(card, s)),
                    url: card
                        .select(&sel.link)
                        .next()
                        .and_then(|a| a.value().attr("href"))
                        .and_then(|href| page_url.join(href.trim()).ok())
                        .map(String::from),
                };
                if self == ListingSite::Wellfound && fields.company.is_none() {
                    fields.company = Some("Unknown".to_string());
                }
                fields
            })
            .collect()
    }
}

/// "Rust Developer" → "rust-developer"
fn slug(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}
