//! 分页 URL 推导
//!
//! 第 1 页中若有形如 `<当前路径>-<N>` 的分页链接，后续页按该模式生成；
//! 否则退化为 `?page=N`（已有查询参数时为 `&page=N`）

use scraper::{Html, Selector};
use std::sync::LazyLock;
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("link selector"));

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Pagination {
    /// `?page=N`
    #[default]
    QueryParam,
    /// `<base_path>-<N>`，保留第 1 页的查询参数
    PathSuffix { base_path: String },
}

impl Pagination {
    /// 扫描第 1 页中的分页链接
    pub fn detect(html: &str, first_page: &Url) -> Self {
        let base_path = first_page.path().trim_end_matches('/').to_string();
        if base_path.is_empty() {
            return Pagination::QueryParam;
        }

        let document = Html::parse_document(html);
        let found = document
            .select(&LINK_SELECTOR)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| first_page.join(href).ok())
            .filter(|link| link.host_str() == first_page.host_str())
            .any(|link| page_suffix(link.path(), &base_path).is_some());

        if found {
            Pagination::PathSuffix { base_path }
        } else {
            Pagination::QueryParam
        }
    }

    /// 第 `page` 页的 URL（第 1 页即原 URL）
    pub fn page_url(&self, first_page: &Url, page: u32) -> Url {
        if page <= 1 {
            return first_page.clone();
        }

        let mut url = first_page.clone();
        match self {
            Pagination::QueryParam => {
                url.query_pairs_mut().append_pair("page", &page.to_string());
            }
            Pagination::PathSuffix { base_path } => {
                url.set_path(&format!("{}-{}", base_path, page));
            }
        }
        url
    }
}

fn page_suffix(path: &str, base_path: &str) -> Option<u32> {
    let rest = path.trim_end_matches('/').strip_prefix(base_path)?;
    let digits = rest.strip_prefix('-')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n| *n > 1)
}
