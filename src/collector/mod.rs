//! 职位采集器
//!
//! 逐页打开搜索结果 → 滚动触发懒加载 → 解析卡片 → 经验筛选 → 累积结果。
//! 单页失败只跳过该页；结果按页序、页内 DOM 顺序排列，不去重。

pub mod pagination;
pub mod sites;

use chrono::{Local, NaiveDateTime};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PageDriver;
use crate::models::{JobRecord, ListingQuery};
use crate::normalizer::normalize_listing;
use crate::store::JobStore;

pub use pagination::Pagination;
pub use sites::ListingSite;

/// 采集策略
#[derive(Debug, Clone)]
pub struct CollectorPolicy {
    pub max_scroll_iterations: u32,
    pub scroll_settle: Duration,
    pub navigation_timeout: Duration,
}

impl CollectorPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_scroll_iterations: config.max_scroll_iterations,
            scroll_settle: Duration::from_millis(config.scroll_settle_ms),
            navigation_timeout: config.navigation_timeout(),
        }
    }
}

/// 采集计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub scraped: usize,
    pub filtered_out: usize,
    pub pages_failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub jobs: Vec<JobRecord>,
    pub stats: CollectStats,
}

pub struct Collector {
    site: ListingSite,
    policy: CollectorPolicy,
}

impl Collector {
    pub fn new(site: ListingSite, policy: CollectorPolicy) -> Self {
        Self { site, policy }
    }

    pub async fn collect(&self, page: &dyn PageDriver, query: &ListingQuery) -> AppResult<Collection> {
        let first_page = self.site.search_url(query)?;
        info!(
            "🔍 开始采集 {}: 职位='{}' 地点='{}' 经验={}-{} 共 {} 页",
            self.site.source(),
            query.role,
            query.location,
            query.experience_filter.min,
            query.experience_filter.max,
            query.page_count
        );

        let mut collection = Collection::default();
        let mut pagination = Pagination::default();

        for page_num in 1..=query.page_count {
            let url = pagination.page_url(&first_page, page_num);
            info!("🌐 第 {} 页: {}", page_num, url);

            let html = match self.load_page(page, &url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("❌ 第 {} 页加载失败，跳过: {}", page_num, e);
                    collection.stats.pages_failed += 1;
                    continue;
                }
            };

            if page_num == 1 {
                pagination = Pagination::detect(&html, &first_page);
                debug!("分页方式: {:?}", pagination);
            }

            let before = collection.jobs.len();
            self.extract(&html, &url, query, Local::now().naive_local(), &mut collection);
            info!(
                "✅ 第 {} 页完成: 新增 {} 条，累计 {} 条",
                page_num,
                collection.jobs.len() - before,
                collection.stats.scraped
            );
        }

        info!(
            "📊 采集结束: 保留 {} 条，经验不符 {} 条，失败页 {} 个",
            collection.stats.scraped, collection.stats.filtered_out, collection.stats.pages_failed
        );
        Ok(collection)
    }

    async fn load_page(&self, page: &dyn PageDriver, url: &Url) -> AppResult<String> {
        page.goto(url.as_str(), self.policy.navigation_timeout).await?;
        self.scroll_until_stable(page).await;
        page.content().await
    }

    /// 滚动到底，直到页面高度不再增长或达到次数上限
    async fn scroll_until_stable(&self, page: &dyn PageDriver) {
        let mut last_height = match page.scroll_height().await {
            Ok(h) => h,
            Err(e) => {
                debug!("获取页面高度失败，跳过滚动: {}", e);
                return;
            }
        };

        for _ in 0..self.policy.max_scroll_iterations {
            if let Err(e) = page.scroll_to_bottom().await {
                debug!("滚动失败: {}", e);
                return;
            }
            sleep(self.policy.scroll_settle).await;

            match page.scroll_height().await {
                Ok(height) if height > last_height => last_height = height,
                Ok(_) => return,
                Err(e) => {
                    debug!("获取页面高度失败: {}", e);
                    return;
                }
            }
        }
    }

    fn extract(
        &self,
        html: &str,
        page_url: &Url,
        query: &ListingQuery,
        now: NaiveDateTime,
        collection: &mut Collection,
    ) {
        let fallback_location = self.site.fallback_location(query);

        for fields in self.site.parse_cards(html, page_url) {
            let mut record = normalize_listing(&fields, self.site.source(), &fallback_location, now);

            if self.site.has_experience_signal() && !query.experience_filter.keeps(&record.experience) {
                debug!("🚫 经验不符，跳过: {} ({})", record.label(), record.experience);
                collection.stats.filtered_out += 1;
                continue;
            }
            if self.site.stamps_posted_now() {
                record.posted_at = Some(now);
            }

            debug!("💼 {} | 📍 {} | ⏳ {}", record.label(), record.location, record.experience);
            collection.jobs.push(record);
            collection.stats.scraped += 1;
        }
    }

    /// 逐条写入存储，返回成功条数
    pub async fn publish(store: &dyn JobStore, jobs: &[JobRecord]) -> usize {
        let mut saved = 0;
        for job in jobs {
            match store.add_job(job).await {
                Ok(()) => saved += 1,
                Err(e) => warn!("⚠️ 保存职位失败 {}: {}", job.label(), e),
            }
        }
        info!("📤 已保存 {}/{} 条职位", saved, jobs.len());
        saved
    }
}
