//! 集成测试用的进程内替身：页面、会话工厂、存储
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use jobpilot::error::{AppError, AppResult, BrowserError};
use jobpilot::infrastructure::{ElementInfo, Locator, PageDriver, SessionFactory};
use jobpilot::models::{JobRecord, JobSource, JobStatus, RunSummary};
use jobpilot::store::{JobStore, MemoryJobStore};
use jobpilot::workflow::ApplyPolicy;

/// 一个假页面的内容
#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pub html: String,
    /// 打开页面就存在的元素
    pub elements: Vec<(Locator, String)>,
    /// 在该页面上任意点击后才出现的元素
    pub after_click: Vec<(Locator, String)>,
    /// 点击后跳转到的 URL
    pub redirect_after_click: Option<String>,
    /// 导航失败
    pub broken: bool,
}

impl FakeSite {
    pub fn html(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn with_element(mut self, locator: Locator, text: &str) -> Self {
        self.elements.push((locator, text.to_string()));
        self
    }

    pub fn with_after_click(mut self, locator: Locator, text: &str) -> Self {
        self.after_click.push((locator, text.to_string()));
        self
    }

    pub fn redirect_after_click(mut self, url: &str) -> Self {
        self.redirect_after_click = Some(url.to_string());
        self
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Default::default()
        }
    }
}

/// 按 URL 返回预设内容的页面，记录所有操作
#[derive(Default)]
pub struct FakePage {
    sites: Mutex<HashMap<String, FakeSite>>,
    current: Mutex<String>,
    clicked_on: Mutex<HashSet<String>>,
    pub visits: Mutex<Vec<String>>,
    pub clicks: Mutex<Vec<Locator>>,
    pub fills: Mutex<Vec<(Locator, String)>>,
    pub screenshots: Mutex<Vec<PathBuf>>,
    pub scrolls: AtomicUsize,
    /// 每次滚动后页面增高多少（0 表示不再加载）
    pub height_step: u64,
    /// 每次导航的耗时
    pub goto_delay: Duration,
    pub closed: AtomicUsize,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goto_delay(mut self, delay: Duration) -> Self {
        self.goto_delay = delay;
        self
    }

    pub fn with_height_step(mut self, step: u64) -> Self {
        self.height_step = step;
        self
    }

    pub fn with_site(self, url: &str, site: FakeSite) -> Self {
        self.sites.lock().unwrap().insert(url.to_string(), site);
        self
    }

    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().unwrap().clone()
    }

    pub fn clicks(&self) -> Vec<Locator> {
        self.clicks.lock().unwrap().clone()
    }

    pub fn screenshots(&self) -> Vec<PathBuf> {
        self.screenshots.lock().unwrap().clone()
    }

    fn current_site(&self) -> Option<FakeSite> {
        let current = self.current.lock().unwrap().clone();
        self.sites.lock().unwrap().get(&current).cloned()
    }

    fn visible(&self, locator: &Locator) -> Option<String> {
        let current = self.current.lock().unwrap().clone();
        let site = self.current_site()?;
        let clicked = self.clicked_on.lock().unwrap().contains(&current);

        site.elements
            .iter()
            .chain(site.after_click.iter().filter(|_| clicked))
            .find(|(l, _)| l == locator)
            .map(|(_, text)| text.clone())
    }
}

#[async_trait]
impl PageDriver for FakePage {
    async fn goto(&self, url: &str, timeout: Duration) -> AppResult<()> {
        if !self.goto_delay.is_zero() {
            tokio::time::sleep(self.goto_delay).await;
        }
        self.visits.lock().unwrap().push(url.to_string());

        let site = self.sites.lock().unwrap().get(url).cloned();
        match site {
            Some(site) if !site.broken => {
                *self.current.lock().unwrap() = url.to_string();
                Ok(())
            }
            _ => Err(AppError::Browser(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })),
        }
    }

    async fn content(&self) -> AppResult<String> {
        Ok(self.current_site().map(|s| s.html).unwrap_or_default())
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn scroll_height(&self) -> AppResult<u64> {
        Ok(1000 + self.scrolls.load(Ordering::SeqCst) as u64 * self.height_step)
    }

    async fn scroll_to_bottom(&self) -> AppResult<()> {
        self.scrolls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> AppResult<Option<ElementInfo>> {
        Ok(self.visible(locator).map(|text| ElementInfo { text }))
    }

    async fn click(&self, locator: &Locator) -> AppResult<()> {
        if self.visible(locator).is_none() {
            return Err(AppError::Browser(BrowserError::ElementNotFound {
                locator: locator.to_string(),
            }));
        }
        self.clicks.lock().unwrap().push(locator.clone());

        let current = self.current.lock().unwrap().clone();
        self.clicked_on.lock().unwrap().insert(current);
        if let Some(next) = self.current_site().and_then(|s| s.redirect_after_click) {
            *self.current.lock().unwrap() = next;
        }
        Ok(())
    }

    async fn fill(&self, locator: &Locator, value: &str) -> AppResult<()> {
        if self.visible(locator).is_none() {
            return Err(AppError::Browser(BrowserError::ElementNotFound {
                locator: locator.to_string(),
            }));
        }
        self.fills
            .lock()
            .unwrap()
            .push((locator.clone(), value.to_string()));
        Ok(())
    }

    async fn press_enter(&self, _locator: &Locator) -> AppResult<()> {
        Ok(())
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        self.screenshots.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// 把共享的 FakePage 交给编排器，测试里仍能检查它
pub struct SharedPage(pub Arc<FakePage>);

#[async_trait]
impl PageDriver for SharedPage {
    async fn goto(&self, url: &str, timeout: Duration) -> AppResult<()> {
        self.0.goto(url, timeout).await
    }
    async fn content(&self) -> AppResult<String> {
        self.0.content().await
    }
    async fn current_url(&self) -> AppResult<String> {
        self.0.current_url().await
    }
    async fn scroll_height(&self) -> AppResult<u64> {
        self.0.scroll_height().await
    }
    async fn scroll_to_bottom(&self) -> AppResult<()> {
        self.0.scroll_to_bottom().await
    }
    async fn find(&self, locator: &Locator) -> AppResult<Option<ElementInfo>> {
        self.0.find(locator).await
    }
    async fn click(&self, locator: &Locator) -> AppResult<()> {
        self.0.click(locator).await
    }
    async fn fill(&self, locator: &Locator, value: &str) -> AppResult<()> {
        self.0.fill(locator, value).await
    }
    async fn press_enter(&self, locator: &Locator) -> AppResult<()> {
        self.0.press_enter(locator).await
    }
    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        self.0.screenshot(path).await
    }
    async fn close(&self) -> AppResult<()> {
        self.0.close().await
    }
}

/// 会话工厂替身：记录打开次数，可以模拟打开失败
pub struct FakeSessionFactory {
    pub page: Arc<FakePage>,
    pub opens: AtomicUsize,
    pub fail: bool,
}

impl FakeSessionFactory {
    pub fn new(page: Arc<FakePage>) -> Self {
        Self {
            page,
            opens: AtomicUsize::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Arc::new(FakePage::new()))
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeSessionFactory {
    async fn open(&self) -> AppResult<Box<dyn PageDriver>> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::browser_connection_failed(
                9222,
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            ));
        }
        Ok(Box::new(SharedPage(Arc::clone(&self.page))))
    }
}

/// 包装 MemoryJobStore：可在第 N 次状态回写后触发取消，可模拟推送失败
pub struct RecordingStore {
    pub inner: MemoryJobStore,
    status_updates: AtomicUsize,
    cancel_after: Mutex<Option<(usize, CancellationToken)>>,
    pub fail_reads: bool,
    pub fail_progress: bool,
}

impl RecordingStore {
    pub fn new(jobs: Vec<JobRecord>) -> Self {
        Self {
            inner: MemoryJobStore::with_jobs(jobs),
            status_updates: AtomicUsize::new(0),
            cancel_after: Mutex::new(None),
            fail_reads: false,
            fail_progress: false,
        }
    }

    pub fn cancel_after_updates(self, n: usize, token: CancellationToken) -> Self {
        *self.cancel_after.lock().unwrap() = Some((n, token));
        self
    }

    pub fn status_updates(&self) -> usize {
        self.status_updates.load(Ordering::SeqCst)
    }

    fn unreachable() -> AppError {
        AppError::store_unreachable(
            "http://store.test",
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "down"),
        )
    }
}

#[async_trait]
impl JobStore for RecordingStore {
    async fn unapplied_jobs(&self) -> AppResult<Vec<JobRecord>> {
        if self.fail_reads {
            return Err(Self::unreachable());
        }
        self.inner.unapplied_jobs().await
    }

    async fn update_job_status(
        &self,
        id: i64,
        status: JobStatus,
        applied_at: Option<NaiveDateTime>,
    ) -> AppResult<()> {
        self.inner.update_job_status(id, status, applied_at).await?;
        let done = self.status_updates.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((n, token)) = self.cancel_after.lock().unwrap().as_ref() {
            if done >= *n {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn add_job(&self, job: &JobRecord) -> AppResult<()> {
        self.inner.add_job(job).await
    }

    async fn push_progress(&self, progress: RunSummary) -> AppResult<()> {
        if self.fail_progress {
            return Err(Self::unreachable());
        }
        self.inner.push_progress(progress).await
    }

    async fn notify_stop(&self) -> AppResult<()> {
        self.inner.notify_stop().await
    }
}

/// 不等待的投递策略
pub fn fast_policy() -> ApplyPolicy {
    ApplyPolicy {
        success_polls: 3,
        poll_interval: Duration::ZERO,
        page_settle: Duration::ZERO,
        post_click_settle: Duration::ZERO,
        navigation_timeout: Duration::from_secs(1),
        expected_salary: "6 LPA".to_string(),
    }
}

pub fn job_at(url: &str, title: &str) -> JobRecord {
    let mut job = JobRecord::new(title, "Acme", JobSource::Naukri);
    job.url = url.to_string();
    job
}

/// 一个可以直接投递成功的职位页
pub fn applicable_site() -> FakeSite {
    FakeSite::html("<html></html>")
        .with_element(Locator::css("button[title*='Apply']"), "Apply")
        .with_after_click(
            Locator::with_text("div", "You have successfully applied"),
            "You have successfully applied to Rust Dev",
        )
}
