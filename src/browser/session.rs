//! Chrome 会话：`PageDriver` 的 chromiumoxide 实现

use async_trait::async_trait;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Browser;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::browser::{connect_to_browser_and_page, launch_headless_browser};
use crate::config::{BrowserMode, Config};
use crate::error::{AppError, AppResult, BrowserError};
use crate::infrastructure::{ElementInfo, JsExecutor, Locator, PageDriver, SessionFactory};

#[derive(Deserialize)]
struct ElementProbe {
    found: bool,
    text: String,
}

/// 一个浏览器标签页
///
/// 持有 Browser，保证整个会话期间浏览器不被释放
pub struct ChromePage {
    executor: JsExecutor,
    browser: Mutex<Option<Browser>>,
    mode: BrowserMode,
}

impl ChromePage {
    pub fn new(browser: Browser, executor: JsExecutor, mode: BrowserMode) -> Self {
        Self {
            executor,
            browser: Mutex::new(Some(browser)),
            mode,
        }
    }

    async fn run_on_element(&self, locator: &Locator, action: &str) -> AppResult<()> {
        let js_code = format!(
            r#"
            (() => {{
                const el = {};
                if (!el) return false;
                {}
                return true;
            }})()
            "#,
            locator.to_js_finder(),
            action
        );

        let found: bool = self.executor.eval_as(js_code).await?;
        if found {
            Ok(())
        } else {
            Err(AppError::Browser(BrowserError::ElementNotFound {
                locator: locator.to_string(),
            }))
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn goto(&self, url: &str, timeout: Duration) -> AppResult<()> {
        debug!("导航到: {}", url);
        match tokio::time::timeout(timeout, self.executor.page().goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(AppError::navigation_failed(url, e)),
            Err(_) => Err(AppError::Browser(BrowserError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            })),
        }
    }

    async fn content(&self) -> AppResult<String> {
        Ok(self.executor.page().content().await?)
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn scroll_height(&self) -> AppResult<u64> {
        self.executor
            .eval_as("document.body ? document.body.scrollHeight : 0")
            .await
    }

    async fn scroll_to_bottom(&self) -> AppResult<()> {
        self.executor
            .eval("(() => { window.scrollTo(0, document.body.scrollHeight); return true; })()")
            .await?;
        Ok(())
    }

    async fn find(&self, locator: &Locator) -> AppResult<Option<ElementInfo>> {
        let js_code = format!(
            r#"
            (() => {{
                const el = {};
                if (!el) return {{ found: false, text: '' }};
                return {{ found: true, text: (el.innerText || el.textContent || '').trim() }};
            }})()
            "#,
            locator.to_js_finder()
        );
        let probe: ElementProbe = self.executor.eval_as(js_code).await?;
        Ok(probe.found.then_some(ElementInfo { text: probe.text }))
    }

    async fn click(&self, locator: &Locator) -> AppResult<()> {
        self.run_on_element(locator, "el.click();").await
    }

    async fn fill(&self, locator: &Locator, value: &str) -> AppResult<()> {
        // 用原生 setter 赋值，React 等框架才能感知到输入
        let action = format!(
            r#"
                el.focus();
                const proto = Object.getPrototypeOf(el);
                const setter = Object.getOwnPropertyDescriptor(proto, 'value');
                if (setter && setter.set) {{ setter.set.call(el, {value}); }} else {{ el.value = {value}; }}
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            "#,
            value = serde_json::Value::String(value.to_string())
        );
        self.run_on_element(locator, &action).await
    }

    async fn press_enter(&self, locator: &Locator) -> AppResult<()> {
        match locator {
            Locator::Css(css) => {
                let element = self.executor.page().find_element(css.as_str()).await?;
                element.press_key("Enter").await?;
                Ok(())
            }
            Locator::CssWithText { .. } => {
                let action = r#"
                    for (const type of ['keydown', 'keypress', 'keyup']) {
                        el.dispatchEvent(new KeyboardEvent(type, { key: 'Enter', code: 'Enter', keyCode: 13, bubbles: true }));
                    }
                "#;
                self.run_on_element(locator, action).await
            }
        }
    }

    async fn screenshot(&self, path: &Path) -> AppResult<()> {
        let params = ScreenshotParams::builder().full_page(true).build();
        self.executor
            .page()
            .save_screenshot(params, path)
            .await
            .map_err(|e| {
                AppError::Browser(BrowserError::ScreenshotFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })
            })?;
        Ok(())
    }

    async fn close(&self) -> AppResult<()> {
        let Some(mut browser) = self.browser.lock().await.take() else {
            return Ok(());
        };

        match self.mode {
            // 连接模式下浏览器属于用户，不关闭
            BrowserMode::Connect => Ok(()),
            BrowserMode::Launch => {
                info!("🧹 关闭浏览器");
                if let Err(e) = browser.close().await {
                    warn!("关闭浏览器失败: {}", e);
                }
                let _ = browser.wait().await;
                Ok(())
            }
        }
    }
}

/// 按配置打开 Chrome 会话
pub struct ChromeSessionFactory {
    mode: BrowserMode,
    debug_port: u16,
    chrome_executable: Option<String>,
    reuse_url_fragment: Option<String>,
}

impl ChromeSessionFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: config.browser_mode,
            debug_port: config.browser_debug_port,
            chrome_executable: config.chrome_executable.clone(),
            reuse_url_fragment: None,
        }
    }

    /// 连接模式下优先复用 URL 包含该片段的标签页（例如已登录的主页）
    pub fn reuse_tab(mut self, url_fragment: impl Into<String>) -> Self {
        self.reuse_url_fragment = Some(url_fragment.into());
        self
    }
}

#[async_trait]
impl SessionFactory for ChromeSessionFactory {
    async fn open(&self) -> AppResult<Box<dyn PageDriver>> {
        let (browser, page) = match self.mode {
            BrowserMode::Connect => {
                connect_to_browser_and_page(self.debug_port, self.reuse_url_fragment.as_deref())
                    .await?
            }
            BrowserMode::Launch => launch_headless_browser(self.chrome_executable.as_deref()).await?,
        };

        Ok(Box::new(ChromePage::new(
            browser,
            JsExecutor::new(page),
            self.mode,
        )))
    }
}
