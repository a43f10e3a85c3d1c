//! 页面驱动抽象 - 基础设施层
//!
//! 一次运行只有一个逻辑页面，所有导航和 DOM 查询都顺序地经过它。
//! 投递引擎和采集器只依赖这个 trait，不直接接触浏览器。

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::AppResult;

/// 元素定位方式（纯数据，便于测试）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS 选择器，取第一个匹配元素
    Css(String),
    /// CSS 选择器 + 文本包含，取第一个文本包含 `text` 的匹配元素
    CssWithText { css: String, text: String },
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn with_text(css: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::CssWithText {
            css: css.into(),
            text: text.into(),
        }
    }

    /// 生成查找该元素的 JS 表达式（找不到时为 null）
    pub fn to_js_finder(&self) -> String {
        match self {
            Locator::Css(css) => format!("document.querySelector({})", js_string(css)),
            Locator::CssWithText { css, text } => format!(
                "(Array.from(document.querySelectorAll({})).find(el => (el.innerText || el.textContent || '').includes({})) || null)",
                js_string(css),
                js_string(text)
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(css) => write!(f, "{}", css),
            Locator::CssWithText { css, text } => write!(f, "{}:has-text('{}')", css, text),
        }
    }
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// 元素信息
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ElementInfo {
    /// 可见文本（已去除首尾空白）
    pub text: String,
}

/// 页面驱动
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// 导航到指定 URL，超时视为失败
    async fn goto(&self, url: &str, timeout: Duration) -> AppResult<()>;

    /// 当前页面的完整 HTML
    async fn content(&self) -> AppResult<String>;

    async fn current_url(&self) -> AppResult<String>;

    /// 页面总高度（用于判断懒加载是否结束）
    async fn scroll_height(&self) -> AppResult<u64>;

    async fn scroll_to_bottom(&self) -> AppResult<()>;

    /// 查找元素，找不到返回 `None`
    async fn find(&self, locator: &Locator) -> AppResult<Option<ElementInfo>>;

    /// 点击元素，找不到时返回错误
    async fn click(&self, locator: &Locator) -> AppResult<()>;

    /// 填写输入框
    async fn fill(&self, locator: &Locator, value: &str) -> AppResult<()>;

    /// 在元素上按下回车
    async fn press_enter(&self, locator: &Locator) -> AppResult<()>;

    /// 保存整页截图
    async fn screenshot(&self, path: &Path) -> AppResult<()>;

    /// 结束会话（默认什么都不做）
    async fn close(&self) -> AppResult<()> {
        Ok(())
    }
}

/// 会话工厂：为一次运行打开一个页面
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> AppResult<Box<dyn PageDriver>>;
}
