use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{AppError, AppResult, FileError};

/// 浏览器获取方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserMode {
    /// 连接到已开启调试端口的浏览器
    Connect,
    /// 启动无头浏览器
    Launch,
}

impl BrowserMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "connect" => Some(BrowserMode::Connect),
            "launch" | "headless" => Some(BrowserMode::Launch),
            _ => None,
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- 浏览器 ---
    pub browser_mode: BrowserMode,
    /// 浏览器调试端口
    pub browser_debug_port: u16,
    /// 无头模式下的浏览器可执行文件（为空则自动查找）
    pub chrome_executable: Option<String>,

    // --- 职位存储（后端）---
    pub store_base_url: String,

    // --- 登录 ---
    pub naukri_email: Option<String>,
    pub naukri_password: Option<String>,
    pub login_url: String,
    /// 登录成功后 URL 中应出现的片段
    pub login_success_fragment: String,
    pub login_timeout_ms: u64,

    // --- 投递策略 ---
    /// 成功提示的轮询次数
    pub success_polls: u32,
    pub success_poll_interval_ms: u64,
    /// 打开职位页后的等待时间
    pub page_settle_ms: u64,
    /// 点击投递后的等待时间
    pub post_click_settle_ms: u64,
    pub navigation_timeout_ms: u64,
    /// 期望薪资弹窗的默认填写值
    pub expected_salary: String,

    // --- 编排 ---
    /// 两次投递之间的间隔
    pub inter_job_delay_ms: u64,
    /// stop 请求最多等待后台任务退出的时间
    pub stop_timeout_ms: u64,
    pub default_apply_limit: usize,

    // --- 采集 ---
    pub max_scroll_iterations: u32,
    pub scroll_settle_ms: u64,

    // --- 输出 ---
    /// 投递成功截图目录
    pub artifact_dir: String,
    /// 输出日志文件
    pub output_log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_mode: BrowserMode::Launch,
            browser_debug_port: 9222,
            chrome_executable: None,
            store_base_url: "http://localhost:8080".to_string(),
            naukri_email: None,
            naukri_password: None,
            login_url: "https://www.naukri.com/nlogin/login".to_string(),
            login_success_fragment: "/mnjuser/homepage".to_string(),
            login_timeout_ms: 20_000,
            success_polls: 8,
            success_poll_interval_ms: 1_000,
            page_settle_ms: 3_000,
            post_click_settle_ms: 2_500,
            navigation_timeout_ms: 60_000,
            expected_salary: "6 LPA".to_string(),
            inter_job_delay_ms: 2_000,
            stop_timeout_ms: 5_000,
            default_apply_limit: 10,
            max_scroll_iterations: 6,
            scroll_settle_ms: 1_000,
            artifact_dir: "logs/applied_jobs".to_string(),
            output_log_file: "logs/auto_apply.txt".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 只从环境变量加载（缺失或无法解析的值使用默认值）
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取 TOML 配置文件（不存在则用默认值），再应用环境变量覆盖
    ///
    /// 同时会加载当前目录下的 `.env`
    pub fn load(toml_path: impl AsRef<Path>) -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let path = toml_path.as_ref();
        let base = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| {
                AppError::File(FileError::ReadFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })
            })?;
            Self::from_toml_str(&content).map_err(|e| match e {
                AppError::File(FileError::TomlParseFailed { source, .. }) => {
                    AppError::File(FileError::TomlParseFailed {
                        path: path.display().to_string(),
                        source,
                    })
                }
                other => other,
            })?
        } else {
            tracing::debug!("配置文件 {} 不存在，使用默认配置", path.display());
            Self::default()
        };

        Ok(base.with_env_overrides())
    }

    /// 解析 TOML 内容，未出现的字段使用默认值
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            browser_mode: std::env::var("BROWSER_MODE").ok().and_then(|v| BrowserMode::parse(&v)).unwrap_or(default.browser_mode),
            browser_debug_port: std::env::var("BROWSER_DEBUG_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.browser_debug_port),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok().or(default.chrome_executable),
            store_base_url: std::env::var("STORE_BASE_URL").unwrap_or(default.store_base_url),
            naukri_email: std::env::var("NAUKRI_EMAIL").ok().or(default.naukri_email),
            naukri_password: std::env::var("NAUKRI_PASSWORD").ok().or(default.naukri_password),
            login_url: std::env::var("LOGIN_URL").unwrap_or(default.login_url),
            login_success_fragment: std::env::var("LOGIN_SUCCESS_FRAGMENT").unwrap_or(default.login_success_fragment),
            login_timeout_ms: std::env::var("LOGIN_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.login_timeout_ms),
            success_polls: std::env::var("SUCCESS_POLLS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.success_polls),
            success_poll_interval_ms: std::env::var("SUCCESS_POLL_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.success_poll_interval_ms),
            page_settle_ms: std::env::var("PAGE_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_settle_ms),
            post_click_settle_ms: std::env::var("POST_CLICK_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.post_click_settle_ms),
            navigation_timeout_ms: std::env::var("NAVIGATION_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.navigation_timeout_ms),
            expected_salary: std::env::var("EXPECTED_SALARY").unwrap_or(default.expected_salary),
            inter_job_delay_ms: std::env::var("INTER_JOB_DELAY_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.inter_job_delay_ms),
            stop_timeout_ms: std::env::var("STOP_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.stop_timeout_ms),
            default_apply_limit: std::env::var("APPLY_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.default_apply_limit),
            max_scroll_iterations: std::env::var("MAX_SCROLL_ITERATIONS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_scroll_iterations),
            scroll_settle_ms: std::env::var("SCROLL_SETTLE_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.scroll_settle_ms),
            artifact_dir: std::env::var("ARTIFACT_DIR").unwrap_or(default.artifact_dir),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }
}
