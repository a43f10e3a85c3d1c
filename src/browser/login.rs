//! 登录流程
//!
//! 自动登录 → 在限定时间内轮询 URL 确认 → 确认不了就退化为人工登录

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, SessionError};
use crate::infrastructure::{Locator, PageDriver};

/// 人工介入步骤（例如在浏览器里手动完成验证码后回车）
#[async_trait]
pub trait ManualStep: Send + Sync {
    async fn wait_for_manual_login(&self) -> AppResult<()>;
}

/// 默认实现：在终端等待回车
pub struct StdinManualStep;

#[async_trait]
impl ManualStep for StdinManualStep {
    async fn wait_for_manual_login(&self) -> AppResult<()> {
        warn!("⚠️ 需要手动登录，请在浏览器中完成登录后按 ENTER 继续...");
        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .map_err(|e| {
                AppError::Session(SessionError::ManualStepFailed {
                    reason: e.to_string(),
                })
            })?;
        Ok(())
    }
}

/// 登录凭据
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// 登录流程
pub struct LoginFlow {
    login_url: String,
    success_fragment: String,
    timeout: Duration,
    poll_interval: Duration,
    navigation_timeout: Duration,
    credentials: Option<Credentials>,
    manual: Arc<dyn ManualStep>,
}

impl LoginFlow {
    pub fn new(config: &Config, manual: Arc<dyn ManualStep>) -> Self {
        let credentials = match (&config.naukri_email, &config.naukri_password) {
            (Some(email), Some(password)) if !email.is_empty() => Some(Credentials {
                email: email.clone(),
                password: password.clone(),
            }),
            _ => None,
        };

        Self {
            login_url: config.login_url.clone(),
            success_fragment: config.login_success_fragment.clone(),
            timeout: Duration::from_millis(config.login_timeout_ms),
            poll_interval: Duration::from_millis(500),
            navigation_timeout: config.navigation_timeout(),
            credentials,
            manual,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 确保页面处于登录状态
    ///
    /// 只有登录页打不开（或人工步骤本身失败）才返回错误，这会中止整个批次
    pub async fn ensure_logged_in(&self, page: &dyn PageDriver) -> AppResult<()> {
        info!("🔐 正在登录 Naukri...");

        page.goto(&self.login_url, self.navigation_timeout)
            .await
            .map_err(|e| {
                AppError::Session(SessionError::LoginPageUnreachable {
                    url: self.login_url.clone(),
                    reason: e.to_string(),
                })
            })?;

        match self.try_automatic_login(page).await {
            Ok(()) => {
                info!("✅ 登录成功");
                Ok(())
            }
            Err(e) => {
                warn!("⚠️ {}，转为人工登录", e);
                self.manual.wait_for_manual_login().await?;
                info!("✅ 已确认人工登录，继续执行");
                Ok(())
            }
        }
    }

    async fn try_automatic_login(&self, page: &dyn PageDriver) -> AppResult<()> {
        if let Some(credentials) = &self.credentials {
            if let Err(e) = self.submit_credentials(page, credentials).await {
                warn!("自动填写登录表单失败: {}", e);
            }
        } else {
            warn!("未配置 NAUKRI_EMAIL / NAUKRI_PASSWORD");
        }

        self.wait_for_success_url(page).await
    }

    async fn submit_credentials(&self, page: &dyn PageDriver, credentials: &Credentials) -> AppResult<()> {
        page.fill(&Locator::css("#usernameField"), &credentials.email).await?;
        page.fill(&Locator::css("#passwordField"), &credentials.password).await?;

        for locator in [
            Locator::css(".btn-primary.loginButton"),
            Locator::css("button[type='submit']"),
        ] {
            if page.find(&locator).await?.is_some() {
                return page.click(&locator).await;
            }
        }
        Ok(())
    }

    async fn wait_for_success_url(&self, page: &dyn PageDriver) -> AppResult<()> {
        let started = Instant::now();
        loop {
            if let Ok(url) = page.current_url().await {
                if url.contains(&self.success_fragment) {
                    return Ok(());
                }
            }
            if started.elapsed() >= self.timeout {
                return Err(AppError::Session(SessionError::AuthRequired {
                    waited_ms: self.timeout.as_millis() as u64,
                }));
            }
            sleep(self.poll_interval).await;
        }
    }
}
