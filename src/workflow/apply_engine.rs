//! 单个职位的投递流程 - 流程层
//!
//! 流程顺序（命中即终止）：
//! 1. 没有 URL → failed
//! 2. 打开职位页，失败 / 超时 → failed
//! 3. 查找投递按钮，找不到 → failed
//! 4. 按钮文字是"去公司官网投递" → pending（不点击）
//! 5. 点击，按顺序处理已知弹窗（尽力而为）
//! 6. 轮询成功提示 → applied + 截图；超出次数 → failed

use chrono::{Local, NaiveDateTime, Timelike};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, ApplyError};
use crate::infrastructure::{Locator, PageDriver};
use crate::models::{ApplyOutcome, JobRecord};
use crate::services::ProofArtifacts;
use crate::utils::truncate_text;
use crate::workflow::apply_ctx::ApplyCtx;

/// 投递按钮的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffordanceKind {
    /// 站内直接投递
    Direct,
    /// 需要到公司官网投递
    HandOff,
}

/// 按钮文字（小写）包含 pattern 即归为对应分类，按顺序匹配
pub const AFFORDANCE_RULES: &[(&str, AffordanceKind)] = &[
    ("company site", AffordanceKind::HandOff),
    ("employer site", AffordanceKind::HandOff),
];

pub fn classify_affordance(text: &str) -> AffordanceKind {
    let text = text.to_lowercase();
    AFFORDANCE_RULES
        .iter()
        .find(|(pattern, _)| text.contains(pattern))
        .map(|(_, kind)| *kind)
        .unwrap_or(AffordanceKind::Direct)
}

/// 查找投递按钮的顺序
pub fn apply_locators() -> Vec<Locator> {
    vec![
        Locator::css("button[title*='Apply']"),
        Locator::css("a[title*='Apply']"),
        Locator::with_text("button", "Apply"),
        Locator::with_text("a", "Apply"),
    ]
}

pub fn success_locator() -> Locator {
    Locator::with_text("div", "You have successfully applied")
}

/// 弹窗动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAction {
    /// 点击第一个存在的元素
    Click(Vec<Locator>),
    /// 在第一个存在的输入框里填写并回车
    FillAndEnter { inputs: Vec<Locator>, value: String },
}

/// 点击投递后可能出现的弹窗
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupStep {
    pub name: &'static str,
    /// 出现该元素时才执行；`None` 表示总是尝试
    pub trigger: Option<Locator>,
    pub action: PopupAction,
}

/// 投递策略
#[derive(Debug, Clone)]
pub struct ApplyPolicy {
    pub success_polls: u32,
    pub poll_interval: Duration,
    /// 打开职位页后等待页面稳定
    pub page_settle: Duration,
    /// 处理完弹窗后再开始轮询
    pub post_click_settle: Duration,
    pub navigation_timeout: Duration,
    /// 期望薪资弹窗的填写值
    pub expected_salary: String,
}

impl ApplyPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            success_polls: config.success_polls,
            poll_interval: Duration::from_millis(config.success_poll_interval_ms),
            page_settle: Duration::from_millis(config.page_settle_ms),
            post_click_settle: Duration::from_millis(config.post_click_settle_ms),
            navigation_timeout: config.navigation_timeout(),
            expected_salary: config.expected_salary.clone(),
        }
    }

    /// 已知弹窗，按顺序处理
    pub fn popup_steps(&self) -> Vec<PopupStep> {
        vec![
            PopupStep {
                name: "性别",
                trigger: Some(Locator::with_text(
                    "div, span, p, label",
                    "What is your gender identity?",
                )),
                action: PopupAction::Click(vec![Locator::with_text("label, button, span", "Male")]),
            },
            PopupStep {
                name: "期望薪资",
                trigger: Some(Locator::with_text("div, span, p, label", "Expected salary")),
                action: PopupAction::FillAndEnter {
                    inputs: vec![Locator::css("input"), Locator::css("textarea")],
                    value: self.expected_salary.clone(),
                },
            },
            PopupStep {
                name: "提交",
                trigger: None,
                action: PopupAction::Click(vec![
                    Locator::with_text("button", "Submit"),
                    Locator::with_text("button", "Continue"),
                ]),
            },
        ]
    }
}

impl Default for ApplyPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 投递引擎
///
/// - 只依赖 `PageDriver`，不持有页面
/// - 永远返回一个 `ApplyOutcome`，错误在内部折叠为 failed
pub struct ApplyEngine {
    policy: ApplyPolicy,
    artifacts: ProofArtifacts,
}

impl ApplyEngine {
    pub fn new(policy: ApplyPolicy, artifacts: ProofArtifacts) -> Self {
        Self { policy, artifacts }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ApplyPolicy::from_config(config),
            ProofArtifacts::new(&config.artifact_dir),
        )
    }

    pub async fn apply_to(&self, page: &dyn PageDriver, job: &JobRecord, ctx: &ApplyCtx) -> ApplyOutcome {
        if job.url.trim().is_empty() {
            warn!("{} ⚠️ 缺少 URL: {}", ctx, job.label());
            return ApplyOutcome::failed(ApplyError::NoUrl.to_string());
        }

        info!("{} ➡️ 打开职位: {}", ctx, truncate_text(&job.label(), 80));

        match self.attempt(page, job, ctx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                if e.is_transient_page_error() {
                    warn!("{} ⚠️ 页面加载失败: {}", ctx, e);
                } else {
                    error!("{} ❌ 投递失败: {}", ctx, e);
                }
                ApplyOutcome::failed(e.to_string())
            }
        }
    }

    async fn attempt(&self, page: &dyn PageDriver, job: &JobRecord, ctx: &ApplyCtx) -> AppResult<ApplyOutcome> {
        page.goto(&job.url, self.policy.navigation_timeout).await?;
        sleep(self.policy.page_settle).await;

        let Some((locator, text)) = self.locate_affordance(page).await? else {
            return Err(AppError::Apply(ApplyError::NoAffordance {
                url: job.url.clone(),
            }));
        };
        debug!("{} 找到投递按钮 {} ({})", ctx, locator, text);

        if classify_affordance(&text) == AffordanceKind::HandOff {
            info!("{} 🟡 需要去公司官网投递，标记为 pending", ctx);
            return Ok(ApplyOutcome::Pending);
        }

        page.click(&locator).await?;
        self.resolve_popups(page, ctx).await;
        sleep(self.policy.post_click_settle).await;

        if !self.wait_for_success(page).await {
            return Err(AppError::Apply(ApplyError::AmbiguousOutcome {
                polls: self.policy.success_polls,
            }));
        }

        let at = now_seconds();
        info!("{} ✅ 投递成功: {} ({})", ctx, job.label(), at);
        self.capture_proof(page, job, ctx).await;
        Ok(ApplyOutcome::Applied { at })
    }

    async fn locate_affordance(&self, page: &dyn PageDriver) -> AppResult<Option<(Locator, String)>> {
        for locator in apply_locators() {
            if let Some(element) = page.find(&locator).await? {
                return Ok(Some((locator, element.text)));
            }
        }
        Ok(None)
    }

    /// 弹窗处理失败只记录，不影响本次投递
    async fn resolve_popups(&self, page: &dyn PageDriver, ctx: &ApplyCtx) {
        for step in self.policy.popup_steps() {
            match self.run_popup_step(page, &step).await {
                Ok(true) => debug!("{} 已处理弹窗: {}", ctx, step.name),
                Ok(false) => {}
                Err(e) => warn!("{} ⚠️ 跳过弹窗 {}: {}", ctx, step.name, e),
            }
        }
    }

    async fn run_popup_step(&self, page: &dyn PageDriver, step: &PopupStep) -> AppResult<bool> {
        if let Some(trigger) = &step.trigger {
            if page.find(trigger).await?.is_none() {
                return Ok(false);
            }
        }

        match &step.action {
            PopupAction::Click(targets) => {
                let Some(target) = first_present(page, targets).await? else {
                    return Ok(false);
                };
                page.click(target).await?;
            }
            PopupAction::FillAndEnter { inputs, value } => {
                let Some(input) = first_present(page, inputs).await? else {
                    return Ok(false);
                };
                page.fill(input, value).await?;
                page.press_enter(input).await?;
            }
        }
        Ok(true)
    }

    async fn wait_for_success(&self, page: &dyn PageDriver) -> bool {
        let indicator = success_locator();
        for poll in 1..=self.policy.success_polls {
            match page.find(&indicator).await {
                Ok(Some(_)) => return true,
                Ok(None) => {}
                Err(e) => debug!("第 {} 次检查成功提示出错: {}", poll, e),
            }
            if poll < self.policy.success_polls {
                sleep(self.policy.poll_interval).await;
            }
        }
        false
    }

    /// 截图失败不改变投递结果
    async fn capture_proof(&self, page: &dyn PageDriver, job: &JobRecord, ctx: &ApplyCtx) {
        if let Err(e) = self.artifacts.ensure_dir() {
            warn!("{} ⚠️ 无法创建截图目录: {}", ctx, e);
            return;
        }
        let path = self.artifacts.proof_path(&job.title, job.id);
        match page.screenshot(&path).await {
            Ok(()) => debug!("{} 📸 截图已保存: {}", ctx, path.display()),
            Err(e) => warn!("{} ⚠️ 截图失败: {}", ctx, e),
        }
    }
}

async fn first_present<'a>(page: &dyn PageDriver, candidates: &'a [Locator]) -> AppResult<Option<&'a Locator>> {
    for locator in candidates {
        if page.find(locator).await?.is_some() {
            return Ok(Some(locator));
        }
    }
    Ok(None)
}

fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}
