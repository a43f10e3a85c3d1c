//! 自动投递批次 - 编排层
//!
//! 一个批次：读取待投递职位 → 打开并登录一个会话 → 逐个投递 → 回写状态和进度。
//! 单个职位的错误不会中止批次，只有拿不到会话才会。

use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::browser::LoginFlow;
use crate::config::Config;
use crate::error::{AppError, AppResult, StoreError};
use crate::infrastructure::{PageDriver, SessionFactory};
use crate::models::{ApplyOutcome, JobRecord, RunProgress, RunStatus, RunSummary};
use crate::services::OutcomeWriter;
use crate::store::JobStore;
use crate::workflow::{ApplyCtx, ApplyEngine};

/// 执行一个批次所需的全部协作方
#[derive(Clone)]
pub struct AutoApplyRunner {
    store: Arc<dyn JobStore>,
    sessions: Arc<dyn SessionFactory>,
    engine: Arc<ApplyEngine>,
    login: Option<Arc<LoginFlow>>,
    writer: Option<Arc<OutcomeWriter>>,
    inter_job_delay: Duration,
}

impl AutoApplyRunner {
    pub fn new(store: Arc<dyn JobStore>, sessions: Arc<dyn SessionFactory>, engine: ApplyEngine) -> Self {
        Self {
            store,
            sessions,
            engine: Arc::new(engine),
            login: None,
            writer: None,
            inter_job_delay: Duration::ZERO,
        }
    }

    /// 按配置组装：投递策略、批次间隔、投递日志
    pub fn from_config(
        config: &Config,
        store: Arc<dyn JobStore>,
        sessions: Arc<dyn SessionFactory>,
        login: LoginFlow,
    ) -> Self {
        Self::new(store, sessions, ApplyEngine::from_config(config))
            .with_login(login)
            .with_writer(OutcomeWriter::with_path(&config.output_log_file))
            .with_inter_job_delay(Duration::from_millis(config.inter_job_delay_ms))
    }

    /// 不设置时认为会话已登录（例如连接到已登录的浏览器）
    pub fn with_login(mut self, login: LoginFlow) -> Self {
        self.login = Some(Arc::new(login));
        self
    }

    pub fn with_writer(mut self, writer: OutcomeWriter) -> Self {
        self.writer = Some(Arc::new(writer));
        self
    }

    pub fn with_inter_job_delay(mut self, delay: Duration) -> Self {
        self.inter_job_delay = delay;
        self
    }

    /// 执行一个批次
    ///
    /// 无论以何种方式结束，都会推送最终进度并通知存储批次已停止
    pub async fn run(
        &self,
        limit: usize,
        cancel: &CancellationToken,
        progress: &watch::Sender<RunProgress>,
    ) -> RunSummary {
        progress.send_replace(RunProgress::started(Local::now().naive_local()));
        info!("🚀 自动投递开始 (上限 {} 个)", limit);

        let status = match self.run_batch(limit, cancel, progress).await {
            Ok(()) => RunStatus::Finished,
            Err(e) => {
                error!("❌ 批次中止: {}", e);
                progress.send_modify(|p| p.error = Some(e.to_string()));
                RunStatus::Error
            }
        };

        let summary = progress.borrow().summary();
        self.report_stopped(summary).await;
        progress.send_modify(|p| p.status = status);

        info!(
            "🏁 自动投递结束: 处理 {} 个，成功 {} 个",
            summary.processed, summary.successful
        );
        summary
    }

    async fn run_batch(
        &self,
        limit: usize,
        cancel: &CancellationToken,
        progress: &watch::Sender<RunProgress>,
    ) -> AppResult<()> {
        let jobs = self.store.unapplied_jobs().await?;
        let batch: Vec<JobRecord> = jobs.into_iter().take(limit).collect();
        if batch.is_empty() {
            info!("✅ 没有待投递的职位");
            return Ok(());
        }

        info!("📋 待投递职位 {} 个", batch.len());

        if let Some(writer) = &self.writer {
            if let Err(e) = writer.init_log_file() {
                warn!("⚠️ 初始化投递日志失败: {}", e);
            }
        }
        self.push_progress(RunSummary::default()).await;

        let page = self.sessions.open().await?;
        let result = self.apply_all(page.as_ref(), &batch, cancel, progress).await;
        if let Err(e) = page.close().await {
            warn!("⚠️ 关闭会话失败: {}", e);
        }
        result
    }

    async fn apply_all(
        &self,
        page: &dyn PageDriver,
        batch: &[JobRecord],
        cancel: &CancellationToken,
        progress: &watch::Sender<RunProgress>,
    ) -> AppResult<()> {
        if let Some(login) = &self.login {
            login.ensure_logged_in(page).await?;
        }

        let total = batch.len();
        for (index, job) in batch.iter().enumerate() {
            if index > 0 && !self.inter_job_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(self.inter_job_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                info!("🛑 收到停止信号，剩余 {} 个职位不再处理", total - index);
                break;
            }

            let ctx = ApplyCtx::new(index + 1, total, job);
            let outcome = self.engine.apply_to(page, job, &ctx).await;
            self.persist(job, &outcome, &ctx).await;

            progress.send_modify(|p| {
                p.processed += 1;
                if outcome.is_applied() {
                    p.successful += 1;
                }
            });
            let summary = progress.borrow().summary();
            self.push_progress(summary).await;
        }
        Ok(())
    }

    /// 回写状态失败只记录，本地计数仍然有效
    async fn persist(&self, job: &JobRecord, outcome: &ApplyOutcome, ctx: &ApplyCtx) {
        let result = match job.id {
            Some(id) => {
                self.store
                    .update_job_status(id, outcome.status(), outcome.applied_at())
                    .await
            }
            None => Err(AppError::Store(StoreError::MissingId {
                title: job.title.clone(),
            })),
        };
        match result {
            Ok(()) => info!("{} 📝 状态已回写: {}", ctx, outcome.status()),
            Err(e) => warn!("{} ⚠️ 状态回写失败: {}", ctx, e),
        }

        if let Some(writer) = &self.writer {
            if let Err(e) = writer.write(job, outcome) {
                warn!("{} ⚠️ 写入投递日志失败: {}", ctx, e);
            }
        }
    }

    /// 推送最终进度并通知存储批次已停止
    ///
    /// 进程来不及等后台任务退出时也由调用方直接调用，避免看板停留在运行中
    pub async fn report_stopped(&self, summary: RunSummary) {
        self.push_progress(summary).await;
        if let Err(e) = self.store.notify_stop().await {
            warn!("⚠️ 通知存储批次结束失败: {}", e);
        }
    }

    async fn push_progress(&self, summary: RunSummary) {
        if let Err(e) = self.store.push_progress(summary).await {
            warn!("⚠️ 推送进度失败: {}", e);
        }
    }
}
