//! 编排器控制面：启动 / 停止 / 查询 / 同步执行
//!
//! 同一时间只允许一个批次在运行；进度通过 watch 通道发布快照

use chrono::Local;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult, OrchestratorError};
use crate::models::{RunProgress, RunStatus, RunSummary};
use crate::orchestrator::auto_apply::AutoApplyRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartOutcome {
    Started,
    AlreadyRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped,
    /// 等待超时，后台任务会在当前职位结束后退出
    StopPending,
    NotRunning,
}

/// 状态查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    #[serde(flatten)]
    pub progress: RunProgress,
    pub running: bool,
}

struct ActiveRun {
    id: u64,
    cancel: CancellationToken,
    task: JoinHandle<RunSummary>,
}

/// 编排器句柄
pub struct OrchestratorHandle {
    runner: AutoApplyRunner,
    progress: Arc<watch::Sender<RunProgress>>,
    active: Mutex<Option<ActiveRun>>,
    run_ids: AtomicU64,
    stop_timeout: Duration,
}

impl OrchestratorHandle {
    pub fn new(runner: AutoApplyRunner, stop_timeout: Duration) -> Self {
        let (progress, _) = watch::channel(RunProgress::default());
        Self {
            runner,
            progress: Arc::new(progress),
            active: Mutex::new(None),
            run_ids: AtomicU64::new(0),
            stop_timeout,
        }
    }

    /// 在后台启动一个批次；已有批次在运行时拒绝
    pub async fn start(&self, limit: usize) -> StartOutcome {
        match self.spawn_run(limit).await {
            Some(_) => StartOutcome::Started,
            None => StartOutcome::AlreadyRunning,
        }
    }

    async fn spawn_run(&self, limit: usize) -> Option<u64> {
        let mut active = self.active.lock().await;
        // 已发布最终状态的任务只剩返回，不再占用
        let busy = active.as_ref().is_some_and(|run| !run.task.is_finished())
            && self.progress.borrow().is_running();
        if busy {
            warn!("⚠️ 自动投递已在运行中，忽略本次启动请求");
            return None;
        }

        let cancel = CancellationToken::new();
        // 先同步置为 running，调用方立刻就能查询到
        self.progress
            .send_replace(RunProgress::started(Local::now().naive_local()));

        let runner = self.runner.clone();
        let progress = Arc::clone(&self.progress);
        let token = cancel.clone();
        let task = tokio::spawn(async move { runner.run(limit, &token, &progress).await });

        let id = self.run_ids.fetch_add(1, Ordering::Relaxed) + 1;
        *active = Some(ActiveRun { id, cancel, task });
        info!("▶️ 已在后台启动自动投递 (上限 {})", limit);
        Some(id)
    }

    /// 请求停止，最多等待 `stop_timeout`
    pub async fn stop(&self) -> StopOutcome {
        let mut active = self.active.lock().await;
        let Some(run) = active.as_mut() else {
            return StopOutcome::NotRunning;
        };
        if run.task.is_finished() {
            *active = None;
            return StopOutcome::NotRunning;
        }

        info!("🛑 请求停止自动投递...");
        run.cancel.cancel();

        match tokio::time::timeout(self.stop_timeout, &mut run.task).await {
            Ok(Ok(summary)) => {
                info!(
                    "✅ 自动投递已停止: 处理 {} 个，成功 {} 个",
                    summary.processed, summary.successful
                );
                *active = None;
                StopOutcome::Stopped
            }
            Ok(Err(e)) => {
                error!("❌ 后台任务异常退出: {}", e);
                self.mark_aborted(e.to_string());
                *active = None;
                StopOutcome::Stopped
            }
            Err(_) => {
                warn!("⏳ 后台任务未在 {:?} 内退出，停止请求挂起", self.stop_timeout);
                StopOutcome::StopPending
            }
        }
    }

    /// 等待当前批次结束（没有批次在运行时立即返回）
    pub async fn wait_idle(&self) -> RunSummary {
        let mut rx = self.progress.subscribe();
        let summary = match rx.wait_for(|p| !p.is_running()).await {
            Ok(progress) => progress.summary(),
            Err(_) => self.progress.borrow().summary(),
        };
        summary
    }

    /// 放弃等待仍在运行的批次：直接推送当前进度和结束信号
    ///
    /// 用于进程即将退出、后台任务来不及自己收尾的情况
    pub async fn abandon(&self) -> RunSummary {
        let summary = self.progress.borrow().summary();
        if self.progress.borrow().is_running() {
            warn!("⚠️ 批次仍在运行，直接通知存储已停止");
            self.runner.report_stopped(summary).await;
        }
        summary
    }

    /// 当前进度快照（最多落后一个职位）
    pub fn status(&self) -> StatusReport {
        let progress = self.progress.borrow().clone();
        let running = progress.is_running();
        StatusReport { progress, running }
    }

    /// 订阅进度变化
    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.progress.subscribe()
    }

    /// 同步执行一个批次并返回计数
    ///
    /// 受同一个重入保护：已有批次在运行时返回 `AlreadyRunning`
    pub async fn run_once(&self, limit: usize) -> AppResult<RunSummary> {
        let mut rx = self.progress.subscribe();
        let Some(run_id) = self.spawn_run(limit).await else {
            return Err(AppError::Orchestrator(OrchestratorError::AlreadyRunning));
        };

        let finished = rx
            .wait_for(|p| !p.is_running())
            .await
            .map_err(|e| {
                AppError::Orchestrator(OrchestratorError::TaskAborted {
                    reason: e.to_string(),
                })
            })?
            .summary();

        // 回收本次启动的任务（可能已被 stop 回收）
        let own_run = {
            let mut active = self.active.lock().await;
            match active.as_ref() {
                Some(run) if run.id == run_id => active.take(),
                _ => None,
            }
        };
        match own_run {
            Some(run) => run.task.await.map_err(|e| {
                self.mark_aborted(e.to_string());
                AppError::Orchestrator(OrchestratorError::TaskAborted {
                    reason: e.to_string(),
                })
            }),
            None => Ok(finished),
        }
    }

    fn mark_aborted(&self, reason: String) {
        self.progress.send_modify(|p| {
            p.status = RunStatus::Error;
            p.error = Some(reason);
        });
    }
}
