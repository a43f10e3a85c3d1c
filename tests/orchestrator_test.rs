mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use common::{applicable_site, fast_policy, job_at, FakePage, FakeSessionFactory, FakeSite, RecordingStore};
use jobpilot::browser::{LoginFlow, ManualStep};
use jobpilot::config::Config;
use jobpilot::error::AppResult;
use jobpilot::models::{JobStatus, RunProgress, RunStatus, RunSummary};
use jobpilot::orchestrator::{AutoApplyRunner, OrchestratorHandle, StartOutcome, StopOutcome};
use jobpilot::services::ProofArtifacts;
use jobpilot::workflow::ApplyEngine;

fn url(n: usize) -> String {
    format!("https://www.naukri.com/job-listings-{}", n)
}

/// n 个职位，全部可以投递成功
fn fixture(n: usize) -> (Vec<jobpilot::models::JobRecord>, Arc<FakePage>) {
    let mut page = FakePage::new();
    let mut jobs = Vec::new();
    for i in 1..=n {
        page = page.with_site(&url(i), applicable_site());
        jobs.push(job_at(&url(i), &format!("Rust Dev {}", i)));
    }
    (jobs, Arc::new(page))
}

fn runner(store: Arc<RecordingStore>, sessions: Arc<FakeSessionFactory>, dir: &std::path::Path) -> AutoApplyRunner {
    AutoApplyRunner::new(
        store,
        sessions,
        ApplyEngine::new(fast_policy(), ProofArtifacts::new(dir)),
    )
}

#[tokio::test]
async fn test_run_applies_and_reports_progress_after_every_job() {
    let dir = tempfile::tempdir().unwrap();
    let (mut jobs, page) = fixture(3);
    jobs.push(job_at("", "No link"));
    let store = Arc::new(RecordingStore::new(jobs));
    let sessions = Arc::new(FakeSessionFactory::new(page.clone()));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions.clone(), dir.path())
        .run(10, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary, RunSummary { processed: 4, successful: 3 });
    assert_eq!(sessions.opens(), 1);
    assert_eq!(page.closed.load(std::sync::atomic::Ordering::SeqCst), 1);

    // 初始 0/0，每个职位一次，最后一次
    let pushes = store.inner.progress_pushes();
    assert_eq!(pushes.len(), 6);
    assert!(pushes.windows(2).all(|w| w[0].processed <= w[1].processed
        && w[0].successful <= w[1].successful));
    assert_eq!(pushes.last().copied(), Some(summary));
    assert_eq!(store.inner.stop_signals(), 1);

    let statuses: Vec<_> = store.inner.jobs().iter().map(|j| j.status).collect();
    assert_eq!(
        statuses,
        vec![JobStatus::Applied, JobStatus::Applied, JobStatus::Applied, JobStatus::Failed]
    );
    assert!(store.inner.jobs()[0].applied_at.is_some());
    assert_eq!(tx.borrow().status, RunStatus::Finished);
}

#[tokio::test]
async fn test_cancellation_stops_at_job_boundary() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, page) = fixture(5);
    let cancel = CancellationToken::new();
    let store = Arc::new(RecordingStore::new(jobs).cancel_after_updates(2, cancel.clone()));
    let sessions = Arc::new(FakeSessionFactory::new(page.clone()));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions, dir.path())
        .with_inter_job_delay(Duration::from_millis(20))
        .run(10, &cancel, &tx)
        .await;

    assert_eq!(summary.processed, 2);
    assert_eq!(page.visits().len(), 2);
    assert_eq!(store.inner.stop_signals(), 1);
    assert_eq!(store.inner.progress_pushes().last().copied(), Some(summary));
    assert_eq!(tx.borrow().status, RunStatus::Finished);

    // 已处理的职位保留结果，其余仍待投递
    let pending = store.inner.jobs().iter().filter(|j| j.is_unapplied()).count();
    assert_eq!(pending, 3);
}

#[tokio::test]
async fn test_inter_job_delay_is_cut_short_by_cancel() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, page) = fixture(3);
    let cancel = CancellationToken::new();
    let store = Arc::new(RecordingStore::new(jobs).cancel_after_updates(1, cancel.clone()));
    let sessions = Arc::new(FakeSessionFactory::new(page.clone()));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let started = Instant::now();
    let summary = runner(store.clone(), sessions, dir.path())
        .with_inter_job_delay(Duration::from_secs(30))
        .run(10, &cancel, &tx)
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(summary, RunSummary { processed: 1, successful: 1 });
    assert_eq!(page.visits().len(), 1);
    assert_eq!(store.inner.stop_signals(), 1);
}

#[tokio::test]
async fn test_empty_queue_reports_zero_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordingStore::new(Vec::new()));
    let sessions = Arc::new(FakeSessionFactory::new(Arc::new(FakePage::new())));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions.clone(), dir.path())
        .run(10, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary, RunSummary::default());
    assert_eq!(sessions.opens(), 0);
    assert_eq!(store.inner.progress_pushes(), vec![RunSummary::default()]);
    assert_eq!(store.inner.stop_signals(), 1);
    assert_eq!(tx.borrow().status, RunStatus::Finished);
}

#[tokio::test]
async fn test_session_failure_marks_error_and_still_stops() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, _page) = fixture(2);
    let store = Arc::new(RecordingStore::new(jobs));
    let sessions = Arc::new(FakeSessionFactory::failing());
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions, dir.path())
        .run(10, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary.processed, 0);
    assert_eq!(store.inner.stop_signals(), 1);
    let progress = tx.borrow().clone();
    assert_eq!(progress.status, RunStatus::Error);
    assert!(progress.error.is_some());
}

#[tokio::test]
async fn test_unreachable_store_marks_error_without_session() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, page) = fixture(2);
    let mut store = RecordingStore::new(jobs);
    store.fail_reads = true;
    let store = Arc::new(store);
    let sessions = Arc::new(FakeSessionFactory::new(page));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions.clone(), dir.path())
        .run(10, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary, RunSummary::default());
    assert_eq!(sessions.opens(), 0);
    assert_eq!(store.inner.progress_pushes(), vec![RunSummary::default()]);
    assert_eq!(store.inner.stop_signals(), 1);
    let progress = tx.borrow().clone();
    assert_eq!(progress.status, RunStatus::Error);
    assert!(progress.error.is_some());
}

#[tokio::test]
async fn test_store_push_failures_do_not_abort_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, page) = fixture(2);
    let mut store = RecordingStore::new(jobs);
    store.fail_progress = true;
    let store = Arc::new(store);
    let sessions = Arc::new(FakeSessionFactory::new(page));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions, dir.path())
        .run(10, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary, RunSummary { processed: 2, successful: 2 });
    assert_eq!(store.status_updates(), 2);
    assert_eq!(tx.borrow().status, RunStatus::Finished);
}

#[tokio::test]
async fn test_limit_caps_batch() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, page) = fixture(4);
    let store = Arc::new(RecordingStore::new(jobs));
    let sessions = Arc::new(FakeSessionFactory::new(page));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions, dir.path())
        .run(2, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary.processed, 2);
    assert_eq!(store.inner.jobs().iter().filter(|j| j.is_unapplied()).count(), 2);
}

#[tokio::test]
async fn test_zero_limit_skips_session() {
    let dir = tempfile::tempdir().unwrap();
    let (jobs, page) = fixture(1);
    let store = Arc::new(RecordingStore::new(jobs));
    let sessions = Arc::new(FakeSessionFactory::new(page.clone()));
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store.clone(), sessions.clone(), dir.path())
        .run(0, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary, RunSummary::default());
    assert_eq!(sessions.opens(), 0);
    assert!(page.visits().is_empty());
    assert_eq!(store.inner.stop_signals(), 1);
    assert_eq!(store.inner.jobs().iter().filter(|j| j.is_unapplied()).count(), 1);
    assert_eq!(tx.borrow().status, RunStatus::Finished);
}

struct NoManualStep;

#[async_trait::async_trait]
impl ManualStep for NoManualStep {
    async fn wait_for_manual_login(&self) -> AppResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_login_runs_once_per_batch() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        naukri_email: Some("me@example.com".to_string()),
        naukri_password: Some("secret".to_string()),
        ..Config::default()
    };
    let login_page = FakeSite::html("<form></form>")
        .with_element(jobpilot::Locator::css("#usernameField"), "")
        .with_element(jobpilot::Locator::css("#passwordField"), "")
        .with_element(jobpilot::Locator::css(".btn-primary.loginButton"), "Login")
        .redirect_after_click("https://www.naukri.com/mnjuser/homepage");

    let mut page = FakePage::new()
        .with_site(&config.login_url, login_page)
        .with_site("https://www.naukri.com/mnjuser/homepage", FakeSite::html("<html></html>"));
    let mut all_jobs = Vec::new();
    for i in 1..=2 {
        page = page.with_site(&url(i), applicable_site());
        all_jobs.push(job_at(&url(i), "Rust Dev"));
    }
    let page = Arc::new(page);
    let store = Arc::new(RecordingStore::new(all_jobs));
    let sessions = Arc::new(FakeSessionFactory::new(page.clone()));
    let login = LoginFlow::new(&config, Arc::new(NoManualStep)).with_poll_interval(Duration::ZERO);
    let (tx, _rx) = watch::channel(RunProgress::default());

    let summary = runner(store, sessions, dir.path())
        .with_login(login)
        .run(10, &CancellationToken::new(), &tx)
        .await;

    assert_eq!(summary.successful, 2);
    let visits = page.visits();
    assert_eq!(visits.iter().filter(|v| **v == config.login_url).count(), 1);
    assert_eq!(visits.first(), Some(&config.login_url));
}

// ========== 控制面 ==========

fn slow_handle(jobs: usize) -> (OrchestratorHandle, Arc<RecordingStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let mut page = FakePage::new().with_goto_delay(Duration::from_millis(50));
    let mut records = Vec::new();
    for i in 1..=jobs {
        page = page.with_site(&url(i), applicable_site());
        records.push(job_at(&url(i), "Rust Dev"));
    }
    let store = Arc::new(RecordingStore::new(records));
    let sessions = Arc::new(FakeSessionFactory::new(Arc::new(page)));
    let runner = runner(store.clone(), sessions, dir.path());
    (OrchestratorHandle::new(runner, Duration::from_secs(5)), store, dir)
}

#[tokio::test]
async fn test_second_start_is_rejected_while_running() {
    let (handle, _store, _dir) = slow_handle(5);

    assert_eq!(handle.start(10).await, StartOutcome::Started);
    let before = handle.status();
    assert!(before.running);

    assert_eq!(handle.start(10).await, StartOutcome::AlreadyRunning);
    assert!(handle.run_once(10).await.is_err());
    assert!(handle.status().progress.processed >= before.progress.processed);
    assert!(handle.status().running);

    assert_eq!(handle.stop().await, StopOutcome::Stopped);
}

#[tokio::test]
async fn test_stop_cancels_and_finishes() {
    let (handle, store, _dir) = slow_handle(5);

    assert_eq!(handle.stop().await, StopOutcome::NotRunning);
    assert_eq!(handle.start(10).await, StartOutcome::Started);
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_eq!(handle.stop().await, StopOutcome::Stopped);
    let status = handle.status();
    assert!(!status.running);
    assert_eq!(status.progress.status, RunStatus::Finished);
    assert!(status.progress.processed < 5);
    assert_eq!(store.inner.stop_signals(), 1);

    assert_eq!(handle.stop().await, StopOutcome::NotRunning);
}

fn pending_stop_handle() -> (OrchestratorHandle, Arc<RecordingStore>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let page = FakePage::new()
        .with_goto_delay(Duration::from_millis(300))
        .with_site(&url(1), applicable_site());
    let store = Arc::new(RecordingStore::new(vec![job_at(&url(1), "Rust Dev")]));
    let sessions = Arc::new(FakeSessionFactory::new(Arc::new(page)));
    let handle = OrchestratorHandle::new(
        runner(store.clone(), sessions, dir.path()),
        Duration::from_millis(20),
    );
    (handle, store, dir)
}

#[tokio::test]
async fn test_stop_reports_pending_when_job_outlasts_timeout() {
    let (handle, _store, _dir) = pending_stop_handle();

    handle.start(10).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.stop().await, StopOutcome::StopPending);

    // 后台任务最终会自己退出
    let mut rx = handle.subscribe();
    rx.wait_for(|p| !p.is_running()).await.unwrap();
    assert_eq!(handle.start(1).await, StartOutcome::Started);
    handle.stop().await;
}

#[tokio::test]
async fn test_wait_idle_after_pending_stop_sends_final_signal() {
    let (handle, store, _dir) = pending_stop_handle();

    handle.start(10).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.stop().await, StopOutcome::StopPending);
    assert_eq!(store.inner.stop_signals(), 0);

    let summary = handle.wait_idle().await;

    assert_eq!(summary, RunSummary { processed: 1, successful: 1 });
    assert_eq!(store.inner.stop_signals(), 1);
    assert_eq!(store.inner.progress_pushes().last().copied(), Some(summary));
    assert!(!handle.status().running);
}

#[tokio::test]
async fn test_abandon_reports_stop_without_waiting() {
    let (handle, store, _dir) = pending_stop_handle();

    handle.start(10).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(handle.stop().await, StopOutcome::StopPending);

    let summary = handle.abandon().await;

    // 当前职位还在导航中
    assert_eq!(summary, RunSummary::default());
    assert_eq!(store.inner.stop_signals(), 1);
    assert_eq!(store.inner.progress_pushes().last().copied(), Some(summary));
}

#[tokio::test]
async fn test_wait_idle_returns_immediately_when_idle() {
    let (handle, _store, _dir) = slow_handle(1);

    assert_eq!(handle.wait_idle().await, RunSummary::default());
    assert_eq!(handle.abandon().await, RunSummary::default());
}

#[tokio::test]
async fn test_run_once_returns_counts() {
    let (handle, store, _dir) = slow_handle(2);

    let summary = handle.run_once(10).await.unwrap();

    assert_eq!(summary, RunSummary { processed: 2, successful: 2 });
    assert_eq!(store.inner.stop_signals(), 1);
    assert!(!handle.status().running);
    assert_eq!(handle.start(1).await, StartOutcome::Started);
    handle.stop().await;
}
