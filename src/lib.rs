//! # JobPilot
//!
//! 职位采集与自动投递流水线
//!
//! ## 架构设计
//!
//! 本系统沿用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 页面能力抽象
//! - `PageDriver` - 一次运行唯一的逻辑页面（导航、查询、点击、截图）
//! - `JsExecutor` - chromiumoxide Page 的唯一持有者，提供 eval() 能力
//! - `browser/` - 连接 / 启动 Chrome、登录流程
//!
//! ### ② 业务能力层（Services / Normalizer / Store）
//! - `normalizer/` - 把聊天消息和职位卡片规范化为 `JobRecord`
//! - `store/` - 外部职位存储接口（HTTP / 内存）
//! - `services/` - 投递截图、投递日志
//!
//! ### ③ 流程层（Workflow / Collector）
//! - `workflow/` - "一个职位"的投递状态机（`ApplyEngine`）
//! - `collector/` - 分页采集 + 经验筛选
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/auto_apply` - 一个批次：会话、逐个投递、回写进度
//! - `orchestrator/handle` - start / stop / status / run_once 控制面
//!
//! ## 模块结构

pub mod browser;
pub mod collector;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod normalizer;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{ChromeSessionFactory, LoginFlow, StdinManualStep};
pub use collector::{Collector, CollectorPolicy, ListingSite};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{JsExecutor, Locator, PageDriver, SessionFactory};
pub use models::{ApplyOutcome, JobRecord, JobSource, JobStatus, RunProgress, RunStatus, RunSummary};
pub use orchestrator::{AutoApplyRunner, OrchestratorHandle, StartOutcome, StopOutcome};
pub use store::{HttpJobStore, JobStore, MemoryJobStore};
pub use workflow::{ApplyCtx, ApplyEngine, ApplyPolicy};
