//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `auto_apply` - 一个批次
//! - 读取待投递职位
//! - 持有本批次唯一的会话（打开、登录、关闭）
//! - 逐个调用 `ApplyEngine`，回写状态、推送进度
//! - 在职位边界检查取消信号
//!
//! ### `handle` - 控制面
//! - start / stop / status / run_once
//! - 重入保护：同一时间只有一个批次
//!
//! ## 层次关系
//!
//! ```text
//! handle (控制面)
//!     ↓
//! auto_apply (处理 Vec<JobRecord>)
//!     ↓
//! workflow::ApplyEngine (处理单个 JobRecord)
//!     ↓
//! services (能力层：截图 / 投递日志)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod auto_apply;
pub mod handle;

pub use auto_apply::AutoApplyRunner;
pub use handle::{OrchestratorHandle, StartOutcome, StatusReport, StopOutcome};
