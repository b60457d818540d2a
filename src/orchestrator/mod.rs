//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 按配置组装各组件
//! - 运行结束后写报告、输出统计
//!
//! ### `controller` - 抽取控制器
//! - 列表页 → 链接发现 → 逐个案例处理
//! - 导航失败时重建会话并重试一次
//! - 失败的案例用占位记录保住位置
//!
//! ## 层次关系
//!
//! ```text
//! app
//!     ↓
//! controller (状态机)
//!     ↓
//! browser::SessionManager / challenge::ChallengeResolver / extraction::StructuralExtractor
//!     ↓
//! infrastructure (JsExecutor)
//! ```

pub mod app;
pub mod controller;

pub use app::{App, AppOutcome};
pub use controller::{ControllerState, ExtractionController, RunReport, RunStatus};
