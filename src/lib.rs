//! # Case Study Scraper
//!
//! 抓取案例列表页上的所有案例，抽取标题 / 小标题 / 正文，输出为一份报告。
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - `JsExecutor`，在页面里执行 JS（填写、点击、读 HTML）
//! - `browser/` - `PageRenderer` / `RendererFactory` 能力接口，chromiumoxide 实现，
//!   `SessionManager` 负责会话的创建、销毁与重建
//!
//! ### ② 能力层（Capabilities）
//! - `extraction/` - 基于 CSS 选择器的结构抽取（列表页链接、案例内容）
//! - `challenge/` - 验证码检测、识别服务调用、提交
//! - `report/` - 三级输出：完整 PDF → 简化 PDF → 纯文本
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/controller` - 抽取状态机，负责重试和占位记录
//! - `orchestrator/app` - 组装组件、运行、输出报告和统计
//!
//! ## 模块结构

pub mod browser;
pub mod challenge;
pub mod config;
pub mod error;
pub mod extraction;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod report;
pub mod utils;

#[cfg(test)]
mod test_support;

// 重新导出常用类型
pub use browser::{PageRenderer, RendererFactory, SessionManager};
pub use challenge::{ChallengeOutcome, ChallengeResolver, ChallengeSolver};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use extraction::StructuralExtractor;
pub use infrastructure::JsExecutor;
pub use models::{CaseEntry, ExtractionRecord, ResultSet, TargetLink};
pub use orchestrator::{App, AppOutcome, ExtractionController, RunReport, RunStatus};
pub use report::{ReportWriter, WriteOutcome};
