//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：按配置组装会话管理、结构抽取、验证码处理
//! 2. **运行**：交给 `ExtractionController` 跑完整个状态机
//! 3. **输出**：无论运行以何种状态结束都写报告（列表页失败时报告为空）
//! 4. **全局统计**：汇总结果和会话重建次数

use std::sync::Arc;

use tracing::{info, warn};

use crate::browser::{BrowserSettings, ChromiumFactory, SessionManager};
use crate::challenge::{ChallengeResolver, HttpChallengeSolver};
use crate::config::Config;
use crate::error::AppResult;
use crate::extraction::StructuralExtractor;
use crate::orchestrator::controller::{ExtractionController, RunReport, RunStatus};
use crate::report::{ReportWriter, WriteOutcome};
use crate::utils::logging;

/// 应用主结构
pub struct App {
    config: Config,
    controller: ExtractionController,
    writer: ReportWriter,
}

/// 一次运行的最终结果
#[derive(Debug)]
pub struct AppOutcome {
    pub run: RunReport,
    pub write: WriteOutcome,
}

impl App {
    /// 初始化应用
    ///
    /// 浏览器此时还没有启动，第一次导航前才会创建会话。
    pub fn initialize(config: Config) -> AppResult<Self> {
        logging::log_startup(&config);

        let factory = ChromiumFactory::new(BrowserSettings::from_config(&config));
        let sessions = SessionManager::new(
            Box::new(factory),
            config.page_load_timeout(),
            config.settle_delay(),
        );

        let extractor = StructuralExtractor::case_studies(&config.resolved_origin()?)?;
        let solver = Arc::new(HttpChallengeSolver::new(&config));
        let resolver = ChallengeResolver::from_config(solver, &config)?;

        let controller = ExtractionController::new(
            sessions,
            extractor,
            resolver,
            config.listing_url.clone(),
            config.screenshot_path.clone(),
        );

        Ok(Self {
            config,
            controller,
            writer: ReportWriter::new(),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> AppOutcome {
        let run = self.controller.run().await;

        if run.status == RunStatus::AbortedAtListing {
            warn!("⚠️ 列表页不可用，将输出空报告");
        }

        info!("\n📝 正在生成报告...");
        let write = self.writer.write(&run.results, &self.config.output_path);

        let report_path = write.path().map(|p| p.display().to_string());
        logging::print_final_stats(
            run.results.extracted_count(),
            run.results.failed_count(),
            run.session_recreations,
            report_path.as_deref(),
            &self.config.log_file,
        );

        AppOutcome { run, write }
    }
}
