//! 抽取控制器 - 编排层
//!
//! ## 状态
//!
//! ```text
//! Init → ListingLoad → LinkDiscovery → [TargetLoad → ChallengeCheck → RecordExtraction]* → Done
//!              └──────→ AbortedAtListing
//! ```
//!
//! ## 约定
//!
//! 1. **顺序处理**：一个会话同一时间只服务一次导航
//! 2. **只重试一次**：导航失败时重建会话并重试同一个 URL 一次
//! 3. **不回滚**：结果集只追加，单个目标失败只会变成占位记录
//! 4. **下标对齐**：结果集第 i 项对应第 i 个发现的链接

use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use crate::browser::SessionManager;
use crate::challenge::{ChallengeOutcome, ChallengeResolver};
use crate::error::{AppError, LoadFault};
use crate::extraction::StructuralExtractor;
use crate::models::{CaseEntry, ErrorPlaceholder, ResultSet, TargetLink};
use crate::utils::logging;

/// 控制器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Init,
    ListingLoad,
    LinkDiscovery,
    TargetLoad { ordinal: usize },
    ChallengeCheck { ordinal: usize },
    RecordExtraction { ordinal: usize },
    Done,
    AbortedAtListing,
}

/// 运行结束时的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    AbortedAtListing,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub status: RunStatus,
    pub targets: Vec<TargetLink>,
    pub results: ResultSet,
    pub session_recreations: usize,
}

/// 抽取控制器
///
/// 唯一持有 `SessionManager` 的地方，其它组件只在调用期间借用渲染实例。
pub struct ExtractionController {
    sessions: SessionManager,
    extractor: StructuralExtractor,
    resolver: ChallengeResolver,
    listing_url: String,
    screenshot_path: PathBuf,
    state: ControllerState,
}

impl ExtractionController {
    pub fn new(
        sessions: SessionManager,
        extractor: StructuralExtractor,
        resolver: ChallengeResolver,
        listing_url: impl Into<String>,
        screenshot_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            sessions,
            extractor,
            resolver,
            listing_url: listing_url.into(),
            screenshot_path: screenshot_path.into(),
            state: ControllerState::Init,
        }
    }

    /// 当前状态
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// 执行一次完整的抽取
    ///
    /// 不会返回错误：列表页不可用时以 `AbortedAtListing` 结束，
    /// 单个目标的失败会变成占位记录。无论如何结束，会话都会被释放。
    pub async fn run(&mut self) -> RunReport {
        let (status, targets, results) = self.run_states().await;
        self.sessions.dispose().await;

        RunReport {
            status,
            targets,
            results,
            session_recreations: self.sessions.recreations(),
        }
    }

    async fn run_states(&mut self) -> (RunStatus, Vec<TargetLink>, ResultSet) {
        self.enter(ControllerState::Init);
        if let Err(e) = self.sessions.create().await {
            // 首次导航前会再尝试一次
            warn!("⚠️ 初始浏览器会话创建失败: {}", e);
        }

        self.enter(ControllerState::ListingLoad);
        let listing_url = self.listing_url.clone();
        let markup = match self.navigate(&listing_url).await {
            Ok(()) => self.sessions.current_markup().await.map_err(|e| e.to_string()),
            Err(fault) => Err(fault.to_string()),
        };
        let markup = match markup {
            Ok(markup) => markup,
            Err(reason) => {
                let err = AppError::ListingUnavailable {
                    url: listing_url,
                    reason,
                };
                error!(severity = "critical", "❌ 终止运行: {}", err);
                self.enter(ControllerState::AbortedAtListing);
                return (RunStatus::AbortedAtListing, Vec::new(), ResultSet::new());
            }
        };

        self.enter(ControllerState::LinkDiscovery);
        let targets = self.extractor.extract_listing(&markup);
        if targets.is_empty() {
            warn!("⚠️ 列表页上没有找到任何案例链接: {}", listing_url);
        }
        logging::log_targets_found(targets.len());

        let mut results = ResultSet::with_capacity(targets.len());
        for (index, target) in targets.iter().enumerate() {
            let ordinal = index + 1;
            logging::log_target_start(ordinal, targets.len(), &target.url);

            match self.process_target(ordinal, target).await {
                CaseEntry::Extracted(record) => results.push_record(record),
                CaseEntry::Failed(placeholder) => results.push_placeholder(placeholder),
            }
        }

        self.enter(ControllerState::Done);
        (RunStatus::Completed, targets, results)
    }

    /// 处理单个目标，所有失败都在这里变成占位记录
    async fn process_target(&mut self, ordinal: usize, target: &TargetLink) -> CaseEntry {
        self.enter(ControllerState::TargetLoad { ordinal });
        if let Err(fault) = self.navigate(&target.url).await {
            error!(
                ordinal,
                url = %target.url,
                kind = fault.kind(),
                "[案例 {}] ❌ 重试后仍无法加载: {}",
                ordinal,
                fault
            );
            return placeholder(ordinal, describe_load_fault(&fault));
        }

        self.enter(ControllerState::ChallengeCheck { ordinal });
        let outcome = match self.sessions.renderer() {
            Some(renderer) => {
                self.resolver
                    .resolve_if_present(renderer, &self.screenshot_path)
                    .await
            }
            None => ChallengeOutcome::Unsolved("no active browser session".to_string()),
        };
        match outcome {
            ChallengeOutcome::NotPresent => {}
            ChallengeOutcome::Resolved => info!("[案例 {}] ✓ 验证码已处理", ordinal),
            ChallengeOutcome::Unsolved(reason) => {
                warn!(ordinal, url = %target.url, "[案例 {}] ⚠️ 验证码未解决: {}", ordinal, reason);
                return placeholder(ordinal, format!("Challenge unsolved: {}", reason));
            }
            ChallengeOutcome::VendorDenied(reason) => {
                error!(ordinal, url = %target.url, "[案例 {}] ❌ 验证码服务拒绝: {}", ordinal, reason);
                return placeholder(ordinal, format!("Challenge solver denied: {}", reason));
            }
        }

        self.enter(ControllerState::RecordExtraction { ordinal });
        let markup = match self.sessions.current_markup().await {
            Ok(markup) => markup,
            Err(e) => {
                error!(ordinal, url = %target.url, "[案例 {}] ❌ 读取页面失败: {}", ordinal, e);
                return placeholder(ordinal, format!("Page markup unavailable: {}", e));
            }
        };

        let record = self.extractor.extract_record(&markup, ordinal);
        info!(
            "[案例 {}] ✓ 抽取完成: {} ({} 个小标题, {} 段正文)",
            ordinal,
            logging::truncate_text(&record.primary_title, 60),
            record.section_headings.len(),
            record.section_paragraphs.len()
        );
        if let Ok(json) = serde_json::to_string(&record) {
            debug!("[案例 {}] {}", ordinal, json);
        }
        CaseEntry::Extracted(record)
    }

    /// 导航；失败时重建会话并重试一次
    ///
    /// 上一个目标两次失败后会话已被销毁，这里先补上新会话，不占用本目标的重试机会。
    async fn navigate(&mut self, url: &str) -> Result<(), LoadFault> {
        if !self.sessions.is_active() {
            if let Err(e) = self.sessions.recreate().await {
                warn!("⚠️ 浏览器会话不可用且重建失败: {}", e);
            }
        }

        let first = match self.sessions.load(url).await {
            Ok(()) => return Ok(()),
            Err(fault) => fault,
        };
        warn!(url, kind = first.kind(), "⚠️ 导航失败，重建会话后重试: {}", first);

        if let Err(e) = self.sessions.recreate().await {
            // 没有会话时下面的重试会直接失败
            error!("❌ 重建浏览器会话失败: {}", e);
        }
        self.sessions.load(url).await
    }

    fn enter(&mut self, state: ControllerState) {
        debug!(?state, "controller_state");
        self.state = state;
    }
}

fn placeholder(ordinal: usize, description: String) -> CaseEntry {
    CaseEntry::Failed(ErrorPlaceholder::new(ordinal, description))
}

/// 写进报告的故障描述
fn describe_load_fault(fault: &LoadFault) -> String {
    match fault {
        LoadFault::Timeout { url, seconds } => {
            format!("Target unavailable: page load timed out after {}s ({})", seconds, url)
        }
        LoadFault::DriverFault { url, reason } => {
            format!("Target unavailable: browser session fault ({}): {}", url, reason)
        }
    }
}
