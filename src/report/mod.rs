//! 报告输出
//!
//! 按顺序尝试多级输出方式，第一个成功的生效：
//! 完整 PDF → 简化 PDF → 纯文本。三级都失败才算失败。

pub mod layout;
pub mod pdf;
pub mod text;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::error::RenderFault;
use crate::models::ResultSet;

pub use pdf::{PdfReportRenderer, SimplePdfReportRenderer};
pub use text::PlainTextReportRenderer;

/// 一种输出方式
pub trait ReportRenderer: Send + Sync {
    /// 日志里显示的名字
    fn name(&self) -> &'static str;

    /// 由用户给定的输出路径推出本级的实际文件名
    fn destination(&self, base: &Path) -> PathBuf;

    fn render(&self, results: &ResultSet, destination: &Path) -> Result<(), RenderFault>;
}

/// 报告输出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// 第一级成功
    Written(PathBuf),
    /// 降级后成功
    Degraded { path: PathBuf, tier: &'static str },
    /// 所有方式都失败
    Failed,
}

impl WriteOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            WriteOutcome::Written(path) | WriteOutcome::Degraded { path, .. } => Some(path),
            WriteOutcome::Failed => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, WriteOutcome::Failed)
    }
}

/// 报告输出器
pub struct ReportWriter {
    tiers: Vec<Box<dyn ReportRenderer>>,
}

impl ReportWriter {
    /// 默认三级输出
    pub fn new() -> Self {
        Self::with_tiers(vec![
            Box::new(PdfReportRenderer),
            Box::new(SimplePdfReportRenderer),
            Box::new(PlainTextReportRenderer),
        ])
    }

    pub fn with_tiers(tiers: Vec<Box<dyn ReportRenderer>>) -> Self {
        Self { tiers }
    }

    /// 写出报告
    ///
    /// # 参数
    /// - `results`: 结果集
    /// - `destination`: 用户指定的输出路径，降级时只替换文件名
    pub fn write(&self, results: &ResultSet, destination: &Path) -> WriteOutcome {
        for (index, tier) in self.tiers.iter().enumerate() {
            let path = tier.destination(destination);
            match tier.render(results, &path) {
                Ok(()) if index == 0 => {
                    info!("📄 报告已保存至: {}", path.display());
                    return WriteOutcome::Written(path);
                }
                Ok(()) => {
                    warn!(tier = tier.name(), "📄 报告已降级保存至: {}", path.display());
                    return WriteOutcome::Degraded {
                        path,
                        tier: tier.name(),
                    };
                }
                Err(e) => {
                    error!(tier = tier.name(), "❌ 报告输出失败: {}", e);
                    // 失败时可能留下写了一半的文件
                    let _ = std::fs::remove_file(&path);
                }
            }
        }

        error!(
            severity = "critical",
            "❌ 所有报告输出方式都失败，目标: {}",
            destination.display()
        );
        WriteOutcome::Failed
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// 与 `base` 同目录、文件名为 `{stem}{suffix}.{ext}` 的路径
pub(crate) fn sibling_path(base: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "report".to_string());
    let name = sanitize_file_name(&format!("{}{}.{}", stem, suffix, ext));
    match base.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// 把文件名中的非法字符替换为下划线
pub fn sanitize_file_name(name: &str) -> String {
    static INVALID: OnceLock<Regex> = OnceLock::new();
    let invalid = INVALID.get_or_init(|| Regex::new(r#"[\\/:*?"<>|]"#).expect("valid pattern"));
    invalid.replace_all(name, "_").into_owned()
}
