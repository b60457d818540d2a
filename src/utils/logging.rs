//! 日志工具模块
//!
//! 控制台和日志文件各一个 fmt 层；另外提供运行过程中的横幅输出。

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

/// 初始化日志系统
///
/// `RUST_LOG` 优先；没有设置时按 `verbose_logging` 选择 debug 或 info。
/// 日志文件会先被写入一个带时间的标题，之后以追加方式写入。
pub fn init(config: &Config) -> Result<()> {
    init_log_file(&config.log_file)?;

    let default_level = if config.verbose_logging {
        "debug,chromiumoxide=warn"
    } else {
        "info,chromiumoxide=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

    let file = OpenOptions::new()
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("无法打开日志文件: {}", config.log_file))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("日志系统已经初始化过")?;
    Ok(())
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n案例抓取日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 案例抓取");
    info!("🔗 列表页: {}", config.listing_url);
    info!("📄 输出文件: {}", config.output_path.display());
    info!(
        "🌐 浏览器模式: {}",
        if config.headless { "无头" } else { "有界面" }
    );
    if config.solver_api_key.trim().is_empty() {
        info!("🧩 未配置验证码服务，遇到验证码的页面将记为失败");
    }
    info!("{}", "=".repeat(60));
}

/// 记录链接发现结果
pub fn log_targets_found(total: usize) {
    info!("✓ 找到 {} 个待处理的案例", total);
}

/// 记录单个案例开始处理
///
/// # 参数
/// - `ordinal`: 案例编号（从 1 开始）
/// - `total`: 案例总数
/// - `url`: 案例地址
pub fn log_target_start(ordinal: usize, total: usize, url: &str) {
    info!("\n{}", "─".repeat(60));
    info!("[案例 {}] 📄 {}/{}: {}", ordinal, ordinal, total, url);
}

/// 打印最终统计信息
///
/// # 参数
/// - `extracted`: 成功抽取数量
/// - `failed`: 占位记录数量
/// - `recreations`: 会话重建次数
/// - `report`: 报告路径（全部输出方式失败时为 `None`）
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    extracted: usize,
    failed: usize,
    recreations: usize,
    report: Option<&str>,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", extracted, extracted + failed);
    info!("❌ 失败: {}", failed);
    info!("🔄 会话重建: {} 次", recreations);
    match report {
        Some(path) => info!("📄 报告: {}", path),
        None => info!("📄 报告: 未生成"),
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
