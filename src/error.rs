//! 错误类型
//!
//! 按"在哪一层出错"划分：渲染会话、验证码、结构抽取、报告输出、配置。
//! 控制器只根据这些类型做分支（重建会话 / 占位记录 / 降级输出），
//! 不解析错误字符串。

use thiserror::Error;

/// 应用程序错误类型
///
/// 只覆盖会让运行无法开始或无法继续的情况；单个案例的失败在控制器里变成占位记录。
#[derive(Debug, Error)]
pub enum AppError {
    /// 抽取规则错误
    #[error("抽取规则错误: {0}")]
    Extraction(#[from] ExtractionError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 列表页重试后仍无法加载
    #[error("列表页不可用 ({url}): {reason}")]
    ListingUnavailable { url: String, reason: String },
}

/// 导航失败的分类
///
/// 两种都可以通过"丢弃会话并新建"来恢复，区别只在日志里。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadFault {
    /// 页面加载超时
    #[error("加载 {url} 超时 ({seconds}s)")]
    Timeout { url: String, seconds: u64 },
    /// 浏览器进程 / 会话已不可用
    #[error("加载 {url} 时浏览器会话失效: {reason}")]
    DriverFault { url: String, reason: String },
}

impl LoadFault {
    /// 简短的故障类型名，用于日志字段
    pub fn kind(&self) -> &'static str {
        match self {
            LoadFault::Timeout { .. } => "timeout",
            LoadFault::DriverFault { .. } => "driver_fault",
        }
    }
}

/// 页面操作错误
#[derive(Debug, Error)]
pub enum RendererError {
    /// 找不到元素
    #[error("未找到元素: {selector}")]
    ElementNotFound { selector: String },
    /// 截图失败
    #[error("截图失败 ({selector}): {reason}")]
    ScreenshotFailed { selector: String, reason: String },
    /// 执行脚本失败
    #[error("执行脚本失败: {reason}")]
    ScriptFailed { reason: String },
    /// 读取页面内容失败
    #[error("读取页面内容失败: {reason}")]
    MarkupUnavailable { reason: String },
    /// 浏览器启动 / 配置失败
    #[error("浏览器启动失败: {reason}")]
    LaunchFailed { reason: String },
}

/// 验证码服务错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SolverError {
    /// 服务没有给出可用的文本
    #[error("验证码未识别: {0}")]
    Unsolved(String),
    /// 鉴权失败 / 余额不足
    #[error("验证码服务拒绝请求: {0}")]
    VendorDenied(String),
}

/// 抽取规则错误（只会在构建规则时出现）
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// 选择器无法解析
    #[error("无效的选择器 '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    /// 缺少必需的字段规则
    #[error("抽取规则缺少字段: {field}")]
    MissingRule { field: String },
    /// 基础地址无效
    #[error("无效的基础地址 '{origin}': {source}")]
    InvalidOrigin {
        origin: String,
        #[source]
        source: url::ParseError,
    },
}

/// 报告某一级输出失败
#[derive(Debug, Error)]
pub enum RenderFault {
    /// 写文件失败
    #[error("写入文件失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// PDF 生成失败
    #[error("PDF 生成失败: {0}")]
    Pdf(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    Invalid { field: String, reason: String },
}

impl From<chromiumoxide::error::CdpError> for RendererError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        RendererError::ScriptFailed {
            reason: err.to_string(),
        }
    }
}

// ========== 便捷构造函数 ==========

impl ConfigError {
    /// 创建配置值不合法错误
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl RenderFault {
    /// 创建文件写入错误
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        RenderFault::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
