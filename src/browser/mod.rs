//! 渲染会话
//!
//! 控制器只依赖 `PageRenderer` / `RendererFactory` 这两个能力接口，
//! chromiumoxide 只是其中一种实现。

pub mod headless;
pub mod session;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LoadFault, RendererError};

pub use headless::{BrowserSettings, ChromiumFactory, ChromiumRenderer};
pub use session::SessionManager;

/// 一个活着的渲染实例
///
/// 一旦 `load` 返回 `LoadFault`，该实例就不能再用，必须 `dispose` 后新建。
#[async_trait]
pub trait PageRenderer: Send {
    /// 导航到 URL，超过 `timeout` 视为超时
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<(), LoadFault>;

    /// 当前页面的 HTML
    async fn current_markup(&mut self) -> Result<String, RendererError>;

    /// 对匹配 `selector` 的第一个元素截图（PNG）
    async fn screenshot(&mut self, selector: &str) -> Result<Vec<u8>, RendererError>;

    /// 向匹配 `selector` 的输入框填入文本
    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), RendererError>;

    /// 点击匹配 `selector` 且文本包含 `text` 的元素，返回是否找到
    async fn click_text(&mut self, selector: &str, text: &str) -> Result<bool, RendererError>;

    /// 释放浏览器资源
    async fn dispose(&mut self);
}

/// 新建渲染实例
#[async_trait]
pub trait RendererFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RendererError>;
}
