//! 会话管理
//!
//! 唯一持有渲染实例的地方。任何导航故障都会立刻销毁当前实例，
//! 之后只能通过 `recreate()` 得到新的实例，旧实例不会被复用。

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::browser::{PageRenderer, RendererFactory};
use crate::error::{LoadFault, RendererError};

/// 一个活着的渲染会话
struct Session {
    id: u64,
    renderer: Box<dyn PageRenderer>,
}

/// 会话管理器
pub struct SessionManager {
    factory: Box<dyn RendererFactory>,
    session: Option<Session>,
    page_load_timeout: Duration,
    settle_delay: Duration,
    created: u64,
    recreations: usize,
}

impl SessionManager {
    /// # 参数
    /// - `factory`: 渲染实例工厂
    /// - `page_load_timeout`: 单次导航超时
    /// - `settle_delay`: 导航后等待前端渲染完成的时间
    pub fn new(
        factory: Box<dyn RendererFactory>,
        page_load_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self {
            factory,
            session: None,
            page_load_timeout,
            settle_delay,
            created: 0,
            recreations: 0,
        }
    }

    /// 新建会话（已有会话会先被销毁）
    pub async fn create(&mut self) -> Result<(), RendererError> {
        self.dispose().await;

        let renderer = self.factory.create().await.map_err(|e| {
            error!("❌ 创建浏览器会话失败: {}", e);
            e
        })?;
        self.created += 1;
        debug!("浏览器会话 #{} 已创建", self.created);
        self.session = Some(Session {
            id: self.created,
            renderer,
        });
        Ok(())
    }

    /// 丢弃当前会话并新建一个
    pub async fn recreate(&mut self) -> Result<(), RendererError> {
        let old_id = self.session.as_ref().map(|s| s.id);
        self.create().await?;
        self.recreations += 1;
        info!(
            event = "session_recreated",
            previous = ?old_id,
            "🔄 浏览器会话已重建 (第 {} 次)",
            self.recreations
        );
        Ok(())
    }

    /// 导航到 URL，成功后等待固定的渲染时间
    ///
    /// 失败时当前会话立即失效。
    pub async fn load(&mut self, url: &str) -> Result<(), LoadFault> {
        let timeout = self.page_load_timeout;
        let Some(session) = self.session.as_mut() else {
            return Err(LoadFault::DriverFault {
                url: url.to_string(),
                reason: "no active browser session".to_string(),
            });
        };

        match session.renderer.load(url, timeout).await {
            Ok(()) => {
                sleep(self.settle_delay).await;
                Ok(())
            }
            Err(fault) => {
                warn!(kind = fault.kind(), "⚠️ 会话 #{} 导航失败: {}", session.id, fault);
                self.dispose().await;
                Err(fault)
            }
        }
    }

    /// 当前页面的 HTML
    pub async fn current_markup(&mut self) -> Result<String, RendererError> {
        match self.session.as_mut() {
            Some(session) => session.renderer.current_markup().await,
            None => Err(RendererError::MarkupUnavailable {
                reason: "no active browser session".to_string(),
            }),
        }
    }

    /// 当前会话的渲染实例
    pub fn renderer(&mut self) -> Option<&mut dyn PageRenderer> {
        match self.session.as_mut() {
            Some(session) => Some(session.renderer.as_mut()),
            None => None,
        }
    }

    /// 销毁当前会话（没有会话时什么都不做）
    pub async fn dispose(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.renderer.dispose().await;
            debug!("浏览器会话 #{} 已销毁", session.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// 重建次数
    pub fn recreations(&self) -> usize {
        self.recreations
    }
}
