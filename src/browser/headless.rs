use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::browser::{PageRenderer, RendererFactory};
use crate::config::Config;
use crate::error::{LoadFault, RendererError};
use crate::infrastructure::JsExecutor;

/// 浏览器启动参数
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    pub user_agent: String,
    pub chrome_executable: Option<PathBuf>,
    pub request_timeout: Duration,
}

impl BrowserSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            chrome_executable: config.chrome_executable.clone(),
            request_timeout: config.page_load_timeout(),
        }
    }
}

/// 每次调用都启动一个新的 Chromium 进程
pub struct ChromiumFactory {
    settings: BrowserSettings,
}

impl ChromiumFactory {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl RendererFactory for ChromiumFactory {
    async fn create(&self) -> Result<Box<dyn PageRenderer>, RendererError> {
        let renderer = ChromiumRenderer::launch(&self.settings).await?;
        Ok(Box::new(renderer))
    }
}

/// chromiumoxide 实现的渲染实例
pub struct ChromiumRenderer {
    browser: Browser,
    executor: JsExecutor,
    handler: JoinHandle<()>,
}

impl ChromiumRenderer {
    /// 启动浏览器并打开空白页
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, RendererError> {
        info!("🚀 启动浏览器 (headless: {})...", settings.headless);

        // 受限环境下（容器 / CI）必须关闭沙盒和共享内存
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(settings.request_timeout)
            .args(vec![
                "--disable-gpu".to_string(),
                "--disable-dev-shm-usage".to_string(),
                format!("--user-agent={}", settings.user_agent),
            ]);
        builder = if settings.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(|e| {
            error!("配置浏览器失败: {}", e);
            RendererError::LaunchFailed { reason: e }
        })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            RendererError::LaunchFailed {
                reason: e.to_string(),
            }
        })?;
        debug!("浏览器启动成功");

        // 在后台处理浏览器事件
        let handler = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            RendererError::LaunchFailed {
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            browser,
            executor: JsExecutor::new(page),
            handler,
        })
    }
}

#[async_trait]
impl PageRenderer for ChromiumRenderer {
    async fn load(&mut self, url: &str, timeout: Duration) -> Result<(), LoadFault> {
        debug!("导航到: {}", url);
        match tokio::time::timeout(timeout, self.executor.page().goto(url)).await {
            Err(_) => Err(LoadFault::Timeout {
                url: url.to_string(),
                seconds: timeout.as_secs(),
            }),
            Ok(Err(e)) => Err(classify(url, timeout, e)),
            Ok(Ok(_)) => Ok(()),
        }
    }

    async fn current_markup(&mut self) -> Result<String, RendererError> {
        self.executor
            .page()
            .content()
            .await
            .map_err(|e| RendererError::MarkupUnavailable {
                reason: e.to_string(),
            })
    }

    async fn screenshot(&mut self, selector: &str) -> Result<Vec<u8>, RendererError> {
        let element = self
            .executor
            .page()
            .find_element(selector)
            .await
            .map_err(|_| RendererError::ElementNotFound {
                selector: selector.to_string(),
            })?;
        element
            .screenshot(CaptureScreenshotFormat::Png)
            .await
            .map_err(|e| RendererError::ScreenshotFailed {
                selector: selector.to_string(),
                reason: e.to_string(),
            })
    }

    async fn fill(&mut self, selector: &str, text: &str) -> Result<(), RendererError> {
        if self.executor.fill_input(selector, text).await? {
            Ok(())
        } else {
            Err(RendererError::ElementNotFound {
                selector: selector.to_string(),
            })
        }
    }

    async fn click_text(&mut self, selector: &str, text: &str) -> Result<bool, RendererError> {
        self.executor.click_by_text(selector, text).await
    }

    async fn dispose(&mut self) {
        shutdown(&mut self.browser, SHUTDOWN_GRACE).await;
        self.handler.abort();
        debug!("浏览器已关闭");
    }
}

/// 正常关闭后等待进程退出的最长时间
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// 浏览器进程的关闭能力
#[async_trait]
trait BrowserProcess: Send {
    /// 通过 CDP 请求浏览器关闭
    async fn close(&mut self) -> Result<(), String>;
    /// 等待进程退出
    async fn wait(&mut self) -> Result<(), String>;
    /// 直接结束进程
    async fn kill(&mut self) -> Result<(), String>;
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), String> {
        Browser::close(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait(&mut self) -> Result<(), String> {
        Browser::wait(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) -> Result<(), String> {
        match Browser::kill(self).await {
            Some(Err(e)) => Err(e.to_string()),
            _ => Ok(()),
        }
    }
}

/// 关闭浏览器进程，任何一步都不会无限等待
///
/// CDP 通道已断开时 `close` 会失败而进程仍在运行，此时直接结束进程；
/// `close` 成功但进程在 `grace` 内没有退出，同样结束进程。
async fn shutdown(process: &mut dyn BrowserProcess, grace: Duration) {
    if let Err(e) = process.close().await {
        warn!("关闭浏览器失败，直接结束进程: {}", e);
        if let Err(e) = process.kill().await {
            warn!("结束浏览器进程失败: {}", e);
        }
        return;
    }

    match tokio::time::timeout(grace, process.wait()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("等待浏览器进程退出失败: {}", e),
        Err(_) => {
            warn!("浏览器进程 {}s 内未退出，直接结束进程", grace.as_secs());
            if let Err(e) = process.kill().await {
                warn!("结束浏览器进程失败: {}", e);
            }
        }
    }
}

/// 导航错误分类：CDP 超时算超时，其余都视为会话失效
fn classify(url: &str, timeout: Duration, err: CdpError) -> LoadFault {
    match err {
        CdpError::Timeout => LoadFault::Timeout {
            url: url.to_string(),
            seconds: timeout.as_secs(),
        },
        other => LoadFault::DriverFault {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}
