//! 验证码处理流程
//!
//! 无状态：每次调用只看当前页面。没有验证码时直接返回，不会访问识别服务。

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::browser::PageRenderer;
use crate::challenge::solver::ChallengeSolver;
use crate::config::Config;
use crate::error::{ExtractionError, SolverError};

/// 验证码处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// 已识别并提交
    Resolved,
    /// 页面上没有验证码
    NotPresent,
    /// 没能得到或提交识别结果
    Unsolved(String),
    /// 识别服务拒绝（鉴权 / 余额）
    VendorDenied(String),
}

/// 验证码相关元素的定位方式
#[derive(Debug, Clone)]
pub struct ChallengeMarkers {
    /// 验证码图片
    pub image: String,
    /// 输入框
    pub input: String,
    /// 可能的提交控件
    pub submit: String,
    /// 提交控件上的文字
    pub submit_text: String,
}

impl Default for ChallengeMarkers {
    fn default() -> Self {
        Self {
            image: r#"img[src*="captcha"]"#.to_string(),
            input: r#"input[name*="captcha"], input[id*="captcha"]"#.to_string(),
            submit: r#"button, input[type="submit"]"#.to_string(),
            submit_text: "Submit".to_string(),
        }
    }
}

/// 验证码处理器
pub struct ChallengeResolver {
    solver: Arc<dyn ChallengeSolver>,
    markers: ChallengeMarkers,
    image_selector: Selector,
    input_selector: Selector,
    submit_selector: Selector,
    solve_timeout: Duration,
    settle_delay: Duration,
}

impl ChallengeResolver {
    pub fn new(
        solver: Arc<dyn ChallengeSolver>,
        markers: ChallengeMarkers,
        solve_timeout: Duration,
        settle_delay: Duration,
    ) -> Result<Self, ExtractionError> {
        Ok(Self {
            image_selector: parse_selector(&markers.image)?,
            input_selector: parse_selector(&markers.input)?,
            submit_selector: parse_selector(&markers.submit)?,
            solver,
            markers,
            solve_timeout,
            settle_delay,
        })
    }

    /// 使用配置中的超时和等待时间
    pub fn from_config(
        solver: Arc<dyn ChallengeSolver>,
        config: &Config,
    ) -> Result<Self, ExtractionError> {
        Self::new(
            solver,
            ChallengeMarkers::default(),
            config.solver_timeout(),
            config.challenge_settle_delay(),
        )
    }

    /// 检测并处理当前页面上的验证码
    ///
    /// # 参数
    /// - `renderer`: 当前会话的渲染实例
    /// - `screenshot_path`: 验证码截图保存位置
    pub async fn resolve_if_present(
        &self,
        renderer: &mut dyn PageRenderer,
        screenshot_path: &Path,
    ) -> ChallengeOutcome {
        let markup = match renderer.current_markup().await {
            Ok(markup) => markup,
            Err(e) => return ChallengeOutcome::Unsolved(format!("page markup unavailable: {}", e)),
        };

        let input_css = {
            let document = Html::parse_document(&markup);
            if document.select(&self.image_selector).next().is_none() {
                return ChallengeOutcome::NotPresent;
            }
            info!("🧩 检测到验证码");

            // 找不到输入框 / 提交按钮时即使识别成功也无法提交
            let Some(input_css) = self.locate_input(&document) else {
                warn!("⚠️ 找不到验证码输入框");
                return ChallengeOutcome::Unsolved("challenge input not found".to_string());
            };
            if !self.has_submit_control(&document) {
                warn!("⚠️ 找不到验证码提交按钮");
                return ChallengeOutcome::Unsolved("challenge submit control not found".to_string());
            }
            input_css
        };

        let image = match renderer.screenshot(&self.markers.image).await {
            Ok(image) => image,
            Err(e) => {
                warn!("⚠️ 验证码截图失败: {}", e);
                return ChallengeOutcome::Unsolved(format!("challenge screenshot failed: {}", e));
            }
        };
        if let Err(e) = tokio::fs::write(screenshot_path, &image).await {
            warn!("保存验证码截图失败 ({}): {}", screenshot_path.display(), e);
        }

        let text = match self.solver.solve(&image, self.solve_timeout).await {
            Ok(text) => text,
            Err(SolverError::VendorDenied(reason)) => {
                error!("❌ 验证码服务拒绝请求: {}", reason);
                return ChallengeOutcome::VendorDenied(reason);
            }
            Err(SolverError::Unsolved(reason)) => {
                warn!("⚠️ 验证码未识别: {}", reason);
                return ChallengeOutcome::Unsolved(reason);
            }
        };
        info!("✓ 验证码识别完成");

        if let Err(e) = renderer.fill(&input_css, &text).await {
            warn!("⚠️ 填写验证码失败: {}", e);
            return ChallengeOutcome::Unsolved(format!("could not fill challenge input: {}", e));
        }

        match renderer
            .click_text(&self.markers.submit, &self.markers.submit_text)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!("⚠️ 验证码已识别但未能提交");
                return ChallengeOutcome::Unsolved("solved but not submitted".to_string());
            }
            Err(e) => {
                warn!("⚠️ 提交验证码失败: {}", e);
                return ChallengeOutcome::Unsolved(format!("could not submit challenge: {}", e));
            }
        }

        sleep(self.settle_delay).await;
        info!("✓ 验证码已提交");
        ChallengeOutcome::Resolved
    }

    /// 输入框的精确选择器（优先 id，其次 name）
    fn locate_input(&self, document: &Html) -> Option<String> {
        let input = document.select(&self.input_selector).next()?;
        let element = input.value();
        if let Some(id) = element.attr("id").filter(|v| !v.is_empty()) {
            return Some(format!("input[id=\"{}\"]", escape_attr(id)));
        }
        element
            .attr("name")
            .filter(|v| !v.is_empty())
            .map(|name| format!("input[name=\"{}\"]", escape_attr(name)))
    }

    fn has_submit_control(&self, document: &Html) -> bool {
        let wanted = &self.markers.submit_text;
        document.select(&self.submit_selector).any(|el| {
            el.text().collect::<String>().contains(wanted.as_str())
                || el.value().attr("value").is_some_and(|v| v.contains(wanted.as_str()))
        })
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn parse_selector(css: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(css).map_err(|e| ExtractionError::InvalidSelector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })
}
