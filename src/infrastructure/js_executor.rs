//! JS 执行器 - 基础设施层
//!
//! 持有唯一的 page 资源，只暴露"执行 JS"的能力

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use crate::error::RendererError;

/// JS 执行器
///
/// 职责：
/// - 持有唯一的 Page 资源
/// - 暴露 eval() 能力
/// - 不认识案例 / 验证码
pub struct JsExecutor {
    page: Page,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// 获取 page 的引用（用于导航、截图等操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, RendererError> {
        let result = self.page.evaluate(js_code.into()).await?;
        result
            .into_value()
            .map_err(|e| RendererError::ScriptFailed {
                reason: e.to_string(),
            })
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, RendererError> {
        let json_value = self.eval(js_code).await?;
        serde_json::from_value(json_value).map_err(|e| RendererError::ScriptFailed {
            reason: e.to_string(),
        })
    }

    /// 向输入框填值并触发 input / change 事件
    ///
    /// # 返回
    /// 是否找到了输入框
    pub async fn fill_input(&self, selector: &str, text: &str) -> Result<bool, RendererError> {
        let js_code = format!(
            r#"
            (() => {{
                const el = document.querySelector({selector});
                if (!el) return false;
                el.focus();
                el.value = {text};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()
            "#,
            selector = js_string(selector),
            text = js_string(text),
        );
        self.eval_as(js_code).await
    }

    /// 点击文本（或 value）包含 `text` 的第一个元素
    pub async fn click_by_text(&self, selector: &str, text: &str) -> Result<bool, RendererError> {
        let js_code = format!(
            r#"
            (() => {{
                const wanted = {text};
                const candidates = Array.from(document.querySelectorAll({selector}));
                const target = candidates.find(el =>
                    (el.textContent || '').includes(wanted) || (el.value || '').includes(wanted)
                );
                if (!target) return false;
                target.click();
                return true;
            }})()
            "#,
            selector = js_string(selector),
            text = js_string(text),
        );
        self.eval_as(js_code).await
    }
}

/// 转成 JS 字符串字面量
fn js_string(value: &str) -> String {
    JsonValue::String(value.to_string()).to_string()
}
