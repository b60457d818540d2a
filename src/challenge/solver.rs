//! 验证码识别服务客户端
//!
//! 兼容 2captcha 风格的"提交 + 轮询"接口：
//! `POST {base}/in.php` 提交 base64 图片拿到任务 ID，
//! 之后轮询 `GET {base}/res.php` 直到返回结果或出错。

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::SolverError;

/// 验证码识别能力
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    /// 识别图片中的文本，最多等待 `timeout`
    async fn solve(&self, image: &[u8], timeout: Duration) -> Result<String, SolverError>;
}

/// 服务还没算完时返回的标记（拼写来自服务方）
const NOT_READY: &str = "CAPCHA_NOT_READY";

/// 表示账号问题的错误码，重试没有意义
const DENIED_CODES: &[&str] = &[
    "ERROR_WRONG_USER_KEY",
    "ERROR_KEY_DOES_NOT_EXIST",
    "ERROR_ZERO_BALANCE",
    "ERROR_IP_NOT_ALLOWED",
    "IP_BANNED",
    "ERROR_ACCOUNT_SUSPENDED",
];

#[derive(Debug, Deserialize)]
struct VendorResponse {
    status: i64,
    request: String,
}

/// HTTP 验证码识别客户端
pub struct HttpChallengeSolver {
    client: reqwest::Client,
    api_key: String,
    api_base_url: String,
    poll_interval: Duration,
}

impl HttpChallengeSolver {
    /// 创建新的识别客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.solver_api_key.clone(),
            api_base_url: config.solver_api_base_url.trim_end_matches('/').to_string(),
            poll_interval: config.solver_poll_interval(),
        }
    }

    async fn submit_and_poll(&self, image: &[u8]) -> Result<String, SolverError> {
        let body = BASE64_STANDARD.encode(image);
        let submit_url = format!("{}/in.php", self.api_base_url);
        debug!("提交验证码图片 ({} 字节)", image.len());

        let response: VendorResponse = self
            .client
            .post(&submit_url)
            .form(&[
                ("key", self.api_key.as_str()),
                ("method", "base64"),
                ("body", body.as_str()),
                ("json", "1"),
            ])
            .send()
            .await
            .map_err(transport_error)?
            .json()
            .await
            .map_err(transport_error)?;

        let task_id = interpret(response)?;
        debug!("验证码任务 ID: {}", task_id);

        let result_url = format!("{}/res.php", self.api_base_url);
        loop {
            sleep(self.poll_interval).await;

            let response: VendorResponse = self
                .client
                .get(&result_url)
                .query(&[
                    ("key", self.api_key.as_str()),
                    ("action", "get"),
                    ("id", task_id.as_str()),
                    ("json", "1"),
                ])
                .send()
                .await
                .map_err(transport_error)?
                .json()
                .await
                .map_err(transport_error)?;

            if response.status != 1 && response.request == NOT_READY {
                debug!("验证码尚未识别完成，继续等待");
                continue;
            }

            let text = interpret(response)?;
            if text.trim().is_empty() {
                return Err(SolverError::Unsolved("solver returned empty text".to_string()));
            }
            return Ok(text.trim().to_string());
        }
    }
}

#[async_trait]
impl ChallengeSolver for HttpChallengeSolver {
    async fn solve(&self, image: &[u8], timeout: Duration) -> Result<String, SolverError> {
        if self.api_key.trim().is_empty() {
            return Err(SolverError::VendorDenied("solver API key not configured".to_string()));
        }

        match tokio::time::timeout(timeout, self.submit_and_poll(image)).await {
            Ok(result) => result,
            Err(_) => Err(SolverError::Unsolved(format!(
                "no answer within {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// status == 1 时返回 request 字段，否则按错误码分类
fn interpret(response: VendorResponse) -> Result<String, SolverError> {
    if response.status == 1 {
        Ok(response.request)
    } else {
        Err(classify_vendor_error(&response.request))
    }
}

fn classify_vendor_error(code: &str) -> SolverError {
    if DENIED_CODES.contains(&code) {
        SolverError::VendorDenied(code.to_string())
    } else {
        SolverError::Unsolved(code.to_string())
    }
}

fn transport_error(err: reqwest::Error) -> SolverError {
    warn!("验证码服务请求失败: {}", err);
    SolverError::Unsolved(format!("solver request failed: {}", err))
}
