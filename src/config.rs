/// 程序配置
///
/// 加载顺序：默认值 → TOML 文件（`SCRAPER_CONFIG` 指定路径）→ 环境变量。
/// 验证码服务的密钥只从环境变量 / 配置文件读取，不提供默认值。
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 列表页 URL
    pub listing_url: String,
    /// 相对链接补全用的站点地址，为空时取列表页的 origin
    pub base_origin: Option<String>,
    /// 报告输出路径
    pub output_path: PathBuf,
    /// 页面加载超时（秒）
    pub page_load_timeout_secs: u64,
    /// 导航完成后的等待时间（毫秒）
    pub settle_delay_ms: u64,
    /// 提交验证码后的等待时间（毫秒）
    pub challenge_settle_delay_ms: u64,
    /// 是否无界面运行
    pub headless: bool,
    /// 浏览器 User-Agent
    pub user_agent: String,
    /// 浏览器可执行文件，为空时由 chromiumoxide 自动查找
    pub chrome_executable: Option<PathBuf>,
    // --- 验证码服务配置 ---
    pub solver_api_key: String,
    pub solver_api_base_url: String,
    pub solver_timeout_secs: u64,
    pub solver_poll_interval_ms: u64,
    /// 验证码截图保存路径
    pub screenshot_path: PathBuf,
    // --- 日志配置 ---
    /// 输出日志文件
    pub log_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: "https://psnet.ahrq.gov/webmm-case-studies?items_per_page=100&page=6"
                .to_string(),
            base_origin: None,
            output_path: PathBuf::from("case_studies.pdf"),
            page_load_timeout_secs: 30,
            settle_delay_ms: 2000,
            challenge_settle_delay_ms: 3000,
            headless: true,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            chrome_executable: None,
            solver_api_key: String::new(),
            solver_api_base_url: "https://2captcha.com".to_string(),
            solver_timeout_secs: 120,
            solver_poll_interval_ms: 5000,
            screenshot_path: PathBuf::from("captcha.png"),
            log_file: "scraper.log".to_string(),
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 加载完整配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("SCRAPER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载，缺省字段使用默认值
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::TomlParseFailed {
            path: origin.to_string(),
            source,
        })
    }

    /// 用环境变量覆盖当前配置
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LISTING_URL") {
            self.listing_url = v;
        }
        if let Some(v) = lookup("BASE_ORIGIN") {
            self.base_origin = Some(v);
        }
        if let Some(v) = lookup("OUTPUT_PATH") {
            self.output_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("PAGE_LOAD_TIMEOUT_SECS") {
            self.page_load_timeout_secs = parse_var("PAGE_LOAD_TIMEOUT_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("SETTLE_DELAY_MS") {
            self.settle_delay_ms = parse_var("SETTLE_DELAY_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("CHALLENGE_SETTLE_DELAY_MS") {
            self.challenge_settle_delay_ms = parse_var("CHALLENGE_SETTLE_DELAY_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("HEADLESS") {
            self.headless = parse_var("HEADLESS", &v, "bool")?;
        }
        if let Some(v) = lookup("USER_AGENT") {
            self.user_agent = v;
        }
        if let Some(v) = lookup("CHROME_EXECUTABLE") {
            self.chrome_executable = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("SOLVER_API_KEY") {
            self.solver_api_key = v;
        }
        if let Some(v) = lookup("SOLVER_API_BASE_URL") {
            self.solver_api_base_url = v;
        }
        if let Some(v) = lookup("SOLVER_TIMEOUT_SECS") {
            self.solver_timeout_secs = parse_var("SOLVER_TIMEOUT_SECS", &v, "u64")?;
        }
        if let Some(v) = lookup("SOLVER_POLL_INTERVAL_MS") {
            self.solver_poll_interval_ms = parse_var("SOLVER_POLL_INTERVAL_MS", &v, "u64")?;
        }
        if let Some(v) = lookup("SCREENSHOT_PATH") {
            self.screenshot_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LOG_FILE") {
            self.log_file = v;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_var("VERBOSE_LOGGING", &v, "bool")?;
        }
        Ok(())
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.listing_url)
            .map_err(|e| ConfigError::invalid("listing_url", e.to_string()))?;
        if let Some(origin) = &self.base_origin {
            Url::parse(origin).map_err(|e| ConfigError::invalid("base_origin", e.to_string()))?;
        }
        if self.page_load_timeout_secs == 0 {
            return Err(ConfigError::invalid("page_load_timeout_secs", "必须大于 0"));
        }
        if self.solver_timeout_secs == 0 {
            return Err(ConfigError::invalid("solver_timeout_secs", "必须大于 0"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(ConfigError::invalid("output_path", "不能为空"));
        }
        Ok(())
    }

    /// 相对链接补全用的站点地址
    ///
    /// 显式配置优先，否则取列表页的 scheme + host (+ port)。
    pub fn resolved_origin(&self) -> Result<String, ConfigError> {
        if let Some(origin) = &self.base_origin {
            return Ok(origin.trim_end_matches('/').to_string());
        }
        let url = Url::parse(&self.listing_url)
            .map_err(|e| ConfigError::invalid("listing_url", e.to_string()))?;
        Ok(url.origin().ascii_serialization())
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn challenge_settle_delay(&self) -> Duration {
        Duration::from_millis(self.challenge_settle_delay_ms)
    }

    pub fn solver_timeout(&self) -> Duration {
        Duration::from_secs(self.solver_timeout_secs)
    }

    pub fn solver_poll_interval(&self) -> Duration {
        Duration::from_millis(self.solver_poll_interval_ms)
    }
}

fn parse_var<T: FromStr>(var_name: &str, value: &str, expected_type: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(config.solver_api_key.is_empty());
    }

    #[test]
    fn test_origin_derived_from_listing_url() {
        let config = Config {
            listing_url: "https://x.test/cases?page=2".to_string(),
            ..Config::default()
        };
        assert_eq!(config.resolved_origin().unwrap(), "https://x.test");
    }

    #[test]
    fn test_explicit_origin_wins() {
        let config = Config {
            base_origin: Some("https://cdn.x.test/".to_string()),
            ..Config::default()
        };
        assert_eq!(config.resolved_origin().unwrap(), "https://cdn.x.test");
    }

    #[test]
    fn test_toml_partial_override() {
        let config = Config::from_toml_str(
            r#"
            listing_url = "https://x.test/list"
            page_load_timeout_secs = 10
            headless = false
            "#,
            "inline",
        )
        .unwrap();
        assert_eq!(config.listing_url, "https://x.test/list");
        assert_eq!(config.page_load_timeout(), Duration::from_secs(10));
        assert!(!config.headless);
        // 未写的字段保持默认
        assert_eq!(config.settle_delay_ms, 2000);
    }

    #[test]
    fn test_env_override_and_parse_error() {
        let vars: HashMap<&str, &str> = [
            ("SOLVER_API_KEY", "secret"),
            ("SETTLE_DELAY_MS", "150"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .apply_vars(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.solver_api_key, "secret");
        assert_eq!(config.settle_delay(), Duration::from_millis(150));

        let mut config = Config::default();
        let err = config
            .apply_vars(|name| (name == "HEADLESS").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { .. }));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = Config {
            page_load_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
