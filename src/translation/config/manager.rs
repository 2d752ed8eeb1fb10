//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 基础配置
    pub source_lang: String,
    pub target_lang: String,
    pub api_url: String,
    pub service: String,

    // 分块与批次
    pub max_block_len: usize,
    pub max_items: usize,
    pub max_workers: usize,

    // 错误预算
    pub max_repeat: u32,
    pub error_allowance: i32,
    pub good_streak: u32,

    // 调度
    pub start_delay_ms: u64,
    pub idle_interval_ms: u64,
    pub request_timeout_secs: u64,

    // 功能开关
    pub line_merge: bool,
    pub background: bool,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: "en".to_string(),
            target_lang: "fr".to_string(),
            api_url: constants::DEFAULT_API_URL.to_string(),
            service: constants::DEFAULT_SERVICE.to_string(),

            max_block_len: constants::MAX_BLOCK_LEN,
            max_items: constants::MAX_ITEMS,
            max_workers: constants::MAX_WORKERS,

            max_repeat: constants::MAX_REPEAT,
            error_allowance: constants::ERROR_ALLOWANCE,
            good_streak: constants::GOOD_STREAK,

            start_delay_ms: constants::START_DELAY.as_millis() as u64,
            idle_interval_ms: constants::IDLE_INTERVAL.as_millis() as u64,
            request_timeout_secs: constants::REQUEST_TIMEOUT.as_secs(),

            line_merge: false,
            background: false,
        }
    }
}

impl TranslationConfig {
    /// 用命令行参数覆盖语言对与 API 地址
    pub fn with_overrides(mut self, languages: Option<&str>, api_url: Option<&str>) -> Self {
        if let Some((source, target)) = languages.and_then(|pair| pair.split_once('-')) {
            self.source_lang = source.to_string();
            self.target_lang = target.to_string();
        }
        if let Some(url) = api_url {
            self.api_url = url.to_string();
        }
        self
    }

    /// 语言对，形如 `en-fr`
    pub fn languages(&self) -> String {
        format!("{}-{}", self.source_lang, self.target_lang)
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        if self.max_block_len == 0 {
            return Err(TranslationError::ConfigError("块长度上限不能为0".to_string()));
        }

        if self.max_items == 0 {
            return Err(TranslationError::ConfigError("每个请求的块数不能为0".to_string()));
        }

        if self.max_workers == 0 {
            return Err(TranslationError::ConfigError("工作者数量不能为0".to_string()));
        }

        if self.good_streak == 0 {
            return Err(TranslationError::ConfigError("连续成功阈值不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时不能为0".to_string()));
        }

        url::Url::parse(&self.api_url).map_err(|e| {
            TranslationError::ConfigError(format!("API URL 无效 '{}': {}", self.api_url, e))
        })?;

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, EnvVar};

        if let Ok(source_lang) = translation::SourceLang::get() {
            self.source_lang = source_lang;
        }

        if let Ok(target_lang) = translation::TargetLang::get() {
            self.target_lang = target_lang;
        }

        if let Ok(api_url) = translation::ApiUrl::get() {
            self.api_url = api_url;
            tracing::info!("环境变量覆盖 API URL: {}", self.api_url);
        }

        if let Ok(service) = translation::Service::get() {
            self.service = service;
        }

        if std::env::var(translation::MaxBlockLen::NAME).is_ok() {
            if let Ok(max_block_len) = translation::MaxBlockLen::get() {
                self.max_block_len = max_block_len;
            }
        }

        if std::env::var(translation::MaxItems::NAME).is_ok() {
            if let Ok(max_items) = translation::MaxItems::get() {
                self.max_items = max_items;
            }
        }

        if std::env::var(translation::MaxWorkers::NAME).is_ok() {
            if let Ok(max_workers) = translation::MaxWorkers::get() {
                self.max_workers = max_workers;
            }
        }

        if std::env::var(translation::RequestTimeout::NAME).is_ok() {
            if let Ok(timeout) = translation::RequestTimeout::get() {
                self.request_timeout_secs = timeout.as_secs();
            }
        }

        if translation::LineMerge::get_or_default(false) {
            self.line_merge = true;
        }
    }

    /// 转换为Duration类型
    pub fn start_delay(&self) -> Duration {
        Duration::from_millis(self.start_delay_ms)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &TranslationConfig {
        &self.config
    }

    /// 按命令行参数生成配置
    pub fn create_simple_config(
        &self,
        languages: Option<&str>,
        api_url: Option<&str>,
    ) -> TranslationConfig {
        self.config.clone().with_overrides(languages, api_url)
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        // 查找配置文件
        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        parse_config(path, &content)
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

/// 按扩展名解析 TOML 或 JSON 配置
fn parse_config(path: &str, content: &str) -> TranslationResult<TranslationConfig> {
    if path.ends_with(".toml") {
        toml::from_str(content)
            .map_err(|e| TranslationError::ConfigError(format!("解析TOML配置失败: {}", e)))
    } else {
        serde_json::from_str(content)
            .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_block_len, 600);
        assert_eq!(config.max_items, 20);
        assert_eq!(config.max_workers, 5);
        assert_eq!(config.languages(), "en-fr");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = parse_config(
            "pagetrans.toml",
            "target_lang = \"de\"\nmax_workers = 2\n",
        )
        .unwrap();
        assert_eq!(config.target_lang, "de");
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.max_items, constants::MAX_ITEMS);
    }

    #[test]
    fn test_json_config() {
        let config = parse_config("pagetrans.json", r#"{"line_merge": true}"#).unwrap();
        assert!(config.line_merge);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = TranslationConfig::default();
        config.max_block_len = 0;
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.api_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = TranslationConfig::default()
            .with_overrides(Some("de-ru"), Some("http://translate.local"));
        assert_eq!(config.source_lang, "de");
        assert_eq!(config.target_lang, "ru");
        assert_eq!(config.api_url, "http://translate.local");
    }
}
