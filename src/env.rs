//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，所有变量以 `PAGETRANS_` 为前缀

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "PAGETRANS_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }

    /// 禁用颜色输出
    pub struct NoColor;
    impl EnvVar<bool> for NoColor {
        const NAME: &'static str = "NO_COLOR";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Disable colored output when set to any value";

        fn parse(value: &str) -> EnvResult<bool> {
            // NO_COLOR 遵循标准：任何值都表示禁用颜色
            Ok(!value.is_empty())
        }
    }
}

/// 翻译相关环境变量
pub mod translation {
    use super::*;

    /// 源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "PAGETRANS_SOURCE_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Source language of the document";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME)
        }
    }

    /// 目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "PAGETRANS_TARGET_LANG";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Target language of the translation";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang(value, Self::NAME)
        }
    }

    /// API URL
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "PAGETRANS_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation API endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            let url = value.trim();
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(url.to_string())
            } else {
                Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "API URL must start with http:// or https://".to_string(),
                })
            }
        }
    }

    /// 服务标识
    pub struct Service;
    impl EnvVar<String> for Service {
        const NAME: &'static str = "PAGETRANS_SERVICE";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Service identifier sent with every request";

        fn parse(value: &str) -> EnvResult<String> {
            let service = value.trim();
            if service.is_empty() {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Service identifier must not be empty".to_string(),
                });
            }
            Ok(service.to_string())
        }
    }

    /// 单个块的最大长度
    pub struct MaxBlockLen;
    impl EnvVar<usize> for MaxBlockLen {
        const NAME: &'static str = "PAGETRANS_MAX_BLOCK_LEN";
        const DEFAULT: Option<usize> = Some(600);
        const DESCRIPTION: &'static str = "Maximum characters per dispatched block";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 16, 10000)
        }
    }

    /// 每个请求的最大块数
    pub struct MaxItems;
    impl EnvVar<usize> for MaxItems {
        const NAME: &'static str = "PAGETRANS_MAX_ITEMS";
        const DEFAULT: Option<usize> = Some(20);
        const DESCRIPTION: &'static str = "Maximum blocks per translation request";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 200)
        }
    }

    /// 并发工作者数
    pub struct MaxWorkers;
    impl EnvVar<usize> for MaxWorkers {
        const NAME: &'static str = "PAGETRANS_MAX_WORKERS";
        const DEFAULT: Option<usize> = Some(5);
        const DESCRIPTION: &'static str = "Number of concurrent translation workers";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 64)
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "PAGETRANS_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(30));
        const DESCRIPTION: &'static str = "Translation request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let seconds: u64 = value.parse().map_err(|_| EnvError {
                variable: Self::NAME.to_string(),
                message: "Must be a valid number of seconds".to_string(),
            })?;

            if seconds == 0 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout must be greater than 0".to_string(),
                });
            }

            if seconds > 300 {
                return Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: "Timeout too long (max 300 seconds)".to_string(),
                });
            }

            Ok(Duration::from_secs(seconds))
        }
    }

    /// 强制按行合并模式
    pub struct LineMerge;
    impl EnvVar<bool> for LineMerge {
        const NAME: &'static str = "PAGETRANS_LINE_MERGE";
        const DEFAULT: Option<bool> = Some(false);
        const DESCRIPTION: &'static str = "Merge lines broken by <br> before translating";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }

    fn parse_lang(value: &str, var_name: &str) -> EnvResult<String> {
        let lang = value.trim().to_lowercase();
        if lang.is_empty() || lang.contains('-') {
            return Err(EnvError {
                variable: var_name.to_string(),
                message: "Language code must be non-empty and must not contain '-'".to_string(),
            });
        }
        Ok(lang)
    }
}

/// 辅助函数
fn parse_bool(value: &str, var_name: &str) -> EnvResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "enabled" => Ok(true),
        "false" | "0" | "no" | "off" | "disabled" => Ok(false),
        _ => Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Invalid boolean value '{}'. Use: true/false, 1/0, yes/no, on/off, enabled/disabled",
                value
            ),
        }),
    }
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    docs.push_str("## Core Configuration\n\n");
    docs.push_str(&format!(
        "- `{}`: {}\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        core::NoColor::NAME,
        core::NoColor::DESCRIPTION,
        core::NoColor::DEFAULT
    ));

    docs.push_str("\n## Translation Configuration\n\n");
    for (name, description) in [
        (translation::SourceLang::NAME, translation::SourceLang::DESCRIPTION),
        (translation::TargetLang::NAME, translation::TargetLang::DESCRIPTION),
        (translation::ApiUrl::NAME, translation::ApiUrl::DESCRIPTION),
        (translation::Service::NAME, translation::Service::DESCRIPTION),
    ] {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::MaxBlockLen::NAME,
        translation::MaxBlockLen::DESCRIPTION,
        translation::MaxBlockLen::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::MaxItems::NAME,
        translation::MaxItems::DESCRIPTION,
        translation::MaxItems::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::MaxWorkers::NAME,
        translation::MaxWorkers::DESCRIPTION,
        translation::MaxWorkers::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::RequestTimeout::NAME,
        translation::RequestTimeout::DESCRIPTION,
        translation::RequestTimeout::DEFAULT
    ));
    docs.push_str(&format!(
        "- `{}`: {} (default: {:?})\n",
        translation::LineMerge::NAME,
        translation::LineMerge::DESCRIPTION,
        translation::LineMerge::DEFAULT
    ));

    docs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(core::LogLevel::parse("DEBUG").unwrap(), "debug");
        assert!(core::LogLevel::parse("verbose").is_err());
    }

    #[test]
    fn test_boolean_parsing() {
        assert!(translation::LineMerge::parse("true").unwrap());
        assert!(translation::LineMerge::parse("YES").unwrap());
        assert!(!translation::LineMerge::parse("off").unwrap());
        assert!(translation::LineMerge::parse("maybe").is_err());
    }

    #[test]
    fn test_url_validation() {
        assert!(translation::ApiUrl::parse("http://localhost:1188").is_ok());
        assert!(translation::ApiUrl::parse("https://api.example.com").is_ok());

        assert!(translation::ApiUrl::parse("ftp://example.com").is_err());
        assert!(translation::ApiUrl::parse("not-a-url").is_err());
    }

    #[test]
    fn test_numeric_validation() {
        assert_eq!(translation::MaxBlockLen::parse("600").unwrap(), 600);
        assert!(translation::MaxBlockLen::parse("0").is_err());
        assert!(translation::MaxWorkers::parse("65").is_err());
        assert!(translation::RequestTimeout::parse("0").is_err());
        assert_eq!(
            translation::RequestTimeout::parse("12").unwrap(),
            Duration::from_secs(12)
        );
    }

    #[test]
    fn test_language_codes() {
        assert_eq!(translation::TargetLang::parse(" FR ").unwrap(), "fr");
        assert!(translation::SourceLang::parse("en-fr").is_err());
        assert!(translation::SourceLang::parse("").is_err());
    }

    #[test]
    fn test_env_docs_list_variables() {
        let docs = generate_env_docs();
        assert!(docs.contains("PAGETRANS_LOG_LEVEL"));
        assert!(docs.contains("PAGETRANS_MAX_BLOCK_LEN"));
    }
}
