//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。过期代次的响应不是错误，
//! 会在会话的响应入口被静默丢弃，因此这里没有对应的变体。

use std::fmt;

use thiserror::Error;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 传输层失败（网络、超时、服务端错误）
    #[error("传输失败: {0}")]
    TransportFailure(String),

    /// 响应格式无法解析或与请求不匹配
    #[error("响应格式错误: {0}")]
    MalformedResponse(String),

    /// 错误预算或单请求重试次数耗尽
    #[error("请求 {request_id} 已放弃（失败 {failures} 次）: {last_error}")]
    BudgetExhausted {
        request_id: String,
        failures: u32,
        last_error: String,
    },

    /// 内嵌文档不可访问（跨域等）
    #[error("文档不可访问: {0}")]
    AccessDenied(String),

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::TransportFailure(_) => true,
            TranslationError::MalformedResponse(_) => true,
            TranslationError::BudgetExhausted { .. } => false,
            TranslationError::AccessDenied(_) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::InvalidInput(_) => false,
            TranslationError::SerializationError(_) => false,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::TransportFailure(_) => ErrorSeverity::Warning,
            TranslationError::MalformedResponse(_) => ErrorSeverity::Warning,
            TranslationError::BudgetExhausted { .. } => ErrorSeverity::Error,
            TranslationError::AccessDenied(_) => ErrorSeverity::Info,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::TransportFailure(_) => ErrorCategory::Network,
            TranslationError::MalformedResponse(_) => ErrorCategory::Parsing,
            TranslationError::BudgetExhausted { .. } => ErrorCategory::Budget,
            TranslationError::AccessDenied(_) => ErrorCategory::Access,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let current_msg = self.to_string();
        let new_msg = format!("{} (上下文: {})", current_msg, context);

        match &mut self {
            TranslationError::ConfigError(ref mut msg) => *msg = new_msg,
            TranslationError::TransportFailure(ref mut msg) => *msg = new_msg,
            TranslationError::MalformedResponse(ref mut msg) => *msg = new_msg,
            TranslationError::AccessDenied(ref mut msg) => *msg = new_msg,
            TranslationError::InvalidInput(ref mut msg) => *msg = new_msg,
            TranslationError::SerializationError(ref mut msg) => *msg = new_msg,
            TranslationError::BudgetExhausted {
                ref mut last_error, ..
            } => *last_error = format!("{} (上下文: {})", last_error, context),
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Parsing,
    Budget,
    Access,
    Input,
    Serialization,
}

/// 标准错误转换
impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::TransportFailure(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslationError::MalformedResponse(format!("响应解码失败: {}", error))
        } else {
            TranslationError::TransportFailure(format!("HTTP请求失败: {}", error))
        }
    }
}

impl From<tokio::time::error::Elapsed> for TranslationError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        TranslationError::TransportFailure(format!("请求超时: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        match error.severity() {
            ErrorSeverity::Info => tracing::debug!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }
    }

    /// 创建传输错误
    pub fn transport_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::TransportFailure(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建响应格式错误
    pub fn malformed<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::MalformedResponse(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }
}
