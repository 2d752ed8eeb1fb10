//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 文档树接口、模型快照、译文重排和翻译会话
//! - **pipeline**: 文档模型管道（收集、差异字典、长度切分）
//! - **http**: JSON HTTP 传输
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use pagetrans::html::html_to_dom;
//! use pagetrans::translation::{translate_dom_content, TranslationConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dom = html_to_dom(b"<p>Hello world</p>", "utf-8")?;
//! let config = TranslationConfig::default().with_overrides(Some("en-fr"), None);
//! let summary = translate_dom_content(&dom, config).await?;
//! println!("进度 {}%", summary.progress);
//! # Ok(())
//! # }
//! ```

/// 配置管理模块
pub mod config;

/// 翻译核心：文档树接口、模型、会话
pub mod core;

/// 错误处理模块
pub mod error;

/// 基于 reqwest 的翻译传输
pub mod http;

/// 文档模型管道
pub mod pipeline;

pub use config::{constants, ConfigManager, TranslationConfig};
pub use self::core::{
    DocumentEvent, DocumentTree, LanguagePair, Model, PresentedChunk, Presenter, Session,
    SessionListener, SessionState, TranslatedBlock, TranslationRequest, Transport,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use http::HttpTransport;
pub use pipeline::{has_text, TextBreaker, WordBreaker};

use markup5ever_rcdom::RcDom;
use tracing::info;

use crate::html::RcDomTree;

/// 一次整页翻译的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationSummary {
    /// 已译字符占比（0-100）
    pub progress: u32,
    /// 被放弃的请求数
    pub failed_requests: u32,
}

/// 翻译HTML DOM内容
///
/// 用 HTTP 传输把整个文档翻译一遍，译文直接写回 `dom`。文档没有根元素时返回
/// [`TranslationError::AccessDenied`]；部分请求失败不视为错误，记录在返回值中。
pub async fn translate_dom_content(
    dom: &RcDom,
    config: TranslationConfig,
) -> TranslationResult<TranslationSummary> {
    let transport = HttpTransport::from_config(&config)?;
    let languages = config.languages();

    let mut session = Session::new("doc", RcDomTree::new(dom), Box::new(transport), config)?;
    session.start(&languages, false);
    session.translate(None);
    session.run_until_idle().await;

    if session.state() == SessionState::Inaccessible {
        return Err(TranslationError::AccessDenied("文档没有根元素".to_string()));
    }

    let summary = TranslationSummary {
        progress: session.progress(),
        failed_requests: session.error_count(),
    };
    info!(
        "文档翻译完成: {} 进度 {}%, 放弃 {} 个请求",
        languages, summary.progress, summary.failed_requests
    );
    Ok(summary)
}

/// 检查文本是否应该翻译
///
/// ```rust
/// use pagetrans::translation::should_translate;
///
/// assert!(should_translate("Hello World"));
/// assert!(!should_translate("123"));
/// assert!(!should_translate("   "));
/// ```
pub fn should_translate(text: &str) -> bool {
    has_text(text)
}

/// 检查翻译配置文件是否存在
pub fn config_file_exists() -> bool {
    config::config_file_exists()
}

/// 加载翻译配置：配置文件、环境变量，再叠加调用方给出的语言对和接口地址
pub fn load_translation_config(languages: Option<&str>, api_url: Option<&str>) -> TranslationConfig {
    config::load_translation_config(languages, api_url)
}
