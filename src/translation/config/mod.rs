//! 翻译配置管理模块
//!
//! 支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 分块与批次
    pub const MAX_BLOCK_LEN: usize = 600;
    pub const MAX_ITEMS: usize = 20;
    pub const MAX_WORKERS: usize = 5;

    // 错误预算
    pub const MAX_REPEAT: u32 = 2;
    pub const ERROR_ALLOWANCE: i32 = 5;
    pub const GOOD_STREAK: u32 = 9;

    // 调度
    pub const START_DELAY: Duration = Duration::from_millis(1000);
    pub const IDLE_INTERVAL: Duration = Duration::from_millis(1000);
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    // 默认API设置
    pub const DEFAULT_API_URL: &str = "http://localhost:1188";
    pub const DEFAULT_SERVICE: &str = "tr-url";

    /// 不进入的元素，遇到时视为块边界
    pub const SKIP_TAGS: &[&str] = &[
        "audio", "base", "canvas", "embed", "link", "meta", "noembed", "noscript", "object",
        "script", "style", "svg", "video",
    ];

    /// 行内元素，其余元素都视为块
    pub const INLINE_TAGS: &[&str] = &[
        "a", "abbr", "acronym", "b", "bdo", "big", "cite", "code", "dfn", "em", "i", "kbd", "q",
        "samp", "small", "span", "strong", "sub", "sup", "tt", "u", "var",
    ];

    pub const FRAME_TAGS: &[&str] = &["iframe", "frame"];

    /// `value` 需要翻译的 `input` 类型
    pub const BUTTON_TYPES: &[&str] = &["button", "reset", "submit"];

    /// 转换自 PDF 的文档在 `<meta name="generator">` 中的前缀
    pub const PDF_GENERATOR_PREFIX: &str = "yandex-pdf2html";

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "pagetrans.toml",
        ".pagetrans.toml",
        "~/.config/pagetrans/config.toml",
        "/etc/pagetrans/config.toml",
    ];
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 加载配置，失败时退回默认值
pub fn load_translation_config(languages: Option<&str>, api_url: Option<&str>) -> TranslationConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.create_simple_config(languages, api_url),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            TranslationConfig::default().with_overrides(languages, api_url)
        }
    }
}
