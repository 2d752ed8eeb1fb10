//! # Pagetrans Library
//!
//! 在原文档上就地、增量地翻译 HTML 文档。
//!
//! ## 模块组织
//!
//! - `parsers` - HTML 解析、序列化，以及翻译使用的文档树适配
//! - `translation` - 文档模型、翻译会话、传输与配置
//! - `env` - 类型化的环境变量

pub mod env;
pub mod parsers;
pub mod translation;

// Re-export commonly used items for convenience
pub use parsers::*;
