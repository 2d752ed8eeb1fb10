//! # 解析器模块
//!
//! - `html` - HTML文档解析、DOM操作、元数据处理，以及翻译使用的文档树适配

pub mod html;

// Re-export commonly used items for convenience
pub use html::{get_charset, get_title, html_to_dom, serialize_document, RcDomTree};
