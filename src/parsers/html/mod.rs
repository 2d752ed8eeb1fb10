//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `metadata`: 文档元数据处理
//! - `serializer`: 序列化功能
//! - `tree`: 翻译核心使用的文档树适配

pub mod dom;
pub mod metadata;
pub mod serializer;
pub mod tree;

pub use dom::{
    create_text_node, find_nodes, get_node_attr, get_node_name, get_parent_node, get_text,
    html_to_dom, replace_child, set_node_attr, set_text,
};
pub use metadata::{get_charset, get_title};
pub use serializer::serialize_document;
pub use tree::{DomNode, RcDomTree};
