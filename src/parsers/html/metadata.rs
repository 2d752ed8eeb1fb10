//! HTML 文档元数据
//!
//! 读取字符编码声明与文档标题，供命令行在解析和输出时使用。

use markup5ever_rcdom::{Handle, NodeData};

use super::dom::{find_nodes, get_node_attr};

/// 从 `Content-Type` 值中取出 charset
fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        part.trim()
            .strip_prefix("charset=")
            .map(|charset| charset.trim_matches('"').to_string())
    })
}

/// 获取文档字符编码
///
/// 支持两种格式：
/// 1. HTML5 格式：`<meta charset="utf-8">`
/// 2. HTML4 格式：`<meta http-equiv="content-type" content="text/html; charset=utf-8">`
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, vec!["html", "head", "meta"]).iter() {
        if let Some(meta_charset_node_attr_value) = get_node_attr(meta_node, "charset") {
            return Some(meta_charset_node_attr_value);
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(content) = get_node_attr(meta_node, "content") {
                return charset_from_content_type(&content);
            }
        }
    }

    None
}

/// 获取文档标题
pub fn get_title(node: &Handle) -> Option<String> {
    for title_node in find_nodes(node, vec!["html", "head", "title"]).iter() {
        for child_node in title_node.children.borrow().iter() {
            if let NodeData::Text { ref contents } = child_node.data {
                return Some(contents.borrow().to_string());
            }
        }
    }

    None
}
