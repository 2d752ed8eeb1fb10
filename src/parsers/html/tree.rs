//! `markup5ever_rcdom` 文档树适配
//!
//! 节点句柄按 `Rc` 指针比较和哈希。模型中的片段持有句柄，节点在快照存活期间
//! 不会被释放，指针不会被复用。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData, RcDom};

use super::dom::{
    create_text_node, get_node_attr, get_node_name, get_parent_node, get_text, replace_child,
    set_node_attr, set_text,
};
use crate::translation::core::tree::{DocumentTree, NodeKind};
use crate::translation::error::{helpers, TranslationResult};

/// 按身份比较的节点句柄
#[derive(Clone)]
pub struct DomNode(pub Handle);

impl PartialEq for DomNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for DomNode {}

impl Hash for DomNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Rc::as_ptr(&self.0), state);
    }
}

impl fmt::Debug for DomNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            NodeData::Element { name, .. } => write!(f, "<{}>", name.local),
            NodeData::Text { contents } => write!(f, "#text({:?})", contents.borrow().to_string()),
            _ => write!(f, "#node"),
        }
    }
}

/// 基于 `RcDom` 的文档树
///
/// 克隆只复制文档句柄，修改对所有克隆可见。
#[derive(Clone)]
pub struct RcDomTree {
    document: Handle,
}

impl RcDomTree {
    pub fn new(dom: &RcDom) -> Self {
        Self {
            document: dom.document.clone(),
        }
    }

    pub fn document(&self) -> &Handle {
        &self.document
    }
}

impl DocumentTree for RcDomTree {
    type Node = DomNode;

    fn root(&self) -> Option<DomNode> {
        self.document
            .children
            .borrow()
            .iter()
            .find(|child| matches!(child.data, NodeData::Element { .. }))
            .cloned()
            .map(DomNode)
    }

    fn kind(&self, node: &DomNode) -> NodeKind {
        match &node.0.data {
            NodeData::Text { .. } => NodeKind::Text,
            NodeData::Element { name, .. } => {
                let tag: &str = &name.local;
                NodeKind::Element(tag.to_ascii_lowercase())
            }
            _ => NodeKind::Other,
        }
    }

    fn children(&self, node: &DomNode) -> Vec<DomNode> {
        node.0.children.borrow().iter().cloned().map(DomNode).collect()
    }

    fn parent_tag(&self, node: &DomNode) -> Option<String> {
        let parent = get_parent_node(&node.0)?;
        get_node_name(&parent).map(str::to_ascii_lowercase)
    }

    fn text(&self, node: &DomNode) -> Option<String> {
        get_text(&node.0)
    }

    fn set_text(&self, node: &DomNode, value: &str) {
        set_text(&node.0, value);
    }

    fn attr(&self, node: &DomNode, name: &str) -> Option<String> {
        get_node_attr(&node.0, name)
    }

    fn set_attr(&self, node: &DomNode, name: &str, value: &str) {
        set_node_attr(&node.0, name, Some(value.to_string()));
    }

    /// 静态文档不加载内嵌文档
    fn frame_body(&self, _node: &DomNode) -> TranslationResult<Option<DomNode>> {
        Ok(None)
    }

    fn replace_text(&self, node: &DomNode, pieces: &[String]) -> TranslationResult<Vec<DomNode>> {
        let parent = get_parent_node(&node.0)
            .ok_or_else(|| helpers::validation_error("文本节点没有父节点"))?;
        let replacements: Vec<Handle> = pieces.iter().map(|p| create_text_node(p)).collect();
        if !replace_child(&parent, &node.0, &replacements) {
            return Err(helpers::validation_error("父节点中找不到文本节点"));
        }
        Ok(replacements.into_iter().map(DomNode).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::{html_to_dom, serialize_document};

    #[test]
    fn test_root_is_html_element() {
        let dom = html_to_dom(b"<!DOCTYPE html><p>x</p>", "utf-8").unwrap();
        let tree = RcDomTree::new(&dom);
        let root = tree.root().unwrap();
        assert_eq!(tree.kind(&root), NodeKind::Element("html".to_string()));
    }

    #[test]
    fn test_kind_lowercases_foreign_tags() {
        let dom = html_to_dom(b"<svg><foreignObject>x</foreignObject></svg>", "utf-8").unwrap();
        let tree = RcDomTree::new(&dom);
        let root = tree.root().unwrap();
        let body = tree.children(&root).pop().unwrap();
        let svg = tree.children(&body).remove(0);
        let foreign = tree.children(&svg).remove(0);

        assert_eq!(tree.kind(&svg), NodeKind::Element("svg".to_string()));
        assert_eq!(tree.kind(&foreign), NodeKind::Element("foreignobject".to_string()));
        assert_eq!(tree.tag_name(&foreign).as_deref(), Some("foreignobject"));
    }

    #[test]
    fn test_node_identity() {
        let dom = html_to_dom(b"<p>a</p><p>a</p>", "utf-8").unwrap();
        let tree = RcDomTree::new(&dom);
        let root = tree.root().unwrap();
        let body = tree.children(&root).pop().unwrap();
        let paragraphs = tree.children(&body);

        assert_eq!(paragraphs.len(), 2);
        assert_ne!(paragraphs[0], paragraphs[1]);
        assert_eq!(paragraphs[0], paragraphs[0].clone());
    }

    #[test]
    fn test_replace_text_splices_new_nodes() {
        let dom = html_to_dom(b"<pre>one two</pre>", "utf-8").unwrap();
        let tree = RcDomTree::new(&dom);
        let root = tree.root().unwrap();
        let body = tree.children(&root).pop().unwrap();
        let pre = tree.children(&body).remove(0);
        let text = tree.children(&pre).remove(0);
        assert_eq!(tree.parent_tag(&text).as_deref(), Some("pre"));

        let nodes = tree
            .replace_text(&text, &["one ".to_string(), "two".to_string()])
            .unwrap();
        tree.set_text(&nodes[1], "deux");

        let html = String::from_utf8(serialize_document(&dom, "").unwrap()).unwrap();
        assert!(html.contains("<pre>one deux</pre>"));
        assert_eq!(tree.children(&pre).len(), 2);
    }
}
