use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::interface::{Attribute, QualName};
use html5ever::{namespace_url, ns, parse_document, LocalName};
use html5ever::tendril::{StrTendril, TendrilSink};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

/// 将 HTML 字节转换为 DOM
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> io::Result<RcDom> {
    let s: String = if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
        let (string, _, _) = encoding.decode(data);
        string.into_owned()
    } else {
        String::from_utf8_lossy(data).into_owned()
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 按标签路径查找节点，路径中相邻的标签不必是直接父子关系
pub fn find_nodes(node: &Handle, node_names: Vec<&str>) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some((&node_name, rest)) = node_names.split_first() else {
        return found_nodes;
    };

    if get_node_name(node) == Some(node_name) {
        if rest.is_empty() {
            found_nodes.push(node.clone());
        } else {
            found_nodes.append(&mut find_nodes(node, rest.to_vec()));
            return found_nodes;
        }
    }

    for child_node in node.children.borrow().iter() {
        found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
    }

    found_nodes
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            for attr in attrs.borrow().iter() {
                if &*attr.name.local == attr_name {
                    return Some(attr.value.to_string());
                }
            }
            None
        }
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 获取父节点，不改变节点的父引用
pub fn get_parent_node(child: &Handle) -> Option<Handle> {
    let weak = child.parent.take();
    let parent = weak.as_ref().and_then(|node| node.upgrade());
    child.parent.set(weak);
    parent
}

/// 设置节点属性，`attr_value` 为 `None` 时删除该属性
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    let NodeData::Element { attrs, .. } = &node.data else {
        return;
    };
    let mut attrs = attrs.borrow_mut();

    let Some(value) = attr_value else {
        attrs.retain(|attr| &*attr.name.local != attr_name);
        return;
    };

    let mut found = false;
    for attr in attrs.iter_mut().filter(|attr| &*attr.name.local == attr_name) {
        attr.value = StrTendril::from_slice(&value);
        found = true;
    }

    if !found {
        attrs.push(Attribute {
            name: QualName::new(None, ns!(), LocalName::from(attr_name)),
            value: StrTendril::from_slice(&value),
        });
    }
}

/// 读取文本节点的内容
pub fn get_text(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

/// 写入文本节点的内容，非文本节点忽略
pub fn set_text(node: &Handle, value: &str) {
    if let NodeData::Text { contents } = &node.data {
        *contents.borrow_mut() = StrTendril::from_slice(value);
    }
}

/// 创建游离的文本节点
pub fn create_text_node(value: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from_slice(value)),
    })
}

/// 用 `replacements` 替换 `child`，返回是否找到了 `child`
pub fn replace_child(parent: &Handle, child: &Handle, replacements: &[Handle]) -> bool {
    let mut children = parent.children.borrow_mut();
    let Some(position) = children.iter().position(|c| Rc::ptr_eq(c, child)) else {
        return false;
    };

    for node in replacements {
        node.parent.set(Some(Rc::downgrade(parent)));
    }
    children.splice(position..=position, replacements.iter().cloned());
    child.parent.set(None);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(dom: &RcDom) -> Handle {
        find_nodes(&dom.document, vec!["html", "body"])
            .into_iter()
            .next()
            .unwrap()
    }

    #[test]
    fn test_get_parent_node_keeps_link() {
        let dom = html_to_dom(b"<p>Hello</p>", "utf-8").unwrap();
        let p = find_nodes(&dom.document, vec!["p"]).remove(0);

        let first = get_parent_node(&p).unwrap();
        let second = get_parent_node(&p).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(get_node_name(&first), Some("body"));
    }

    #[test]
    fn test_replace_child_with_text_nodes() {
        let dom = html_to_dom(b"<p>Hello world</p>", "utf-8").unwrap();
        let p = find_nodes(&body(&dom), vec!["p"]).remove(0);
        let text = p.children.borrow()[0].clone();

        let pieces = vec![create_text_node("Hello "), create_text_node("world")];
        assert!(replace_child(&p, &text, &pieces));

        let children = p.children.borrow();
        assert_eq!(children.len(), 2);
        assert_eq!(get_text(&children[0]).as_deref(), Some("Hello "));
        assert!(Rc::ptr_eq(&get_parent_node(&children[1]).unwrap(), &p));
    }

    #[test]
    fn test_set_node_attr() {
        let dom = html_to_dom(b"<p title=\"a\">x</p>", "utf-8").unwrap();
        let p = find_nodes(&dom.document, vec!["p"]).remove(0);

        set_node_attr(&p, "title", Some("b".to_string()));
        set_node_attr(&p, "lang", Some("fr".to_string()));
        assert_eq!(get_node_attr(&p, "title").as_deref(), Some("b"));
        assert_eq!(get_node_attr(&p, "lang").as_deref(), Some("fr"));

        set_node_attr(&p, "title", None);
        assert!(get_node_attr(&p, "title").is_none());
    }
}
