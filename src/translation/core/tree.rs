//! 文档树访问能力
//!
//! 翻译核心不拥有文档树，只通过 [`DocumentTree`] 读取和修改它。
//! 节点句柄必须可比较、可哈希，以便差异字典按节点身份复用译文。

use std::fmt::Debug;
use std::hash::Hash;

use crate::translation::error::TranslationResult;

/// 节点类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// 文本节点
    Text,
    /// 元素节点，携带小写标签名
    Element(String),
    /// 注释、文档类型等不参与翻译的节点
    Other,
}

/// 文档树访问接口
///
/// 所有修改方法都接收 `&self`：具体实现通常基于内部可变的节点
/// （例如 `markup5ever_rcdom` 的 `RefCell`）。
pub trait DocumentTree {
    /// 节点句柄
    type Node: Clone + Eq + Hash + Debug;

    /// 文档根元素，文档不可访问时返回 `None`
    fn root(&self) -> Option<Self::Node>;

    fn kind(&self, node: &Self::Node) -> NodeKind;

    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// 父元素的小写标签名
    fn parent_tag(&self, node: &Self::Node) -> Option<String>;

    /// 文本节点的当前值
    fn text(&self, node: &Self::Node) -> Option<String>;

    fn set_text(&self, node: &Self::Node, value: &str);

    fn attr(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn set_attr(&self, node: &Self::Node, name: &str, value: &str);

    /// 访问 `iframe`/`frame` 元素的同源内嵌文档，返回其 `body`。
    ///
    /// 没有内嵌文档时返回 `Ok(None)`，跨域或其他访问失败返回错误，
    /// 调用方会静默跳过该子树。
    fn frame_body(&self, node: &Self::Node) -> TranslationResult<Option<Self::Node>>;

    /// 用若干新文本节点替换一个文本节点，按顺序返回新节点
    fn replace_text(&self, node: &Self::Node, pieces: &[String]) -> TranslationResult<Vec<Self::Node>>;

    /// 元素节点的小写标签名
    fn tag_name(&self, node: &Self::Node) -> Option<String> {
        match self.kind(node) {
            NodeKind::Element(name) => Some(name),
            _ => None,
        }
    }
}

/// 译文写入目标
#[derive(Debug, Clone)]
pub enum Unit<N> {
    /// 文本节点
    Text(N),
    /// 元素的文本属性（`title`、`alt`、`placeholder`、按钮 `value`）
    Attr { node: N, name: String },
    /// 被 `br` 断开后合并的多行文本节点，`originals` 为各节点合并前的值
    Merged { nodes: Vec<N>, originals: Vec<String> },
    /// 复合块的合成子单元，值只保存在所属片段中
    Detached,
}

impl<N: PartialEq> Unit<N> {
    /// 按节点身份比较；`Detached` 与任何单元都不相等
    pub fn same_unit(&self, other: &Unit<N>) -> bool {
        match (self, other) {
            (Unit::Text(a), Unit::Text(b)) => a == b,
            (Unit::Attr { node: a, name: x }, Unit::Attr { node: b, name: y }) => a == b && x == y,
            (Unit::Merged { nodes: a, .. }, Unit::Merged { nodes: b, .. }) => a == b,
            _ => false,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, Unit::Detached)
    }
}

impl<N> Unit<N> {
    /// 把值写回文档树。多节点单元通过比例重排分配到各节点。
    pub fn write<T>(&self, tree: &T, value: &str)
    where
        T: DocumentTree<Node = N> + ?Sized,
    {
        match self {
            Unit::Text(node) => tree.set_text(node, value),
            Unit::Attr { node, name } => tree.set_attr(node, name, value),
            Unit::Merged { nodes, originals } => {
                let lengths: Vec<usize> = originals.iter().map(|o| o.chars().count()).collect();
                let pieces = super::realign::split_text(value, &lengths);
                for (node, piece) in nodes.iter().zip(pieces.iter()) {
                    tree.set_text(node, piece);
                }
            }
            Unit::Detached => {}
        }
    }

    /// 恢复原文。合并单元逐节点写回合并前的值，其余单元写回 `source`。
    pub fn restore<T>(&self, tree: &T, source: &str)
    where
        T: DocumentTree<Node = N> + ?Sized,
    {
        match self {
            Unit::Merged { nodes, originals } => {
                for (node, original) in nodes.iter().zip(originals.iter()) {
                    tree.set_text(node, original);
                }
            }
            _ => self.write(tree, source),
        }
    }
}
