//! 块收集器
//!
//! 遍历文档树一次，把可翻译内容切成有序的叶子块。块边界由块级元素、
//! 跳过的元素和 `textarea` 决定；行内元素的文本并入当前块。
//!
//! 累加器是显式值：每次递归接收外层累加器并返回它，块级元素用新的
//! 累加器收集子节点，在元素结束时把它切成块。

use tracing::debug;

use super::chunk::{LeafChunk, Span};
use super::dictionary::DiffDictionary;
use super::filters::{has_text, is_blank, normalize_spaces};
use crate::translation::config::constants;
use crate::translation::core::languages::LanguagePair;
use crate::translation::core::tree::{DocumentTree, NodeKind, Unit};

/// 累加器中的条目
#[derive(Debug, Clone)]
enum Entry<N> {
    Text(N),
    Attr(N, String),
    /// 块边界
    Boundary,
    /// 行合并模式下的 `br`
    LineBreak,
}

/// 待生成片段的单元及其当前值
struct Piece<N> {
    unit: Unit<N>,
    value: String,
    /// 文本节点（非 `pre`）需要折叠空白
    collapse: bool,
}

/// 收集统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub nodes_visited: usize,
    pub nodes_skipped: usize,
    pub spans_reused: usize,
    pub spans_created: usize,
}

/// 一次遍历的结果
#[derive(Debug, Clone)]
pub struct BuildOutput<N> {
    /// 尚未经过长度限制的叶子块
    pub chunks: Vec<LeafChunk<N>>,
    pub source_len: usize,
    /// 是否出现了差异字典中没有的片段
    pub dirty: bool,
    /// `lang` 属性被改写的元素
    pub changed_langs: Vec<N>,
    pub stats: BuildStats,
}

/// 块收集器
pub struct ChunkBuilder<'a, T: DocumentTree> {
    tree: &'a T,
    languages: &'a LanguagePair,
    dictionary: &'a DiffDictionary<T::Node>,
    line_merge: bool,
    chunks: Vec<LeafChunk<T::Node>>,
    source_len: usize,
    dirty: bool,
    changed_langs: Vec<T::Node>,
    stats: BuildStats,
}

impl<'a, T: DocumentTree> ChunkBuilder<'a, T> {
    pub fn new(
        tree: &'a T,
        languages: &'a LanguagePair,
        dictionary: &'a DiffDictionary<T::Node>,
        line_merge: bool,
    ) -> Self {
        Self {
            tree,
            languages,
            dictionary,
            line_merge,
            chunks: Vec::new(),
            source_len: 0,
            dirty: false,
            changed_langs: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// 从 `root` 开始遍历
    pub fn build(mut self, root: &T::Node) -> BuildOutput<T::Node> {
        let rest = self.visit(root, Vec::new(), true);
        self.add_chunk(rest);

        debug!(
            "收集完成: {} 个块, {} 个字符, 复用 {} 个片段, 新增 {} 个片段",
            self.chunks.len(),
            self.source_len,
            self.stats.spans_reused,
            self.stats.spans_created
        );

        BuildOutput {
            chunks: self.chunks,
            source_len: self.source_len,
            dirty: self.dirty,
            changed_langs: self.changed_langs,
            stats: self.stats,
        }
    }

    fn visit(
        &mut self,
        node: &T::Node,
        mut acc: Vec<Entry<T::Node>>,
        mode: bool,
    ) -> Vec<Entry<T::Node>> {
        self.stats.nodes_visited += 1;
        match self.tree.kind(node) {
            NodeKind::Text => {
                if mode {
                    acc.push(Entry::Text(node.clone()));
                }
                acc
            }
            NodeKind::Element(tag) => self.visit_element(node, &tag, acc, mode),
            NodeKind::Other => acc,
        }
    }

    fn visit_element(
        &mut self,
        node: &T::Node,
        tag: &str,
        mut acc: Vec<Entry<T::Node>>,
        mut mode: bool,
    ) -> Vec<Entry<T::Node>> {
        let no_translate = self
            .tree
            .attr(node, "class")
            .map_or(false, |class| class.contains("notranslate"));
        if constants::SKIP_TAGS.contains(&tag) || no_translate {
            self.stats.nodes_skipped += 1;
            acc.push(Entry::Boundary);
            return acc;
        }

        if tag == "br" && self.line_merge {
            acc.push(Entry::LineBreak);
            return acc;
        }

        if let Some(value) = self.tree.attr(node, "translate").filter(|v| !v.is_empty()) {
            mode = value == "yes";
        }

        self.visit_attrs(node, tag, mode);

        if tag == "textarea" {
            acc.push(Entry::Boundary);
            return acc;
        }

        if constants::INLINE_TAGS.contains(&tag) {
            for child in self.tree.children(node) {
                acc = self.visit(&child, acc, mode);
            }
        } else {
            acc.push(Entry::Boundary);
            let mut inner = Vec::new();
            for child in self.tree.children(node) {
                inner = self.visit(&child, inner, mode);
            }
            self.add_chunk(inner);
        }

        if mode && constants::FRAME_TAGS.contains(&tag) {
            self.visit_frame(node);
        }

        acc
    }

    /// 属性处理：书写方向、`lang` 改写、可翻译属性
    fn visit_attrs(&mut self, node: &T::Node, tag: &str, mode: bool) {
        if !mode {
            return;
        }

        if let Some(direction) = self.languages.direction_change() {
            self.tree.set_attr(node, "dir", direction.as_str());
        }

        if self.tree.attr(node, "lang").as_deref() == Some(self.languages.source.as_str()) {
            self.tree.set_attr(node, "lang", &self.languages.target);
            self.changed_langs.push(node.clone());
        }

        let mut names = vec!["title"];
        match tag {
            "img" => names.push("alt"),
            "input" | "textarea" => names.push("placeholder"),
            _ => {}
        }
        if tag == "input" {
            let input_type = self.tree.attr(node, "type").unwrap_or_default();
            if constants::BUTTON_TYPES.contains(&input_type.to_lowercase().as_str()) {
                names.push("value");
            }
        }

        for name in names {
            if self.tree.attr(node, name).is_some() {
                self.add_chunk(vec![Entry::Attr(node.clone(), name.to_string())]);
            }
        }
    }

    /// 同源内嵌文档作为新的根遍历；不可访问时静默跳过
    fn visit_frame(&mut self, node: &T::Node) {
        let blank = self
            .tree
            .attr(node, "src")
            .map_or(true, |src| src.is_empty() || src.to_lowercase().contains("about:blank"));
        if !blank {
            return;
        }

        match self.tree.frame_body(node) {
            Ok(Some(body)) => {
                let rest = self.visit(&body, Vec::new(), true);
                self.add_chunk(rest);
            }
            Ok(None) => {}
            Err(e) => debug!("跳过内嵌文档: {}", e),
        }
    }

    /// 把累加器按边界切成叶子块
    fn add_chunk(&mut self, entries: Vec<Entry<T::Node>>) {
        for segment in entries.split(|entry| matches!(entry, Entry::Boundary)) {
            let mut spans = Vec::new();
            let mut text_len = 0;
            let mut textual = false;
            let mut dirty = false;

            for piece in self.pieces(segment) {
                if is_blank(&piece.value) {
                    continue;
                }
                let normalized = if piece.collapse {
                    normalize_spaces(&piece.value)
                } else {
                    piece.value.clone()
                };

                let reused = self
                    .dictionary
                    .lookup(&normalized, &piece.unit)
                    .or_else(|| self.dictionary.lookup(&piece.value, &piece.unit))
                    .cloned();
                let span = match reused {
                    Some(span) => {
                        self.stats.spans_reused += 1;
                        span
                    }
                    None => {
                        dirty = true;
                        self.stats.spans_created += 1;
                        Span::new(piece.unit, normalized)
                    }
                };

                text_len += span.len();
                textual |= has_text(&span.text);
                spans.push(span);
            }

            if textual {
                self.chunks.push(LeafChunk::new(spans));
                self.source_len += text_len;
                self.dirty |= dirty;
            }
        }
    }

    /// 读取单元的当前值；行合并模式下把 `br` 两侧的文本合成一个单元
    fn pieces(&self, segment: &[Entry<T::Node>]) -> Vec<Piece<T::Node>> {
        let mut pieces: Vec<Piece<T::Node>> = Vec::new();
        let mut entries = segment.iter();

        while let Some(entry) = entries.next() {
            match entry {
                Entry::Text(node) => {
                    let value = self.tree.text(node).unwrap_or_default();
                    let collapse = self.tree.parent_tag(node).as_deref() != Some("pre");
                    pieces.push(Piece {
                        unit: Unit::Text(node.clone()),
                        value,
                        collapse,
                    });
                }
                Entry::Attr(node, name) => {
                    let value = self.tree.attr(node, name).unwrap_or_default();
                    pieces.push(Piece {
                        unit: Unit::Attr {
                            node: node.clone(),
                            name: name.clone(),
                        },
                        value,
                        collapse: false,
                    });
                }
                Entry::LineBreak => {
                    // 只合并 br 两侧都是文本的情况
                    let next = match entries.clone().next() {
                        Some(Entry::Text(node)) => node.clone(),
                        _ => continue,
                    };
                    let Some(last) = pieces.pop() else {
                        continue;
                    };
                    entries.next();
                    pieces.push(self.merge_lines(last, &next));
                }
                Entry::Boundary => {}
            }
        }

        pieces
    }

    fn merge_lines(&self, last: Piece<T::Node>, next: &T::Node) -> Piece<T::Node> {
        let next_value = self.tree.text(next).unwrap_or_default();

        let (mut nodes, mut originals, mut value) = match last.unit {
            Unit::Merged { nodes, originals } => (nodes, originals, last.value),
            Unit::Text(node) => (vec![node], vec![last.value.clone()], last.value),
            other => {
                // 属性单元不会与 br 相邻
                return Piece {
                    unit: other,
                    value: last.value,
                    collapse: false,
                };
            }
        };

        if value.ends_with('-') {
            value.pop();
        } else {
            value.push(' ');
        }
        value.push_str(&next_value);
        nodes.push(next.clone());
        originals.push(next_value);

        Piece {
            unit: Unit::Merged { nodes, originals },
            value,
            collapse: false,
        }
    }
}

/// 文档是否由 PDF 转换而来（`<meta name="generator" content="yandex-pdf2html...">`）
pub fn is_converted_pdf<T: DocumentTree>(tree: &T) -> bool {
    fn search<T: DocumentTree>(tree: &T, node: &T::Node) -> bool {
        if tree.tag_name(node).as_deref() == Some("meta")
            && tree.attr(node, "name").as_deref() == Some("generator")
        {
            return tree
                .attr(node, "content")
                .map_or(false, |content| content.starts_with(constants::PDF_GENERATOR_PREFIX));
        }
        tree.children(node).iter().any(|child| search(tree, child))
    }

    tree.root().map_or(false, |root| search(tree, &root))
}
