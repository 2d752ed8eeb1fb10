//! 片段与块
//!
//! 片段（[`Span`]）是一个写入目标及其原文、译文；块是一次送翻译的单位。
//! 叶子块直接由片段组成；复合块包裹一个无法拆成新节点的超长片段，
//! 其子块是脱离文档的合成片段，全部译完后再拼接写回真实单元。

use crate::translation::core::realign::AlignmentPair;
use crate::translation::core::tree::Unit;

/// 片段
#[derive(Debug, Clone)]
pub struct Span<N> {
    pub unit: Unit<N>,
    /// 原文
    pub text: String,
    pub translated: Option<String>,
}

impl<N> Span<N> {
    pub fn new(unit: Unit<N>, text: impl Into<String>) -> Self {
        Self {
            unit,
            text: text.into(),
            translated: None,
        }
    }

    /// 原文长度（字符数）
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn is_translated(&self) -> bool {
        self.translated.is_some()
    }

    /// 当前显示在文档中的文本
    pub fn displayed_text(&self) -> &str {
        self.translated.as_deref().unwrap_or(&self.text)
    }
}

/// 叶子块
#[derive(Debug, Clone)]
pub struct LeafChunk<N> {
    pub spans: Vec<Span<N>>,
    /// 整块译文
    pub translated: Option<String>,
    pub alignment: Vec<AlignmentPair>,
}

impl<N> LeafChunk<N> {
    pub fn new(spans: Vec<Span<N>>) -> Self {
        Self {
            spans,
            translated: None,
            alignment: Vec::new(),
        }
    }

    pub fn text_len(&self) -> usize {
        self.spans.iter().map(Span::len).sum()
    }

    pub fn is_translated(&self) -> bool {
        self.spans.iter().all(Span::is_translated)
    }

    /// 各片段原文，即请求中的一个块
    pub fn span_texts(&self) -> Vec<String> {
        self.spans.iter().map(|s| s.text.clone()).collect()
    }

    pub fn source_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// 首个片段的长度，用于识别无法拆分的超长单元
    pub fn first_span_len(&self) -> usize {
        self.spans.first().map_or(0, Span::len)
    }
}

/// 复合块
#[derive(Debug, Clone)]
pub struct CompositeChunk<N> {
    /// 真实单元
    pub placeholder: Span<N>,
    pub children: Vec<LeafChunk<N>>,
    /// 子块领取游标
    pub cursor: usize,
}

impl<N> CompositeChunk<N> {
    pub fn new(placeholder: Span<N>, children: Vec<LeafChunk<N>>) -> Self {
        Self {
            placeholder,
            children,
            cursor: 0,
        }
    }

    /// 子块译文按顺序拼接，未译的子块用原文
    pub fn joined_translation(&self) -> String {
        self.children
            .iter()
            .flat_map(|child| child.spans.iter())
            .map(Span::displayed_text)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub enum Chunk<N> {
    Leaf(LeafChunk<N>),
    Composite(CompositeChunk<N>),
}

impl<N> Chunk<N> {
    pub fn text_len(&self) -> usize {
        match self {
            Chunk::Leaf(leaf) => leaf.text_len(),
            Chunk::Composite(composite) => composite.placeholder.len(),
        }
    }

    pub fn is_translated(&self) -> bool {
        match self {
            Chunk::Leaf(leaf) => leaf.is_translated(),
            Chunk::Composite(composite) => composite.placeholder.is_translated(),
        }
    }

    /// 直接写入文档的片段：叶子块的全部片段，或复合块的真实单元
    pub fn document_spans(&self) -> Vec<&Span<N>> {
        match self {
            Chunk::Leaf(leaf) => leaf.spans.iter().collect(),
            Chunk::Composite(composite) => vec![&composite.placeholder],
        }
    }
}
