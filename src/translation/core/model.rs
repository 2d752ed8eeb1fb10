//! 文档模型快照
//!
//! 每次翻译或增量重建生成一个新快照。快照持有有序块列表、长度统计和
//! 领取游标；工作者在快照上同步领取批次，响应到达后把译文写回文档。

use std::fmt::Debug;
use std::hash::Hash;

use tracing::debug;

use super::languages::LanguagePair;
use super::realign::{parse_alignment, split_text, AlignmentPair};
use super::transport::TranslatedBlock;
use super::tree::DocumentTree;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::pipeline::{
    Chunk, ChunkBuilder, DiffDictionary, LeafChunk, SegmentationLimiter, Span, TextBreaker,
};

/// 领取位置：主列表，或某个复合块的子块
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Main,
    Composite(usize),
}

/// 一次领取到的批次
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub source: Source,
    /// 首个块在所属列表中的下标
    pub start: usize,
    pub blocks: Vec<Vec<String>>,
    /// 首个片段的长度
    pub first_span_len: usize,
}

/// 领取结果
#[derive(Debug, Clone, PartialEq)]
pub enum Claim {
    Batch(Batch),
    /// 游标处是复合块，已独占，接着领取其子块
    Descend(usize),
    /// 当前列表已无可领取的块
    Exhausted,
}

/// 校验后的译文块
#[derive(Debug, Clone)]
pub struct PreparedBlock {
    pub block: TranslatedBlock,
    pub alignment: Vec<AlignmentPair>,
}

/// 伴随展示的一个块
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedChunk {
    pub index: usize,
    pub sources: Vec<String>,
    pub translated: String,
    pub alignment: Vec<AlignmentPair>,
}

#[derive(Debug, Clone, Copy)]
pub struct ModelOptions {
    pub max_block_len: usize,
    pub line_merge: bool,
}

/// 领取时需要的块信息
trait Claimable {
    type Node;

    fn text_len(&self) -> usize;
    fn is_translated(&self) -> bool;
    fn as_leaf(&self) -> Option<&LeafChunk<Self::Node>>;
}

impl<N> Claimable for LeafChunk<N> {
    type Node = N;

    fn text_len(&self) -> usize {
        LeafChunk::text_len(self)
    }

    fn is_translated(&self) -> bool {
        LeafChunk::is_translated(self)
    }

    fn as_leaf(&self) -> Option<&LeafChunk<N>> {
        Some(self)
    }
}

impl<N> Claimable for Chunk<N> {
    type Node = N;

    fn text_len(&self) -> usize {
        Chunk::text_len(self)
    }

    fn is_translated(&self) -> bool {
        Chunk::is_translated(self)
    }

    fn as_leaf(&self) -> Option<&LeafChunk<N>> {
        match self {
            Chunk::Leaf(leaf) => Some(leaf),
            Chunk::Composite(_) => None,
        }
    }
}

enum Scan {
    Leaves {
        start: usize,
        blocks: Vec<Vec<String>>,
        first_span_len: usize,
    },
    Composite(usize),
}

/// 从游标处领取：先跳过已译的块并计入进度，再收集至多 `max_items` 个叶子块，
/// 在会使总长超限的块（首块除外）、已译块或复合块之前停下
fn scan<C: Claimable>(
    items: &[C],
    cursor: &mut usize,
    credited: &mut usize,
    max_items: usize,
    max_len: usize,
) -> Scan {
    let mut i = *cursor;
    while i < items.len() && items[i].is_translated() {
        *credited += items[i].text_len();
        i += 1;
    }

    let start = i;
    let mut blocks = Vec::new();
    let mut first_span_len = 0;
    let mut total = 0;
    while i < items.len() && blocks.len() < max_items {
        let Some(leaf) = items[i].as_leaf() else {
            if i == start {
                *cursor = i + 1;
                return Scan::Composite(i);
            }
            break;
        };

        total += leaf.text_len();
        if (i > start && total > max_len) || leaf.is_translated() {
            break;
        }
        if i == start {
            first_span_len = leaf.first_span_len();
        }
        blocks.push(leaf.span_texts());
        i += 1;
    }

    *cursor = i;
    Scan::Leaves {
        start,
        blocks,
        first_span_len,
    }
}

/// 文档模型快照
#[derive(Debug, Clone)]
pub struct Model<N> {
    pub chunks: Vec<Chunk<N>>,
    pub source_len: usize,
    pub translated_len: usize,
    pub cursor: usize,
    /// `lang` 属性被改写的元素，撤销时恢复
    pub changed_langs: Vec<N>,
    languages: LanguagePair,
}

impl<N: Clone + Eq + Hash + Debug> Model<N> {
    /// 遍历文档生成快照，返回快照及其相对 `previous` 是否有新内容。
    ///
    /// `previous` 的语言对相同时复用其译文；不同时只复用片段原文。
    /// 文档没有根元素时返回 [`TranslationError::AccessDenied`]。
    pub fn build<T>(
        tree: &T,
        languages: LanguagePair,
        previous: Option<&Model<N>>,
        breaker: &dyn TextBreaker,
        options: ModelOptions,
    ) -> TranslationResult<(Self, bool)>
    where
        T: DocumentTree<Node = N>,
    {
        let root = tree
            .root()
            .ok_or_else(|| TranslationError::AccessDenied("文档没有根元素".to_string()))?;

        let dictionary = match previous {
            Some(model) => DiffDictionary::index(&model.chunks, model.languages == languages),
            None => DiffDictionary::default(),
        };

        let output =
            ChunkBuilder::new(tree, &languages, &dictionary, options.line_merge).build(&root);
        let chunks =
            SegmentationLimiter::new(options.max_block_len, breaker).apply(tree, output.chunks);

        let mut changed_langs = previous.map(|m| m.changed_langs.clone()).unwrap_or_default();
        for node in output.changed_langs {
            if !changed_langs.contains(&node) {
                changed_langs.push(node);
            }
        }

        debug!(
            "模型构建完成: {} 个块, 原文 {} 个字符, 有新内容: {}",
            chunks.len(),
            output.source_len,
            output.dirty
        );

        let model = Self {
            chunks,
            source_len: output.source_len,
            translated_len: 0,
            cursor: 0,
            changed_langs,
            languages,
        };
        Ok((model, output.dirty))
    }

    pub fn languages(&self) -> &LanguagePair {
        &self.languages
    }

    /// 进度百分比，四舍五入
    pub fn progress(&self) -> u32 {
        if self.source_len == 0 {
            return 100;
        }
        (self.translated_len as f64 * 100.0 / self.source_len as f64 + 0.5).floor() as u32
    }

    fn credit(&mut self, len: usize) {
        self.translated_len = (self.translated_len + len).min(self.source_len);
    }

    /// 在 `source` 上领取下一个批次
    pub fn claim(&mut self, source: Source, max_items: usize, max_len: usize) -> Claim {
        let mut credited = 0;
        let scanned = match source {
            Source::Main => scan(&self.chunks, &mut self.cursor, &mut credited, max_items, max_len),
            Source::Composite(index) => match self.chunks.get_mut(index) {
                Some(Chunk::Composite(composite)) => scan(
                    &composite.children,
                    &mut composite.cursor,
                    &mut credited,
                    max_items,
                    max_len,
                ),
                _ => return Claim::Exhausted,
            },
        };
        self.credit(credited);

        match scanned {
            Scan::Composite(index) => {
                if let Some(Chunk::Composite(composite)) = self.chunks.get_mut(index) {
                    composite.cursor = 0;
                }
                Claim::Descend(index)
            }
            Scan::Leaves { blocks, .. } if blocks.is_empty() => Claim::Exhausted,
            Scan::Leaves {
                start,
                blocks,
                first_span_len,
            } => Claim::Batch(Batch {
                source,
                start,
                blocks,
                first_span_len,
            }),
        }
    }

    fn leaf_at(&self, source: Source, index: usize) -> Option<&LeafChunk<N>> {
        match source {
            Source::Main => match self.chunks.get(index) {
                Some(Chunk::Leaf(leaf)) => Some(leaf),
                _ => None,
            },
            Source::Composite(parent) => match self.chunks.get(parent) {
                Some(Chunk::Composite(composite)) => composite.children.get(index),
                _ => None,
            },
        }
    }

    fn leaf_at_mut(&mut self, source: Source, index: usize) -> Option<&mut LeafChunk<N>> {
        match source {
            Source::Main => match self.chunks.get_mut(index) {
                Some(Chunk::Leaf(leaf)) => Some(leaf),
                _ => None,
            },
            Source::Composite(parent) => match self.chunks.get_mut(parent) {
                Some(Chunk::Composite(composite)) => composite.children.get_mut(index),
                _ => None,
            },
        }
    }

    /// 校验响应：块数与请求一致，且每个块都对应一个叶子块，对齐串可解析
    pub fn prepare(
        &self,
        source: Source,
        start: usize,
        expected: usize,
        blocks: Vec<TranslatedBlock>,
    ) -> TranslationResult<Vec<PreparedBlock>> {
        if blocks.len() != expected {
            return Err(helpers::malformed(format!(
                "期望 {} 个译文块，实际 {} 个",
                expected,
                blocks.len()
            )));
        }

        blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                if self.leaf_at(source, start + i).is_none() {
                    return Err(helpers::malformed(format!("译文块 {} 没有对应的块", start + i)));
                }
                let alignment = match block.alignment.as_deref() {
                    Some(align) => parse_alignment(align)?,
                    None => Vec::new(),
                };
                Ok(PreparedBlock { block, alignment })
            })
            .collect()
    }

    /// 写入一批译文并计入进度。复合块的子块全部完成后，拼接结果写回真实单元。
    pub fn set_translation<T>(
        &mut self,
        tree: &T,
        source: Source,
        start: usize,
        prepared: Vec<PreparedBlock>,
    ) where
        T: DocumentTree<Node = N>,
    {
        let mut credited = 0;
        for (i, PreparedBlock { block, alignment }) in prepared.into_iter().enumerate() {
            let Some(leaf) = self.leaf_at_mut(source, start + i) else {
                continue;
            };
            write_leaf(tree, leaf, block, alignment);
            credited += leaf.text_len();
        }
        self.credit(credited);

        if let Source::Composite(parent) = source {
            if let Some(Chunk::Composite(composite)) = self.chunks.get_mut(parent) {
                if composite.cursor >= composite.children.len() {
                    let joined = composite.joined_translation();
                    composite.placeholder.unit.write(tree, &joined);
                    composite.placeholder.translated = Some(joined);
                }
            }
        }
    }

    /// 恢复原文与 `lang` 属性
    pub fn undo<T>(&self, tree: &T)
    where
        T: DocumentTree<Node = N>,
    {
        for chunk in &self.chunks {
            for span in chunk.document_spans() {
                span.unit.restore(tree, &span.text);
            }
        }
        for node in &self.changed_langs {
            tree.set_attr(node, "lang", &self.languages.source);
        }
    }

    /// 已译块，按文档顺序
    pub fn presented_chunks(&self) -> Vec<PresentedChunk> {
        self.chunks
            .iter()
            .enumerate()
            .filter_map(|(index, chunk)| match chunk {
                Chunk::Leaf(leaf) => leaf.translated.as_ref().map(|translated| PresentedChunk {
                    index,
                    sources: leaf.span_texts(),
                    translated: translated.clone(),
                    alignment: leaf.alignment.clone(),
                }),
                Chunk::Composite(composite) => {
                    composite
                        .placeholder
                        .translated
                        .as_ref()
                        .map(|translated| PresentedChunk {
                            index,
                            sources: vec![composite.placeholder.text.clone()],
                            translated: translated.clone(),
                            alignment: Vec::new(),
                        })
                }
            })
            .collect()
    }
}

/// 把一个块的译文分配到各片段：分段数与片段数一致时一一对应，否则按比例重排
fn write_leaf<T: DocumentTree>(
    tree: &T,
    leaf: &mut LeafChunk<T::Node>,
    block: TranslatedBlock,
    alignment: Vec<AlignmentPair>,
) {
    let joined = block.segments.concat();
    let pieces = if block.segments.len() == leaf.spans.len() {
        block.segments
    } else {
        let lengths: Vec<usize> = leaf.spans.iter().map(Span::len).collect();
        split_text(&joined, &lengths)
    };

    for (span, piece) in leaf.spans.iter_mut().zip(pieces) {
        span.unit.write(tree, &piece);
        span.translated = Some(piece);
    }
    leaf.translated = Some(joined);
    leaf.alignment = alignment;
}
