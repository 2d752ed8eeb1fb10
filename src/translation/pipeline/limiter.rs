//! 长度限制
//!
//! 保证送出的每个块总长不超过 `max_block_len`。超长块在片段之间拆开；
//! 单个片段超长时按词切分，文本节点换成多个新节点，其他单元转成复合块。

use std::collections::VecDeque;

use tracing::{debug, warn};

use super::breaker::TextBreaker;
use super::chunk::{Chunk, CompositeChunk, LeafChunk, Span};
use crate::translation::core::tree::{DocumentTree, Unit};

pub struct SegmentationLimiter<'a> {
    max_len: usize,
    breaker: &'a dyn TextBreaker,
}

impl<'a> SegmentationLimiter<'a> {
    pub fn new(max_len: usize, breaker: &'a dyn TextBreaker) -> Self {
        Self { max_len, breaker }
    }

    /// 按顺序处理所有叶子块，输出顺序与原文顺序一致
    pub fn apply<T: DocumentTree>(
        &self,
        tree: &T,
        leaves: Vec<LeafChunk<T::Node>>,
    ) -> Vec<Chunk<T::Node>> {
        let mut queue: VecDeque<LeafChunk<T::Node>> = leaves.into();
        let mut chunks = Vec::with_capacity(queue.len());

        while let Some(mut leaf) = queue.pop_front() {
            match self.overflow_index(&leaf) {
                None => chunks.push(Chunk::Leaf(leaf)),
                Some(j) if j > 0 => {
                    let rest = leaf.spans.split_off(j);
                    chunks.push(Chunk::Leaf(leaf));
                    queue.push_front(LeafChunk::new(rest));
                }
                Some(_) => {
                    let rest = leaf.spans.split_off(1);
                    if !rest.is_empty() {
                        queue.push_front(LeafChunk::new(rest));
                    }
                    if let Some(span) = leaf.spans.pop() {
                        self.split_span(tree, span, &mut chunks);
                    }
                }
            }
        }

        chunks
    }

    /// 累计长度第一次超过上限的片段下标
    fn overflow_index<N>(&self, leaf: &LeafChunk<N>) -> Option<usize> {
        let mut total = 0;
        for (j, span) in leaf.spans.iter().enumerate() {
            total += span.len();
            if total > self.max_len {
                return Some(j);
            }
        }
        None
    }

    fn split_span<T: DocumentTree>(
        &self,
        tree: &T,
        span: Span<T::Node>,
        chunks: &mut Vec<Chunk<T::Node>>,
    ) {
        let blocks = self.breaker.break_text(&span.text, self.max_len);

        // 已有译文的单元保持原节点，只有新内容才拆成多个文本节点
        if blocks.len() > 1 && !span.is_translated() {
            if let Unit::Text(node) = &span.unit {
                match tree.replace_text(node, &blocks) {
                    Ok(nodes) => {
                        debug!("文本节点拆分为 {} 段", nodes.len());
                        for (node, block) in nodes.into_iter().zip(blocks) {
                            chunks.push(Chunk::Leaf(LeafChunk::new(vec![Span::new(
                                Unit::Text(node),
                                block,
                            )])));
                        }
                        return;
                    }
                    Err(e) => warn!("文本节点拆分失败，改用复合块: {}", e),
                }
            }
        }

        let children = blocks
            .into_iter()
            .map(|block| LeafChunk::new(vec![Span::new(Unit::Detached, block)]))
            .collect();
        chunks.push(Chunk::Composite(CompositeChunk::new(span, children)));
    }
}
