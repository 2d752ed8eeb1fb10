//! 差异字典
//!
//! 以当前显示文本为键索引上一版模型的片段。重建时文本与单元都相同的
//! 片段被原样复用（连同译文），因此未变化的内容不会再次请求。

use std::collections::HashMap;

use super::chunk::{Chunk, Span};
use crate::translation::core::tree::Unit;

#[derive(Debug, Clone)]
pub struct DiffDictionary<N> {
    entries: HashMap<String, Vec<Span<N>>>,
}

impl<N> Default for DiffDictionary<N> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<N: Clone + PartialEq> DiffDictionary<N> {
    /// 索引上一版的块。`keep_translations` 为假时复用的片段不带译文，
    /// 用于切换目标语言后重新请求。
    pub fn index(chunks: &[Chunk<N>], keep_translations: bool) -> Self {
        let mut entries: HashMap<String, Vec<Span<N>>> = HashMap::new();
        for chunk in chunks {
            for span in chunk.document_spans() {
                if span.unit.is_detached() {
                    continue;
                }
                let mut stored = span.clone();
                if !keep_translations {
                    stored.translated = None;
                }
                entries
                    .entry(span.displayed_text().to_string())
                    .or_default()
                    .push(stored);
            }
        }
        Self { entries }
    }

    /// 查找文本与单元都相同的片段
    pub fn lookup(&self, text: &str, unit: &Unit<N>) -> Option<&Span<N>> {
        self.entries
            .get(text)?
            .iter()
            .find(|span| span.unit.same_unit(unit))
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::pipeline::chunk::LeafChunk;

    fn translated(unit: Unit<u32>, text: &str, tr: &str) -> Span<u32> {
        let mut span = Span::new(unit, text);
        span.translated = Some(tr.to_string());
        span
    }

    #[test]
    fn test_lookup_by_displayed_text_and_unit() {
        let chunks = vec![Chunk::Leaf(LeafChunk::new(vec![
            translated(Unit::Text(1), "Hello", "Bonjour"),
            Span::new(Unit::Text(2), "Hello"),
        ]))];
        let dictionary = DiffDictionary::index(&chunks, true);

        let reused = dictionary.lookup("Bonjour", &Unit::Text(1)).unwrap();
        assert_eq!(reused.text, "Hello");
        assert_eq!(reused.translated.as_deref(), Some("Bonjour"));

        assert!(dictionary.lookup("Hello", &Unit::Text(2)).is_some());
        // 同一文本，不同节点
        assert!(dictionary.lookup("Hello", &Unit::Text(3)).is_none());
        assert!(dictionary.lookup("Hello", &Unit::Text(1)).is_none());
    }

    #[test]
    fn test_forget_translations() {
        let chunks = vec![Chunk::Leaf(LeafChunk::new(vec![translated(
            Unit::Text(1),
            "Hello",
            "Bonjour",
        )]))];
        let dictionary = DiffDictionary::index(&chunks, false);

        let reused = dictionary.lookup("Bonjour", &Unit::Text(1)).unwrap();
        assert_eq!(reused.text, "Hello");
        assert!(reused.translated.is_none());
    }

    #[test]
    fn test_detached_units_are_not_indexed() {
        let chunks = vec![Chunk::Leaf(LeafChunk::new(vec![Span::new(
            Unit::<u32>::Detached,
            "piece",
        )]))];
        let dictionary = DiffDictionary::index(&chunks, true);
        assert!(dictionary.is_empty());
        assert!(dictionary.lookup("piece", &Unit::Detached).is_none());
    }
}
