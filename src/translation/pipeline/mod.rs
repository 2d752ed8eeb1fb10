//! 文档模型管道
//!
//! 遍历文档树收集块，按差异字典复用已有译文，再按长度上限切分

pub mod breaker;
pub mod chunk;
pub mod collector;
pub mod dictionary;
pub mod filters;
pub mod limiter;

// 重新导出主要类型
pub use breaker::{TextBreaker, WordBreaker};
pub use chunk::{Chunk, CompositeChunk, LeafChunk, Span};
pub use collector::{is_converted_pdf, BuildOutput, BuildStats, ChunkBuilder};
pub use dictionary::DiffDictionary;
pub use filters::{has_text, normalize_spaces};
pub use limiter::SegmentationLimiter;
