//! 翻译核心
//!
//! 文档树接口、模型快照、译文重排与翻译会话

pub mod languages;
pub mod model;
pub mod realign;
pub mod session;
pub mod transport;
pub mod tree;

pub use languages::{LanguagePair, TextDirection};
pub use model::{Model, ModelOptions, PresentedChunk, Source};
pub use realign::{parse_alignment, split_text, AlignmentPair};
pub use session::{
    DocumentEvent, NoopListener, Presenter, Session, SessionListener, SessionState,
};
pub use transport::{RequestId, TranslatedBlock, TranslationRequest, Transport};
pub use tree::{DocumentTree, NodeKind, Unit};
