//! 翻译传输接口
//!
//! 会话只通过 [`Transport`] 发送请求。返回的 future 不要求 `Send`，
//! 由会话在单线程上轮询。

use std::fmt;

use futures::future::LocalBoxFuture;

use crate::translation::error::TranslationResult;

/// 请求标识，形如 `"{session}-{seq}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId {
    pub session: String,
    pub seq: u64,
}

impl RequestId {
    pub fn new(session: impl Into<String>, seq: u64) -> Self {
        Self {
            session: session.into(),
            seq,
        }
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session, self.seq)
    }
}

/// 一次翻译请求
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub id: RequestId,
    /// 发出请求时的会话代次
    pub generation: u64,
    pub source_lang: String,
    pub target_lang: String,
    /// 服务标识（`srv` 字段）
    pub service: String,
    /// 是否请求对齐信息
    pub with_alignment: bool,
    /// 每个元素是一个叶子块的片段原文
    pub blocks: Vec<Vec<String>>,
}

impl TranslationRequest {
    /// 语言对，形如 `en-fr`
    pub fn lang_pair(&self) -> String {
        format!("{}-{}", self.source_lang, self.target_lang)
    }

    pub fn text_len(&self) -> usize {
        self.blocks
            .iter()
            .flatten()
            .map(|s| s.chars().count())
            .sum()
    }
}

/// 一个块的译文
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslatedBlock {
    /// 译文分段，正常情况下与请求块的片段一一对应
    pub segments: Vec<String>,
    /// 对齐串 `"s:l-t:l;..."`
    pub alignment: Option<String>,
}

impl TranslatedBlock {
    pub fn new(segments: Vec<String>) -> Self {
        Self {
            segments,
            alignment: None,
        }
    }

    /// 原样回填，用于无法拆分的超长单元
    pub fn identity(sources: &[String]) -> Self {
        Self::new(sources.to_vec())
    }
}

/// 翻译传输能力
pub trait Transport {
    /// 发送请求，返回的 future 完成时给出与 `request.blocks` 等长的译文块
    fn submit(
        &self,
        request: TranslationRequest,
    ) -> LocalBoxFuture<'static, TranslationResult<Vec<TranslatedBlock>>>;
}
