// 集成测试公共模块
//
// 提供HTML辅助工具、脚本化的传输实现和记录用的监听器

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures::future::{self, FutureExt, LocalBoxFuture};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use pagetrans::html::{find_nodes, html_to_dom, serialize_document, RcDomTree};
use pagetrans::translation::core::{PresentedChunk, TranslatedBlock, TranslationRequest};
use pagetrans::translation::core::{Presenter, SessionListener, SessionState, Transport};
use pagetrans::translation::error::{helpers, TranslationError, TranslationResult};
use pagetrans::translation::pipeline::Chunk;
use pagetrans::translation::{Model, TranslationConfig};

/// HTML测试辅助工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").expect("test html should parse")
    }

    pub fn serialize(dom: &RcDom) -> String {
        String::from_utf8(serialize_document(dom, "").expect("serialize")).expect("utf-8")
    }

    pub fn tree(dom: &RcDom) -> RcDomTree {
        RcDomTree::new(dom)
    }

    pub fn body(dom: &RcDom) -> Handle {
        find_nodes(&dom.document, vec!["html", "body"])
            .into_iter()
            .next()
            .expect("document has a body")
    }

    /// 文档中所有文本节点按顺序拼接
    pub fn text_content(node: &Handle) -> String {
        let mut out = String::new();
        if let NodeData::Text { contents } = &node.data {
            out.push_str(&contents.borrow());
        }
        for child in node.children.borrow().iter() {
            out.push_str(&Self::text_content(child));
        }
        out
    }

    /// 把一段HTML片段解析后追加到 `body` 末尾
    pub fn append_to_body(dom: &RcDom, fragment: &str) {
        let source = Self::create_test_dom(fragment);
        let body = Self::body(dom);
        let moved: Vec<Handle> = Self::body(&source).children.borrow_mut().drain(..).collect();
        for node in moved {
            node.parent.set(Some(Rc::downgrade(&body)));
            body.children.borrow_mut().push(node);
        }
    }

    pub fn create_simple_english_page() -> String {
        concat!(
            "<!DOCTYPE html><html lang=\"en\"><head><title>Test Page</title></head>",
            "<body><h1>Welcome to Test</h1>",
            "<p>This is a test paragraph with <a href=\"/x\">a link</a> inside.</p>",
            "<p>Second paragraph.</p>",
            "<img src=\"a.png\" alt=\"A picture\">",
            "</body></html>"
        )
        .to_string()
    }

    /// 每段一个块，便于制造多个批次
    pub fn create_paragraph_page(count: usize) -> String {
        let paragraphs: String = (0..count)
            .map(|i| format!("<p>Paragraph number {}</p>", i + 1))
            .collect();
        format!("<html><body>{}</body></html>", paragraphs)
    }
}

/// 模型中各叶子块的片段原文；复合块给出真实单元的原文
pub fn block_texts<N>(model: &Model<N>) -> Vec<Vec<String>> {
    model
        .chunks
        .iter()
        .map(|chunk| match chunk {
            Chunk::Leaf(leaf) => leaf.span_texts(),
            Chunk::Composite(composite) => vec![composite.placeholder.text.clone()],
        })
        .collect()
}

/// 测试用配置：较短的延时，默认语言对 en-fr
pub fn test_config() -> TranslationConfig {
    TranslationConfig {
        start_delay_ms: 50,
        idle_interval_ms: 50,
        request_timeout_secs: 5,
        ..TranslationConfig::default()
    }
}

/// 默认译法：`目标语言:大写原文`
pub fn tag_upper(target: &str, text: &str) -> String {
    format!("{}:{}", target, text.to_uppercase())
}

/// 只做大写转换的译法，长度不变
pub fn upper(_target: &str, text: &str) -> String {
    text.to_uppercase()
}

type Translator = Rc<dyn Fn(&str, &str) -> String>;

/// 脚本化的传输：记录请求，按给定译法立即返回，可配置前若干次失败
#[derive(Clone)]
pub struct ScriptedTransport {
    requests: Rc<RefCell<Vec<TranslationRequest>>>,
    failures_left: Rc<Cell<u32>>,
    translator: Translator,
    alignment: bool,
}

impl ScriptedTransport {
    pub fn new(translator: impl Fn(&str, &str) -> String + 'static) -> Self {
        Self {
            requests: Rc::new(RefCell::new(Vec::new())),
            failures_left: Rc::new(Cell::new(0)),
            translator: Rc::new(translator),
            alignment: false,
        }
    }

    pub fn uppercase() -> Self {
        Self::new(upper)
    }

    /// 永远失败
    pub fn failing() -> Self {
        let transport = Self::new(upper);
        transport.failures_left.set(u32::MAX);
        transport
    }

    /// 前 `n` 次请求失败
    pub fn failing_first(n: u32) -> Self {
        let transport = Self::new(upper);
        transport.failures_left.set(n);
        transport
    }

    /// 请求对齐时为每段返回整段对齐
    pub fn with_alignment(mut self) -> Self {
        self.alignment = true;
        self
    }

    pub fn requests(&self) -> Vec<TranslationRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn boxed(&self) -> Box<dyn Transport> {
        Box::new(self.clone())
    }
}

impl Transport for ScriptedTransport {
    fn submit(
        &self,
        request: TranslationRequest,
    ) -> LocalBoxFuture<'static, TranslationResult<Vec<TranslatedBlock>>> {
        self.requests.borrow_mut().push(request.clone());

        let left = self.failures_left.get();
        if left > 0 {
            if left != u32::MAX {
                self.failures_left.set(left - 1);
            }
            return future::ready(Err(helpers::transport_error("scripted failure"))).boxed_local();
        }

        let blocks = request
            .blocks
            .iter()
            .map(|spans| {
                let segments: Vec<String> = spans
                    .iter()
                    .map(|span| (self.translator)(&request.target_lang, span))
                    .collect();
                let mut block = TranslatedBlock::new(segments);
                if self.alignment && request.with_alignment {
                    let source: usize = spans.iter().map(|s| s.chars().count()).sum();
                    let target: usize = block.segments.iter().map(|s| s.chars().count()).sum();
                    block.alignment = Some(format!("0:{}-0:{}", source, target));
                }
                block
            })
            .collect();
        future::ready(Ok(blocks)).boxed_local()
    }
}

/// 返回固定分段的传输，用于测试分段数与片段数不一致时的重排
pub struct FixedTransport {
    pub segments: Vec<String>,
}

impl Transport for FixedTransport {
    fn submit(
        &self,
        request: TranslationRequest,
    ) -> LocalBoxFuture<'static, TranslationResult<Vec<TranslatedBlock>>> {
        let blocks = request
            .blocks
            .iter()
            .map(|_| TranslatedBlock::new(self.segments.clone()))
            .collect();
        future::ready(Ok(blocks)).boxed_local()
    }
}

/// 总是以不可重试的输入错误拒绝请求
pub struct RejectingTransport {
    pub requests: Rc<Cell<usize>>,
}

impl RejectingTransport {
    pub fn new() -> Self {
        Self {
            requests: Rc::new(Cell::new(0)),
        }
    }
}

impl Transport for RejectingTransport {
    fn submit(
        &self,
        _request: TranslationRequest,
    ) -> LocalBoxFuture<'static, TranslationResult<Vec<TranslatedBlock>>> {
        self.requests.set(self.requests.get() + 1);
        future::ready(Err(helpers::validation_error("unsupported language pair"))).boxed_local()
    }
}

/// 永不返回的传输，用于超时测试
pub struct StalledTransport;

impl Transport for StalledTransport {
    fn submit(
        &self,
        _request: TranslationRequest,
    ) -> LocalBoxFuture<'static, TranslationResult<Vec<TranslatedBlock>>> {
        future::pending().boxed_local()
    }
}

/// 记录监听器收到的事件
#[derive(Clone, Default)]
pub struct RecordingListener {
    pub progress: Rc<RefCell<Vec<u32>>>,
    pub states: Rc<RefCell<Vec<SessionState>>>,
    pub errors: Rc<RefCell<Vec<String>>>,
}

impl RecordingListener {
    pub fn boxed(&self) -> Box<dyn SessionListener> {
        Box::new(self.clone())
    }

    pub fn last_progress(&self) -> Option<u32> {
        self.progress.borrow().last().copied()
    }

    pub fn error_count(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn saw_state(&self, state: SessionState) -> bool {
        self.states.borrow().contains(&state)
    }
}

impl SessionListener for RecordingListener {
    fn on_progress(&mut self, percent: u32) {
        self.progress.borrow_mut().push(percent);
    }

    fn on_state_changed(&mut self, state: SessionState) {
        self.states.borrow_mut().push(state);
    }

    fn on_error(&mut self, error: &TranslationError) {
        self.errors.borrow_mut().push(error.to_string());
    }
}

/// 记录伴随展示的内容
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    pub calls: Rc<RefCell<Vec<(String, Vec<PresentedChunk>)>>>,
}

impl RecordingPresenter {
    pub fn boxed(&self) -> Box<dyn Presenter> {
        Box::new(self.clone())
    }
}

impl Presenter for RecordingPresenter {
    fn present(&mut self, source_lang: &str, chunks: Vec<PresentedChunk>) {
        self.calls.borrow_mut().push((source_lang.to_string(), chunks));
    }
}

/// 测试断言辅助工具
pub struct AssertionHelper;

impl AssertionHelper {
    /// 每个请求块的总长度都不超过上限
    pub fn assert_blocks_within(requests: &[TranslationRequest], max_len: usize) {
        for request in requests {
            for block in &request.blocks {
                let len: usize = block.iter().map(|s| s.chars().count()).sum();
                assert!(
                    len <= max_len,
                    "request {} has a block of {} chars (limit {})",
                    request.id,
                    len,
                    max_len
                );
            }
        }
    }
}

pub const SHORT_TIMEOUT: Duration = Duration::from_millis(200);
