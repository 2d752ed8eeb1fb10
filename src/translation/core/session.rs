//! 翻译会话
//!
//! 会话是文档生命周期内的状态机：管理代次、工作者、错误预算，发布进度与状态。
//!
//! 所有请求的 future 保存在会话自己的 `FuturesUnordered` 中，在单线程上轮询；
//! 领取批次是同步的，不跨越 await。每个响应都先经过 [`Session::handle_completion`]
//! 的代次检查，过期代次的响应直接丢弃，这是唯一的取消机制。

use std::collections::HashMap;
use std::fmt;

use futures::future::{self, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

use super::languages::LanguagePair;
use super::model::{Batch, Claim, Model, ModelOptions, PresentedChunk, Source};
use super::transport::{RequestId, TranslatedBlock, TranslationRequest, Transport};
use super::tree::DocumentTree;
use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::pipeline::{is_converted_pdf, TextBreaker, WordBreaker};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Init,
    LoadStart,
    LoadEnd,
    TranslateStart,
    TranslateEnd,
    Unload,
    Inaccessible,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Init => "init",
            SessionState::LoadStart => "load-start",
            SessionState::LoadEnd => "load-end",
            SessionState::TranslateStart => "translate-start",
            SessionState::TranslateEnd => "translate-end",
            SessionState::Unload => "unload",
            SessionState::Inaccessible => "inaccessible",
        };
        f.write_str(name)
    }
}

/// 会话事件监听
pub trait SessionListener {
    fn on_progress(&mut self, _percent: u32) {}

    fn on_state_changed(&mut self, _state: SessionState) {}

    /// 每个代次只在第一次请求被放弃时调用
    fn on_error(&mut self, _error: &TranslationError) {}
}

/// 不做任何事的监听器
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopListener;

impl SessionListener for NoopListener {}

/// 伴随展示：翻译结束时收到按文档顺序排列的已译块
pub trait Presenter {
    fn present(&mut self, source_lang: &str, chunks: Vec<PresentedChunk>);
}

/// 宿主文档事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentEvent {
    ContentLoaded,
    Loaded,
    Mutated,
    Unloaded,
}

/// 自适应错误预算：每次失败扣减一次额度，连续成功若干次恢复一次
#[derive(Debug, Clone)]
struct ErrorBudget {
    allowance: i32,
    good: u32,
    initial: i32,
    streak: u32,
}

impl ErrorBudget {
    fn new(initial: i32, streak: u32) -> Self {
        Self {
            allowance: initial,
            good: 0,
            initial,
            streak,
        }
    }

    fn reset(&mut self) {
        self.allowance = self.initial;
        self.good = 0;
    }

    fn record_success(&mut self) {
        self.good += 1;
        if self.good >= self.streak {
            self.good = 0;
            self.allowance += 1;
        }
    }

    /// 先扣减再判断
    fn spend(&mut self) -> bool {
        self.allowance -= 1;
        self.allowance >= 0
    }
}

/// 发出的请求及其写回位置
#[derive(Debug, Clone)]
struct Query {
    request: TranslationRequest,
    source: Source,
    start: usize,
}

struct Completion {
    query: Query,
    outcome: TranslationResult<Vec<TranslatedBlock>>,
}

/// 翻译会话
pub struct Session<T: DocumentTree> {
    id: String,
    tree: T,
    transport: Box<dyn Transport>,
    breaker: Box<dyn TextBreaker>,
    config: TranslationConfig,
    listener: Box<dyn SessionListener>,
    presenter: Option<Box<dyn Presenter>>,

    state: SessionState,
    generation: u64,
    next_seq: u64,
    default_lang: String,
    languages: Option<LanguagePair>,
    background: bool,
    line_merge: bool,

    budget: ErrorBudget,
    failures: HashMap<RequestId, u32>,
    error_count: u32,
    finished_workers: usize,
    dirty: bool,

    model: Option<Model<T::Node>>,
    inflight: FuturesUnordered<LocalBoxFuture<'static, Completion>>,
    pending_start: Option<Instant>,
}

impl<T: DocumentTree> Session<T> {
    /// 创建会话；配置无效（例如工作者数量为 0）时返回错误
    pub fn new(
        id: impl Into<String>,
        tree: T,
        transport: Box<dyn Transport>,
        config: TranslationConfig,
    ) -> TranslationResult<Self> {
        config.validate()?;
        let budget = ErrorBudget::new(config.error_allowance, config.good_streak);
        let default_lang = config.languages();
        Ok(Self {
            id: id.into(),
            tree,
            transport,
            breaker: Box::new(WordBreaker),
            listener: Box::new(NoopListener),
            presenter: None,
            state: SessionState::Init,
            generation: 0,
            next_seq: 0,
            default_lang,
            languages: None,
            background: config.background,
            line_merge: config.line_merge,
            budget,
            failures: HashMap::new(),
            error_count: 0,
            finished_workers: 0,
            dirty: false,
            model: None,
            inflight: FuturesUnordered::new(),
            pending_start: None,
            config,
        })
    }

    /// 替换分词器
    pub fn with_breaker(mut self, breaker: Box<dyn TextBreaker>) -> Self {
        self.breaker = breaker;
        self
    }

    pub fn set_listener(&mut self, listener: Box<dyn SessionListener>) {
        self.listener = listener;
    }

    pub fn set_presenter(&mut self, presenter: Option<Box<dyn Presenter>>) {
        self.presenter = presenter;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn model(&self) -> Option<&Model<T::Node>> {
        self.model.as_ref()
    }

    pub fn languages(&self) -> Option<&LanguagePair> {
        self.languages.as_ref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    pub fn progress(&self) -> u32 {
        self.model.as_ref().map_or(0, Model::progress)
    }

    fn change_state(&mut self, state: SessionState) {
        info!("会话 {} 状态: {} -> {}", self.id, self.state, state);
        self.state = state;
        self.listener.on_state_changed(state);
    }

    /// 新代次：此前发出的请求全部作废
    fn init_translation(&mut self, languages: Option<LanguagePair>) {
        self.generation += 1;
        self.languages = languages;
        self.error_count = 0;
        self.budget.reset();
        self.failures.clear();
        self.finished_workers = 0;
        self.dirty = false;
    }

    // ============================================================================
    // 对外操作
    // ============================================================================

    /// 文档开始加载。`lang` 为默认语言对，`background` 启用增量翻译。
    pub fn start(&mut self, lang: &str, background: bool) {
        self.default_lang = lang.to_string();
        self.background = background;
        self.change_state(SessionState::LoadStart);
    }

    /// 开始翻译，返回是否启动了新的代次。
    ///
    /// 语言对为空或两侧相同时忽略；与当前语言对相同且没有放弃过的请求时也忽略。
    pub fn translate(&mut self, lang: Option<&str>) -> bool {
        let lang = lang.unwrap_or(&self.default_lang).to_string();
        let languages = match LanguagePair::parse(&lang) {
            Some(pair) if !pair.is_identity() => pair,
            _ => {
                debug!("忽略语言对: {:?}", lang);
                return false;
            }
        };
        if self.languages.as_ref() == Some(&languages) && self.error_count == 0 {
            debug!("语言对 {} 已在翻译中", languages);
            return false;
        }

        self.line_merge = self.config.line_merge || is_converted_pdf(&self.tree);
        self.init_translation(Some(languages.clone()));
        self.change_state(SessionState::TranslateStart);
        self.listener.on_progress(0);

        let label = languages.to_string();
        let options = self.model_options();
        match Model::build(
            &self.tree,
            languages,
            self.model.as_ref(),
            self.breaker.as_ref(),
            options,
        ) {
            Ok((model, _)) => self.model = Some(model),
            Err(e) => {
                helpers::log_error(&e);
                self.model = None;
                self.change_state(SessionState::Inaccessible);
                return false;
            }
        }

        info!("开始翻译 {} (第 {} 代)", label, self.generation);
        self.start_workers();
        true
    }

    /// 撤销翻译：恢复原文和 `lang` 属性，丢弃模型
    pub fn undo(&mut self) {
        self.init_translation(None);
        if let Some(model) = self.model.take() {
            model.undo(&self.tree);
            info!("已撤销翻译 (第 {} 代)", self.generation);
        }
    }

    /// 文档发生变化
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// 空闲检查：只在翻译结束后处理积累的变化
    pub fn on_idle(&mut self) -> bool {
        if self.languages.is_none() || self.state != SessionState::TranslateEnd {
            return false;
        }
        self.update()
    }

    /// 以当前模型为差异来源重建；有新内容时开始新代次
    fn update(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        let Some(languages) = self.languages.clone() else {
            self.dirty = false;
            return false;
        };

        let options = self.model_options();
        match Model::build(
            &self.tree,
            languages.clone(),
            self.model.as_ref(),
            self.breaker.as_ref(),
            options,
        ) {
            Ok((model, true)) => {
                self.init_translation(Some(languages));
                self.model = Some(model);
                debug!("文档有新内容，增量翻译 (第 {} 代)", self.generation);
                self.change_state(SessionState::TranslateStart);
                self.start_workers();
                true
            }
            Ok((_, false)) => {
                trace!("文档无新内容");
                self.dirty = false;
                false
            }
            Err(e) => {
                helpers::log_error(&e);
                self.dirty = false;
                false
            }
        }
    }

    /// 处理宿主文档事件
    pub fn document_event(&mut self, event: DocumentEvent) {
        match event {
            DocumentEvent::ContentLoaded => self.schedule_start(),
            DocumentEvent::Loaded => {
                self.change_state(SessionState::LoadEnd);
                self.schedule_start();
            }
            DocumentEvent::Mutated => {
                if self.background {
                    self.mark_dirty();
                }
            }
            DocumentEvent::Unloaded => self.change_state(SessionState::Unload),
        }
    }

    fn schedule_start(&mut self) {
        self.pending_start = Some(Instant::now() + self.config.start_delay());
    }

    // ============================================================================
    // 工作者
    // ============================================================================

    fn model_options(&self) -> ModelOptions {
        ModelOptions {
            max_block_len: self.config.max_block_len,
            line_merge: self.line_merge,
        }
    }

    fn start_workers(&mut self) {
        for _ in 0..self.config.max_workers {
            self.advance(Source::Main);
        }
    }

    /// 工作者领取下一个批次；主列表耗尽时该工作者结束
    fn advance(&mut self, source: Source) {
        let max_items = self.config.max_items;
        let max_len = self.config.max_block_len;

        let next = {
            let Some(model) = self.model.as_mut() else {
                return;
            };
            let mut source = source;
            loop {
                match model.claim(source, max_items, max_len) {
                    Claim::Descend(index) => source = Source::Composite(index),
                    Claim::Exhausted if source != Source::Main => source = Source::Main,
                    Claim::Exhausted => break None,
                    Claim::Batch(batch) => break Some(batch),
                }
            }
        };

        match next {
            Some(batch) => self.dispatch(batch),
            None => self.worker_finished(),
        }
    }

    fn dispatch(&mut self, batch: Batch) {
        let Some(languages) = self.languages.clone() else {
            return;
        };

        self.next_seq += 1;
        let request = TranslationRequest {
            id: RequestId::new(self.id.clone(), self.next_seq),
            generation: self.generation,
            source_lang: languages.source,
            target_lang: languages.target,
            service: self.config.service.clone(),
            with_alignment: self.presenter.is_some(),
            blocks: batch.blocks,
        };
        let query = Query {
            request,
            source: batch.source,
            start: batch.start,
        };

        if batch.first_span_len > self.config.max_block_len {
            // 无法拆分的超长单元：原样回填，不发送
            debug!("请求 {} 含超长单元，原样回填", query.request.id);
            let blocks = query
                .request
                .blocks
                .iter()
                .map(|block| TranslatedBlock::identity(block))
                .collect();
            self.inflight.push(
                future::ready(Completion {
                    query,
                    outcome: Ok(blocks),
                })
                .boxed_local(),
            );
            return;
        }

        self.send(query);
    }

    fn send(&mut self, query: Query) {
        debug!(
            "发送请求 {}: {} 个块, {} 个字符",
            query.request.id,
            query.request.blocks.len(),
            query.request.text_len()
        );

        let response = self.transport.submit(query.request.clone());
        let timeout = self.config.request_timeout();
        self.inflight.push(
            async move {
                let outcome = match tokio::time::timeout(timeout, response).await {
                    Ok(outcome) => outcome,
                    Err(elapsed) => Err(elapsed.into()),
                };
                Completion { query, outcome }
            }
            .boxed_local(),
        );
    }

    /// 响应唯一入口：先检查代次
    fn handle_completion(&mut self, completion: Completion) {
        let Completion { query, outcome } = completion;
        if query.request.generation != self.generation {
            trace!(
                "丢弃过期响应 {} (第 {} 代，当前第 {} 代)",
                query.request.id,
                query.request.generation,
                self.generation
            );
            return;
        }

        let prepared = outcome.and_then(|blocks| match self.model.as_ref() {
            Some(model) => {
                model.prepare(query.source, query.start, query.request.blocks.len(), blocks)
            }
            None => Err(helpers::malformed("模型已释放")),
        });

        match prepared {
            Ok(prepared) => {
                self.budget.record_success();
                let progress = match self.model.as_mut() {
                    Some(model) => {
                        model.set_translation(&self.tree, query.source, query.start, prepared);
                        model.progress()
                    }
                    None => return,
                };
                self.listener.on_progress(progress);
                self.advance(query.source);
            }
            Err(e) => self.handle_failure(query, e),
        }
    }

    fn handle_failure(&mut self, query: Query, error: TranslationError) {
        let id = query.request.id.clone();
        let count = {
            let count = self.failures.entry(id.clone()).or_insert(0);
            *count += 1;
            *count
        };
        helpers::log_error(&error);

        let within_budget = self.budget.spend();
        if error.is_retryable() && within_budget && count <= self.config.max_repeat {
            warn!("请求 {} 第 {} 次失败，重发", id, count);
            self.send(query);
            return;
        }

        self.error_count += 1;
        let exhausted = TranslationError::BudgetExhausted {
            request_id: id.to_string(),
            failures: count,
            last_error: error.to_string(),
        };
        error!("{}", exhausted);
        if self.error_count == 1 {
            self.listener.on_error(&exhausted);
        }
        // 该工作者停止，不计入完成数：本代次不会进入 TranslateEnd
        debug!("请求 {} 的工作者停止", id);
    }

    fn worker_finished(&mut self) {
        self.finished_workers += 1;
        if self.finished_workers == self.config.max_workers {
            self.publish();
            info!(
                "翻译结束 (第 {} 代): 进度 {}%, 放弃 {} 个请求",
                self.generation,
                self.progress(),
                self.error_count
            );
            self.change_state(SessionState::TranslateEnd);
        }
    }

    fn publish(&mut self) {
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        let Some(model) = self.model.as_ref() else {
            return;
        };
        presenter.present(&model.languages().source, model.presented_chunks());
    }

    // ============================================================================
    // 驱动
    // ============================================================================

    /// 轮询所有在途请求直到没有请求在途
    pub async fn run_until_idle(&mut self) {
        while let Some(completion) = self.inflight.next().await {
            self.handle_completion(completion);
        }
    }

    /// 宿主循环：处理响应、文档事件、启动延时和空闲检查。
    ///
    /// 收到 `Unloaded` 后返回；事件通道关闭时处理完在途请求后返回。
    pub async fn drive(
        &mut self,
        mut events: mpsc::UnboundedReceiver<DocumentEvent>,
    ) -> TranslationResult<()> {
        let mut ticker = tokio::time::interval(self.config.idle_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let start_at = self.pending_start;
            let idle_enabled = self.background && !self.line_merge;

            tokio::select! {
                Some(completion) = self.inflight.next(), if !self.inflight.is_empty() => {
                    self.handle_completion(completion);
                }
                _ = tokio::time::sleep_until(start_at.unwrap_or_else(Instant::now)), if start_at.is_some() => {
                    self.pending_start = None;
                    self.translate(None);
                }
                _ = ticker.tick(), if idle_enabled => {
                    self.on_idle();
                }
                event = events.recv() => match event {
                    Some(DocumentEvent::Unloaded) => {
                        self.document_event(DocumentEvent::Unloaded);
                        return Ok(());
                    }
                    Some(event) => self.document_event(event),
                    None => {
                        if let Some(start_at) = self.pending_start.take() {
                            tokio::time::sleep_until(start_at).await;
                            self.translate(None);
                        }
                        self.run_until_idle().await;
                        return Ok(());
                    }
                },
            }
        }
    }
}
