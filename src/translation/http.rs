//! JSON HTTP 翻译传输
//!
//! 请求体 `{lang, format: "html", text, srv, id, options?}`，其中每个块的片段
//! 先做 HTML 转义，再用 `<wbr/>` 连接成一个字符串。响应体 `{text, align}` 按
//! `<wbr/>` 拆回片段并解码实体。

use std::sync::OnceLock;
use std::time::Duration;

use futures::future::{FutureExt, LocalBoxFuture};
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::translation::config::TranslationConfig;
use crate::translation::core::transport::{TranslatedBlock, TranslationRequest, Transport};
use crate::translation::error::{helpers, TranslationResult};

/// 片段分隔符
const SPAN_SEPARATOR: &str = "<wbr/>";

/// 请求对齐信息时的 `options` 值
const ALIGNMENT_OPTION: u32 = 2;

fn separator_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<wbr\s?/>").expect("valid separator regex"))
}

#[derive(Debug, Serialize)]
struct WireRequest {
    lang: String,
    format: &'static str,
    text: Vec<String>,
    srv: String,
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<u32>,
}

impl From<&TranslationRequest> for WireRequest {
    fn from(request: &TranslationRequest) -> Self {
        Self {
            lang: request.lang_pair(),
            format: "html",
            text: request.blocks.iter().map(|spans| encode_block(spans)).collect(),
            srv: request.service.clone(),
            id: request.id.to_string(),
            options: request.with_alignment.then_some(ALIGNMENT_OPTION),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct WireResponse {
    #[serde(default)]
    text: Vec<String>,
    #[serde(default)]
    align: Vec<Option<String>>,
}

impl WireResponse {
    fn into_blocks(self) -> Vec<TranslatedBlock> {
        let mut align = self.align.into_iter();
        self.text
            .iter()
            .map(|html| TranslatedBlock {
                segments: decode_block(html),
                alignment: align.next().flatten().filter(|a| !a.is_empty()),
            })
            .collect()
    }
}

/// HTML 转义后用 `<wbr/>` 连接
pub fn encode_block(spans: &[String]) -> String {
    spans
        .iter()
        .map(|span| html_escape(span))
        .collect::<Vec<_>>()
        .join(SPAN_SEPARATOR)
}

/// 按 `<wbr/>` 或 `<wbr />` 拆分并解码
pub fn decode_block(html: &str) -> Vec<String> {
    separator_regex().split(html).map(html_decode).collect()
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// 只认识五个命名实体，其余实体替换为 `?`。缺少 `;` 时实体延伸到末尾。
pub fn html_decode(html: &str) -> String {
    let mut decoded = String::with_capacity(html.len());
    let mut rest = html;

    while let Some(pos) = rest.find('&') {
        decoded.push_str(&rest[..pos]);
        rest = &rest[pos + 1..];
        let end = rest.find(';').unwrap_or(rest.len());
        decoded.push(match &rest[..end] {
            "lt" => '<',
            "gt" => '>',
            "amp" => '&',
            "apos" => '\'',
            "quot" => '"',
            _ => '?',
        });
        rest = rest.get(end + 1..).unwrap_or("");
    }

    decoded.push_str(rest);
    decoded
}

/// 基于 reqwest 的传输实现，POST 到 `{api_url}/translate`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(api_url: &str, timeout: Duration) -> TranslationResult<Self> {
        let base = url::Url::parse(api_url)
            .map_err(|e| helpers::config_error(format!("无效的API地址 {}: {}", api_url, e)))?;
        let endpoint = format!("{}/translate", base.as_str().trim_end_matches('/'));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| helpers::config_error(format!("无法创建HTTP客户端: {}", e)))?;

        debug!("翻译接口: {}", endpoint);
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        Self::new(&config.api_url, config.request_timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

async fn post(
    client: reqwest::Client,
    endpoint: String,
    request: TranslationRequest,
) -> TranslationResult<Vec<TranslatedBlock>> {
    let body = serde_json::to_string(&WireRequest::from(&request))?;
    let response = client
        .post(&endpoint)
        .header(CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        warn!("请求 {} 返回状态 {}", request.id, status);
        return Err(helpers::transport_error(format!("HTTP状态 {}", status)));
    }

    let text = response.text().await?;
    let wire: WireResponse = serde_json::from_str(&text)
        .map_err(|e| helpers::malformed(format!("响应不是有效的JSON: {}", e)))?;
    Ok(wire.into_blocks())
}

impl Transport for HttpTransport {
    fn submit(
        &self,
        request: TranslationRequest,
    ) -> LocalBoxFuture<'static, TranslationResult<Vec<TranslatedBlock>>> {
        post(self.client.clone(), self.endpoint.clone(), request).boxed_local()
    }
}
