//! 文本过滤器
//!
//! 判断片段是否含有需要翻译的字符，并规整空白

use std::sync::OnceLock;

use regex::Regex;

/// 视为"有文字"的码位区间（左闭右开）
const TEXT_RANGES: &[(u32, u32)] = &[
    (0x41, 0x5b),
    (0x61, 0x7b),
    (0x100, 0xe000),
    (0xf900, 0xfffe),
];

fn whitespace_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

/// 是否至少含有一个字母类字符。纯数字、标点、符号不送翻译。
///
/// 区间按 UTF-16 码元判断：辅助平面字符（扩展汉字、表情）编码为代理对，
/// 落在 `[0x100, 0xE000)` 内，同样算作文字。
pub fn has_text(text: &str) -> bool {
    text.encode_utf16().any(|unit| {
        let code = u32::from(unit);
        TEXT_RANGES
            .iter()
            .any(|&(start, end)| code >= start && code < end)
    })
}

/// 空串或仅由空白组成
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// 把连续空白折叠成一个空格
pub fn normalize_spaces(text: &str) -> String {
    whitespace_regex().replace_all(text, " ").into_owned()
}
