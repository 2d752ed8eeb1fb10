//! 分词切分
//!
//! 过长的文本按词边界切成若干段。单个词本身超长时独占一段，不在词内切断。

use unicode_segmentation::UnicodeSegmentation;

/// 分词能力
pub trait TextBreaker {
    /// 把 `text` 切成若干段，每段尽量不超过 `max_len` 个字符。
    /// 各段按顺序拼接必须还原 `text`。
    fn break_text(&self, text: &str, max_len: usize) -> Vec<String>;
}

/// 基于 Unicode 词边界（UAX #29）的切分
#[derive(Debug, Default, Clone, Copy)]
pub struct WordBreaker;

impl TextBreaker for WordBreaker {
    fn break_text(&self, text: &str, max_len: usize) -> Vec<String> {
        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for token in text.split_word_bounds() {
            let token_len = token.chars().count();
            if current_len > 0 && current_len + token_len > max_len {
                pieces.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push_str(token);
            current_len += token_len;
        }

        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }
}
