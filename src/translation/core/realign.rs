//! 译文重排
//!
//! 一个块的译文有时需要写回多个原始单元（合并行、分段数与片段数不一致）。
//! 这里按原文长度比例切分译文。这是纯位置启发式，切分算术保持原样，
//! 包括中间切点以首个单元的原文长度为起点累加的方式。

use std::ops::Range;

use crate::translation::error::{helpers, TranslationResult};

/// 切点落在这些字符上时，字符归前一段
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', '?', '!', ')', ']'];

/// 按原文长度比例把译文切成 `source_lengths.len()` 段
///
/// 每段去掉首尾空白；切点落在字母中间时，前一段追加连字符 `-`。
/// 长度以 `char` 计。
pub fn split_text(text: &str, source_lengths: &[usize]) -> Vec<String> {
    let n = source_lengths.len();
    if n == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let tr_len = chars.len() as f64;
    let src_len = source_lengths.iter().sum::<usize>() as f64;
    // 原文为空时所有切点落在开头，译文全部归最后一段
    let scale = |value: f64| {
        if src_len > 0.0 {
            value * tr_len / src_len
        } else {
            0.0
        }
    };

    let mut len = source_lengths[0] as f64;
    let mut positions = Vec::with_capacity(n + 1);
    positions.push(scale(len));
    if n > 2 {
        let step = scale(src_len - len - source_lengths[n - 1] as f64) / (n - 2) as f64;
        for _ in 1..n - 1 {
            len += step;
            positions.push(len);
        }
    }
    positions.push(tr_len);

    let mut result = Vec::with_capacity(n);
    let mut end = 0usize;
    for position in positions.iter().take(n) {
        let start = end;
        end = position.floor().max(0.0) as usize;
        if chars
            .get(end)
            .map_or(false, |c| TRAILING_PUNCTUATION.contains(c))
        {
            end += 1;
        }

        let mut piece = clamped_slice(&chars, start, end);
        if end > 0 && is_alpha(chars.get(end - 1)) && is_alpha(chars.get(end)) {
            piece.push('-');
        }
        result.push(piece.trim().to_string());
    }

    result
}

/// 子串截取：两端先裁剪到长度范围内，起点大于终点时交换
fn clamped_slice(chars: &[char], a: usize, b: usize) -> String {
    let a = a.min(chars.len());
    let b = b.min(chars.len());
    let (from, to) = if a <= b { (a, b) } else { (b, a) };
    chars[from..to].iter().collect()
}

fn is_alpha(c: Option<&char>) -> bool {
    c.map_or(false, |c| c.is_alphabetic())
}

/// 原文与译文之间的一组对齐区间
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentPair {
    pub source: Range<usize>,
    pub target: Range<usize>,
}

/// 解析对齐串 `"起点:长度-起点:长度;..."`
pub fn parse_alignment(align: &str) -> TranslationResult<Vec<AlignmentPair>> {
    let mut pairs = Vec::new();
    for item in align.split(';').filter(|item| !item.trim().is_empty()) {
        let (source, target) = item
            .split_once('-')
            .ok_or_else(|| helpers::malformed(format!("对齐项缺少 '-': {}", item)))?;
        pairs.push(AlignmentPair {
            source: parse_range(source)?,
            target: parse_range(target)?,
        });
    }
    Ok(pairs)
}

fn parse_range(part: &str) -> TranslationResult<Range<usize>> {
    let (start, len) = part
        .split_once(':')
        .ok_or_else(|| helpers::malformed(format!("对齐区间缺少 ':': {}", part)))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| helpers::malformed(format!("对齐起点无效: {}", start)))?;
    let len: usize = len
        .trim()
        .parse()
        .map_err(|_| helpers::malformed(format!("对齐长度无效: {}", len)))?;
    Ok(start..start + len)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_units_split_inside_word() {
        // "Hello " + "world" -> "Bonjour le monde !"
        let pieces = split_text("Bonjour le monde !", &[6, 5]);

        assert_eq!(pieces, vec!["Bonjour l-", "e monde !"]);
        let joined: String = pieces.concat().replace('-', "");
        assert_eq!(joined, "Bonjour le monde !");
        assert!(pieces.iter().all(|p| !p.is_empty()));
    }

    #[test]
    fn test_punctuation_stays_with_previous_piece() {
        // 切点 floor(3 * 11 / 8) = 4，落在 '.' 上，后移一位
        let pieces = split_text("Halt. Jetzt", &[3, 5]);
        assert_eq!(pieces, vec!["Halt.", "Jetzt"]);
    }

    #[test]
    fn test_interior_cuts_start_from_first_source_length() {
        // 原文 [2, 4, 2]，译文 16 个字符：
        // 首切点 2*16/8 = 4；步长 (8-2-2)*16/8/1 = 8；中间切点 2 + 8 = 10
        let text = "abcd efghi jklmn";
        let pieces = split_text(text, &[2, 4, 2]);

        assert_eq!(pieces.len(), 3);
        assert_eq!(pieces[0], "abcd");
        assert_eq!(pieces[1], "efghi");
        assert_eq!(pieces[2], "jklmn");
    }

    #[test]
    fn test_single_unit_receives_whole_text() {
        assert_eq!(split_text("  Bonjour  ", &[5]), vec!["Bonjour"]);
        assert!(split_text("Bonjour", &[]).is_empty());
    }

    #[test]
    fn test_parse_alignment() {
        let pairs = parse_alignment("0:5-0:7;6:5-8:2").unwrap();
        assert_eq!(
            pairs,
            vec![
                AlignmentPair {
                    source: 0..5,
                    target: 0..7
                },
                AlignmentPair {
                    source: 6..11,
                    target: 8..10
                },
            ]
        );
        assert!(parse_alignment("").unwrap().is_empty());
        assert!(parse_alignment("0:5").is_err());
        assert!(parse_alignment("a:1-0:1").is_err());
    }
}
