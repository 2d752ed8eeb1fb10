//! 语言对与书写方向

use std::fmt;

/// 从右向左书写的语言
const RTL_LANGUAGES: &[&str] = &["ar", "dv", "fa", "he", "iw", "ji", "ps", "sd", "ug", "ur", "yi"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    pub fn of(lang: &str) -> Self {
        if RTL_LANGUAGES.contains(&lang) {
            TextDirection::Rtl
        } else {
            TextDirection::Ltr
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TextDirection::Ltr => "ltr",
            TextDirection::Rtl => "rtl",
        }
    }
}

/// 源语言与目标语言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// 解析 `en-fr` 形式的语言对，任一侧为空时返回 `None`
    pub fn parse(pair: &str) -> Option<Self> {
        let (source, target) = pair.trim().split_once('-')?;
        if source.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self::new(source, target))
    }

    /// 两侧相同（`en-en`），无需翻译
    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }

    /// 书写方向不同时返回目标方向
    pub fn direction_change(&self) -> Option<TextDirection> {
        let from = TextDirection::of(&self.source);
        let to = TextDirection::of(&self.target);
        (from != to).then_some(to)
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_language_pair() {
        let pair = LanguagePair::parse("en-fr").unwrap();
        assert_eq!(pair.source, "en");
        assert_eq!(pair.target, "fr");
        assert_eq!(pair.to_string(), "en-fr");

        assert!(LanguagePair::parse("").is_none());
        assert!(LanguagePair::parse("en").is_none());
        assert!(LanguagePair::parse("en-").is_none());
        assert!(LanguagePair::parse("en-en").unwrap().is_identity());
    }

    #[test]
    fn test_direction_change() {
        assert_eq!(
            LanguagePair::new("en", "ar").direction_change(),
            Some(TextDirection::Rtl)
        );
        assert_eq!(
            LanguagePair::new("he", "ru").direction_change(),
            Some(TextDirection::Ltr)
        );
        assert_eq!(LanguagePair::new("en", "fr").direction_change(), None);
    }
}
