//! Localized string pairs used throughout the data model.

use serde::{Deserialize, Serialize};

/// Language tag understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Simplified Chinese.
    Cn,
    /// English.
    En,
}

impl Lang {
    /// Detect a query's language heuristically: any code point in the CJK
    /// ranges selects `Cn`, otherwise `En`.
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_cjk) {
            Lang::Cn
        } else {
            Lang::En
        }
    }
}

fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF   // CJK Unified Ideographs
        | 0x3400..=0x4DBF // CJK Extension A
        | 0xF900..=0xFAFF // CJK Compatibility Ideographs
        | 0x3000..=0x303F // CJK punctuation
    )
}

/// A string available in both Chinese and English, with fallback to `cn`
/// when the requested locale is missing or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedString {
    /// Chinese (simplified) text.
    pub cn: String,
    /// English text.
    pub en: String,
}

impl LocalizedString {
    /// Construct a pair from both variants.
    pub fn new(cn: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            cn: cn.into(),
            en: en.into(),
        }
    }

    /// Get the text for `lang`, falling back to `cn` if `en` was requested
    /// but empty.
    pub fn get(&self, lang: Lang) -> &str {
        match lang {
            Lang::En if !self.en.is_empty() => &self.en,
            _ => &self.cn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_to_cn_when_en_missing() {
        let s = LocalizedString::new("你好", "");
        assert_eq!(s.get(Lang::En), "你好");
        assert_eq!(s.get(Lang::Cn), "你好");
    }

    #[test]
    fn returns_en_when_present() {
        let s = LocalizedString::new("你好", "Hello");
        assert_eq!(s.get(Lang::En), "Hello");
    }

    #[test]
    fn detects_cjk() {
        assert_eq!(Lang::detect("我查看房间"), Lang::Cn);
        assert_eq!(Lang::detect("I look around"), Lang::En);
        assert_eq!(Lang::detect("look 房间"), Lang::Cn);
    }
}
