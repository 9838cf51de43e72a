use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 網站支援的語系：德文 (預設) 與波斯文
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    Fa,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::De, Locale::Fa];

    pub fn code(&self) -> &'static str {
        match self {
            Locale::De => "de",
            Locale::Fa => "fa",
        }
    }

    /// 查無翻譯時的備援語系
    pub fn other(&self) -> Locale {
        match self {
            Locale::De => Locale::Fa,
            Locale::Fa => Locale::De,
        }
    }

    pub fn direction(&self) -> TextDirection {
        match self {
            Locale::De => TextDirection::Ltr,
            Locale::Fa => TextDirection::Rtl,
        }
    }

    /// 接受 `de`, `de-DE`, `fa_IR` 之類的語系代碼
    pub fn from_code(code: &str) -> Option<Locale> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "de" | "deutsch" | "german" => Some(Locale::De),
            "fa" | "farsi" | "persian" => Some(Locale::Fa),
            _ => None,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_code(s).ok_or_else(|| format!("unsupported locale '{}'", s))
    }
}

/// 翻譯表中的一列：點分隔的 key、各語系文字與分類
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRow {
    pub key: String,
    pub values: BTreeMap<Locale, String>,
    pub category: String,
}

impl TranslationRow {
    pub fn new(key: impl Into<String>, de: impl Into<String>, fa: impl Into<String>) -> Self {
        let mut values = BTreeMap::new();
        values.insert(Locale::De, de.into());
        values.insert(Locale::Fa, fa.into());
        Self {
            key: key.into(),
            values,
            category: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn value(&self, locale: Locale) -> &str {
        self.values.get(&locale).map(String::as_str).unwrap_or_default()
    }
}

/// 單一語系的巢狀翻譯樹節點
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TranslationNode {
    Text(String),
    List(Vec<TranslationNode>),
    Map(BTreeMap<String, TranslationNode>),
}

impl TranslationNode {
    pub fn empty_map() -> Self {
        TranslationNode::Map(BTreeMap::new())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TranslationNode::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TranslationNode]> {
        match self {
            TranslationNode::List(items) => Some(items),
            _ => None,
        }
    }

    /// 依單一 segment 往下一層；數字 segment 只能用於 List
    pub fn child(&self, segment: &str) -> Option<&TranslationNode> {
        match self {
            TranslationNode::Map(map) => map.get(segment),
            TranslationNode::List(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            TranslationNode::Text(_) => None,
        }
    }
}

/// 每個語系一棵翻譯樹
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocaleTrees {
    trees: BTreeMap<Locale, TranslationNode>,
}

impl Default for LocaleTrees {
    fn default() -> Self {
        Self::new()
    }
}

impl LocaleTrees {
    pub fn new() -> Self {
        let trees = Locale::ALL
            .iter()
            .map(|locale| (*locale, TranslationNode::empty_map()))
            .collect();
        Self { trees }
    }

    pub fn tree(&self, locale: Locale) -> &TranslationNode {
        // new() 保證每個語系都有根節點
        &self.trees[&locale]
    }

    pub(crate) fn tree_mut(&mut self, locale: Locale) -> &mut TranslationNode {
        self.trees
            .entry(locale)
            .or_insert_with(TranslationNode::empty_map)
    }

    pub fn is_empty(&self) -> bool {
        self.trees.values().all(|node| match node {
            TranslationNode::Map(map) => map.is_empty(),
            _ => false,
        })
    }
}

/// 所有車輛來源統一轉換後的格式；每個欄位都有值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedCar {
    pub id: String,
    pub slug: String,
    pub brand: String,
    pub model: String,
    pub year: u32,
    pub price: u64,
    pub financing_per_month: u64,
    pub mileage: u64,
    pub fuel_type: String,
    pub transmission: String,
    pub features: Vec<String>,
    pub primary_image: String,
    pub gallery: Vec<String>,
    pub description: String,
    pub category: String,
    pub available: bool,
    pub featured: bool,
}

pub const CATEGORY_ALL: &str = "all";

impl Default for UnifiedCar {
    fn default() -> Self {
        Self {
            id: String::new(),
            slug: String::new(),
            brand: String::new(),
            model: String::new(),
            year: 0,
            price: 0,
            financing_per_month: 0,
            mileage: 0,
            fuel_type: String::new(),
            transmission: String::new(),
            features: Vec::new(),
            primary_image: String::new(),
            gallery: Vec::new(),
            description: String::new(),
            category: CATEGORY_ALL.to_string(),
            available: true,
            featured: false,
        }
    }
}

impl UnifiedCar {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.brand, self.model).trim().to_string()
    }

    /// 所有圖片，主圖在前
    pub fn images(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_image.as_str())
            .filter(|url| !url.is_empty())
            .chain(self.gallery.iter().map(String::as_str))
    }
}

/// 使用者要求的資料來源模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Primary,
    Fallback,
    #[default]
    Auto,
}

impl FromStr for SourceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" | "cms" => Ok(SourceMode::Primary),
            "fallback" | "local" => Ok(SourceMode::Fallback),
            "auto" => Ok(SourceMode::Auto),
            other => Err(format!("unknown source mode '{}'", other)),
        }
    }
}

/// 實際提供資料的來源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Primary,
    Fallback,
}

impl SourceKind {
    pub fn other(&self) -> SourceKind {
        match self {
            SourceKind::Primary => SourceKind::Fallback,
            SourceKind::Fallback => SourceKind::Primary,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Primary => f.write_str("Primary"),
            SourceKind::Fallback => f.write_str("Fallback"),
        }
    }
}

impl From<SourceKind> for SourceMode {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Primary => SourceMode::Primary,
            SourceKind::Fallback => SourceMode::Fallback,
        }
    }
}

/// 仲裁器對外公開的狀態快照
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceState {
    pub mode: SourceMode,
    pub data_source: Option<SourceKind>,
    pub last_error: Option<String>,
    pub cars: Vec<UnifiedCar>,
    pub switched_from: Option<SourceKind>,
    pub loaded_at: Option<DateTime<Utc>>,
}

impl SourceState {
    pub fn new(mode: SourceMode) -> Self {
        Self {
            mode,
            data_source: None,
            last_error: None,
            cars: Vec::new(),
            switched_from: None,
            loaded_at: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_codes() {
        assert_eq!(Locale::from_code("de-DE"), Some(Locale::De));
        assert_eq!(Locale::from_code("fa_IR"), Some(Locale::Fa));
        assert_eq!(Locale::from_code("en"), None);
        assert_eq!(Locale::Fa.other(), Locale::De);
        assert_eq!(Locale::Fa.direction(), TextDirection::Rtl);
        assert_eq!("FA".parse::<Locale>().unwrap(), Locale::Fa);
    }

    #[test]
    fn test_unified_car_defaults() {
        let car = UnifiedCar::default();
        assert_eq!(car.category, CATEGORY_ALL);
        assert!(car.available);
        assert_eq!(car.images().count(), 0);
    }

    #[test]
    fn test_source_mode_parse() {
        assert_eq!("auto".parse::<SourceMode>().unwrap(), SourceMode::Auto);
        assert_eq!("CMS".parse::<SourceMode>().unwrap(), SourceMode::Primary);
        assert!("both".parse::<SourceMode>().is_err());
    }
}
