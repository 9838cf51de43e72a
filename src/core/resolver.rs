use crate::core::materializer;
use crate::core::row_parser;
use crate::domain::model::{Locale, LocaleTrees, TextDirection, TranslationNode, TranslationRow};
use crate::domain::ports::Storage;
use crate::utils::error::{CatalogError, Result};

/// 與建樹時相同的切分規則
fn lookup<'a>(tree: &'a TranslationNode, key: &str) -> Option<&'a TranslationNode> {
    let segments = materializer::split_key(key);
    if segments.is_empty() {
        return None;
    }
    segments
        .into_iter()
        .try_fold(tree, |node, segment| node.child(segment))
}

fn lookup_text<'a>(tree: &'a TranslationNode, key: &str) -> Option<&'a str> {
    lookup(tree, key)
        .and_then(TranslationNode::as_text)
        .filter(|text| !text.is_empty())
}

/// 先查指定語系，再查另一個語系；都找不到時回傳 `TranslationMiss`
pub fn resolve_with(trees: &LocaleTrees, key: &str, locale: Locale) -> Result<String> {
    lookup_text(trees.tree(locale), key)
        .or_else(|| lookup_text(trees.tree(locale.other()), key))
        .map(str::to_string)
        .ok_or_else(|| CatalogError::TranslationMiss {
            key: key.to_string(),
        })
}

/// 永遠回傳可顯示的字串：指定語系 → 另一語系 → key 本身
pub fn resolve(trees: &LocaleTrees, key: &str, locale: Locale) -> String {
    match resolve_with(trees, key, locale) {
        Ok(text) => text,
        Err(_) => {
            tracing::debug!("Translation miss for '{}' ({})", key, locale);
            key.to_string()
        }
    }
}

/// 取得子樹 (例如團隊成員清單)，同樣有語系備援
pub fn resolve_node<'a>(trees: &'a LocaleTrees, key: &str, locale: Locale) -> Option<&'a TranslationNode> {
    lookup(trees.tree(locale), key).or_else(|| lookup(trees.tree(locale.other()), key))
}

/// 在應用程式根部建立的語系狀態，取代全域語言變數
#[derive(Debug, Clone, Default)]
pub struct I18nContext {
    trees: LocaleTrees,
    locale: Locale,
}

impl I18nContext {
    pub fn new(trees: LocaleTrees, locale: Locale) -> Self {
        Self { trees, locale }
    }

    pub fn from_rows(rows: &[TranslationRow], locale: Locale) -> Self {
        Self::new(materializer::materialize(rows), locale)
    }

    /// 從翻譯表檔案 (xlsx / csv / tsv) 建立；讀不到或解析失敗時得到空的翻譯樹
    pub async fn load<S: Storage>(storage: &S, path: &str, locale: Locale) -> Self {
        let bytes = match storage.read_file(path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("⚠️ Could not read translations '{}': {}", path, e);
                Vec::new()
            }
        };

        let rows = materializer::rows_from_table(&row_parser::parse_rows(&bytes));
        tracing::info!("🌐 Loaded {} translation keys from {}", rows.len(), path);
        Self::from_rows(&rows, locale)
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn set_locale(&mut self, locale: Locale) {
        if self.locale != locale {
            tracing::debug!("Switching locale {} -> {}", self.locale, locale);
            self.locale = locale;
        }
    }

    pub fn toggle_locale(&mut self) {
        self.set_locale(self.locale.other());
    }

    pub fn direction(&self) -> TextDirection {
        self.locale.direction()
    }

    pub fn trees(&self) -> &LocaleTrees {
        &self.trees
    }

    pub fn t(&self, key: &str) -> String {
        resolve(&self.trees, key, self.locale)
    }

    pub fn t_in(&self, key: &str, locale: Locale) -> String {
        resolve(&self.trees, key, locale)
    }

    pub fn node(&self, key: &str) -> Option<&TranslationNode> {
        resolve_node(&self.trees, key, self.locale)
    }

    /// 清單中每個元素的指定欄位，例如 `t_list("about.team", "name")`
    pub fn t_list(&self, key: &str, field: &str) -> Vec<String> {
        self.node(key)
            .and_then(TranslationNode::as_list)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.child(field).and_then(TranslationNode::as_text))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
