use crate::domain::model::{Locale, SourceMode};
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_positive_number, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub cms: CmsSettings,
    pub local: LocalSettings,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsSettings {
    /// 例如 `https://<project>.api.sanity.io/v2021-10-21`；未設定時只使用本地資料
    pub base_url: Option<String>,
    /// 沒有 token 時以未驗證身分查詢
    pub token: Option<String>,
    pub project_id: Option<String>,
    pub dataset: String,
    pub document_type: String,
    pub cdn_url: String,
    pub timeout_seconds: u64,
}

impl Default for CmsSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            project_id: None,
            dataset: "production".to_string(),
            document_type: "car".to_string(),
            cdn_url: "https://cdn.sanity.io".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSettings {
    pub data_dir: String,
    /// xlsx / csv / tsv 或 JSON 匯出
    pub cars_file: String,
    pub translations_file: String,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            cars_file: "cars.xlsx".to_string(),
            translations_file: "translations.xlsx".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub source_mode: SourceMode,
    pub locale: Locale,
}

impl CatalogConfig {
    /// 從 TOML 檔案載入配置，再套用環境變數覆蓋
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// 沒有設定檔時：預設值 + 環境變數
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// 替換環境變數 (例如 ${AUTOHAUS_CMS_TOKEN})，未定義的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    pub fn apply_env_overrides(&mut self) {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(url) = var("AUTOHAUS_CMS_URL") {
            self.cms.base_url = Some(url);
        }
        if let Some(token) = var("AUTOHAUS_CMS_TOKEN") {
            self.cms.token = Some(token);
        }
        if let Some(project) = var("AUTOHAUS_CMS_PROJECT") {
            self.cms.project_id = Some(project);
        }
        if let Some(dataset) = var("AUTOHAUS_CMS_DATASET") {
            self.cms.dataset = dataset;
        }
        if let Some(cdn) = var("AUTOHAUS_CDN_URL") {
            self.cms.cdn_url = cdn;
        }
        if let Some(dir) = var("AUTOHAUS_DATA_DIR") {
            self.local.data_dir = dir;
        }
        if let Some(mode) = var("AUTOHAUS_SOURCE_MODE") {
            match mode.parse() {
                Ok(mode) => self.catalog.source_mode = mode,
                Err(e) => tracing::warn!("⚠️ Ignoring AUTOHAUS_SOURCE_MODE: {}", e),
            }
        }
        if let Some(locale) = var("AUTOHAUS_LOCALE") {
            match locale.parse() {
                Ok(locale) => self.catalog.locale = locale,
                Err(e) => tracing::warn!("⚠️ Ignoring AUTOHAUS_LOCALE: {}", e),
            }
        }
    }

    pub fn cms_enabled(&self) -> bool {
        self.cms.base_url.as_deref().is_some_and(|url| !url.trim().is_empty())
    }

    pub fn cms_base_url(&self) -> Result<&str> {
        self.cms
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| CatalogError::ConfigurationMissing {
                field: "cms.base_url".to_string(),
            })
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(url) = self.cms.base_url.as_deref() {
            validate_url("cms.base_url", url)?;
        }
        validate_url("cms.cdn_url", &self.cms.cdn_url)?;
        validate_non_empty_string("cms.dataset", &self.cms.dataset)?;
        validate_non_empty_string("cms.document_type", &self.cms.document_type)?;
        validate_positive_number("cms.timeout_seconds", self.cms.timeout_seconds, 1)?;

        validate_path("local.data_dir", &self.local.data_dir)?;
        validate_path("local.cars_file", &self.local.cars_file)?;
        validate_path("local.translations_file", &self.local.translations_file)?;

        Ok(())
    }
}

impl Validate for CatalogConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
