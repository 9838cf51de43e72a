use crate::config::toml_config::CatalogConfig;
use crate::core::catalog::CarQuery;
use crate::core::normalizer::normalize_cms;
use crate::domain::model::UnifiedCar;
use crate::domain::ports::{CarSource, ImageUrlBuilder};
use crate::domain::record::CmsCarRecord;
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// CMS 圖片資產 `image-<id>-<寬>x<高>-<格式>` 轉成 CDN URL
#[derive(Debug, Clone)]
pub struct CdnImageUrlBuilder {
    cdn_url: String,
    project_id: String,
    dataset: String,
}

impl CdnImageUrlBuilder {
    pub fn new(cdn_url: &str, project_id: &str, dataset: &str) -> Self {
        Self {
            cdn_url: cdn_url.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            dataset: dataset.to_string(),
        }
    }
}

impl ImageUrlBuilder for CdnImageUrlBuilder {
    fn image_url(&self, asset_ref: &str) -> Option<String> {
        if self.project_id.is_empty() {
            return None;
        }
        let rest = asset_ref.trim().strip_prefix("image-")?;
        let (rest, format) = rest.rsplit_once('-')?;
        let (id, dimensions) = rest.rsplit_once('-')?;
        if id.is_empty() || format.is_empty() || !dimensions.contains('x') {
            tracing::debug!("Unrecognized image reference '{}'", asset_ref);
            return None;
        }

        Some(format!(
            "{}/images/{}/{}/{}-{}.{}",
            self.cdn_url, self.project_id, self.dataset, id, dimensions, format
        ))
    }
}

/// GROQ 字串常值；JSON 字串跳脫規則相容
fn groq_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// 依篩選條件組出 CMS 查詢
pub fn build_filter_query(document_type: &str, query: &CarQuery) -> String {
    let mut filters = vec![format!("_type == {}", groq_string(document_type))];

    if let Some(available) = query.available {
        filters.push(format!("available == {}", available));
    }
    if let Some(featured) = query.featured {
        filters.push(format!("featured == {}", featured));
    }
    if let Some(brand) = query.brand.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
        filters.push(format!("lower(brand) == {}", groq_string(&brand.to_lowercase())));
    }
    if let Some(slug) = query.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        filters.push(format!("slug.current == {}", groq_string(slug)));
    }
    if let Some(category) = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        if !category.eq_ignore_ascii_case("all") {
            filters.push(format!(
                "(!defined(category) || category == \"all\" || category == {})",
                groq_string(category)
            ));
        }
    }

    let mut groq = format!("*[{}] | order(_createdAt desc)", filters.join(" && "));
    if let Some(limit) = query.limit {
        groq.push_str(&format!("[0...{}]", limit));
    }
    groq
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Vec<serde_json::Value>,
}

/// 透過 CMS 查詢 API 取得車輛
pub struct CmsCarSource<B: ImageUrlBuilder = CdnImageUrlBuilder> {
    name: String,
    client: Client,
    endpoint: String,
    token: Option<String>,
    document_type: String,
    query: CarQuery,
    images: B,
}

impl CmsCarSource<CdnImageUrlBuilder> {
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let base_url = config.cms_base_url()?;
        let cms = &config.cms;
        let images = CdnImageUrlBuilder::new(
            &cms.cdn_url,
            cms.project_id.as_deref().unwrap_or_default(),
            &cms.dataset,
        );
        if cms.token.is_none() {
            tracing::info!("🔓 No CMS token configured, querying without authentication");
        }

        Self::new(base_url, &cms.dataset, cms.token.clone(), images)
            .map(|source| source.with_document_type(&cms.document_type))
            .and_then(|source| source.with_timeout(Duration::from_secs(cms.timeout_seconds)))
    }
}

impl<B: ImageUrlBuilder> CmsCarSource<B> {
    pub fn new(base_url: &str, dataset: &str, token: Option<String>, images: B) -> Result<Self> {
        Ok(Self {
            name: "cms".to_string(),
            client: Client::new(),
            endpoint: format!("{}/data/query/{}", base_url.trim_end_matches('/'), dataset),
            token: token.filter(|t| !t.trim().is_empty()),
            document_type: "car".to_string(),
            query: CarQuery::default(),
            images,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn with_document_type(mut self, document_type: &str) -> Self {
        self.document_type = document_type.to_string();
        self
    }

    pub fn with_query(mut self, query: CarQuery) -> Self {
        self.query = query;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl<B: ImageUrlBuilder> CarSource for CmsCarSource<B> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_cars(&self) -> Result<Vec<UnifiedCar>> {
        let groq = build_filter_query(&self.document_type, &self.query);
        tracing::debug!("Making CMS request to: {}", self.endpoint);
        tracing::debug!("CMS query: {}", groq);

        let mut request = self.client.get(&self.endpoint).query(&[("query", groq.as_str())]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        tracing::debug!("CMS response status: {}", response.status());

        if !response.status().is_success() {
            return Err(CatalogError::source_unavailable(
                &self.name,
                format!("HTTP {}", response.status()),
            ));
        }

        let body: QueryResponse = response.json().await?;
        let cars: Vec<UnifiedCar> = body
            .result
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<CmsCarRecord>(value) {
                Ok(record) => Some(normalize_cms(&record, &self.images)),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping malformed CMS document: {}", e);
                    None
                }
            })
            .collect();

        tracing::info!("📡 CMS returned {} cars", cars.len());
        Ok(cars)
    }
}
