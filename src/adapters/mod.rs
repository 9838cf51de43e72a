pub mod cms;
pub mod local;

pub use cms::{CdnImageUrlBuilder, CmsCarSource};
pub use local::{LocalCarSource, LocalStorage};

use crate::domain::model::UnifiedCar;
use crate::domain::ports::CarSource;
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;

/// 缺少設定時代替主要來源，每次抓取都回報缺少的欄位
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    name: String,
    field: String,
}

impl UnavailableSource {
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
        }
    }
}

#[async_trait]
impl CarSource for UnavailableSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_cars(&self) -> Result<Vec<UnifiedCar>> {
        Err(CatalogError::ConfigurationMissing {
            field: self.field.clone(),
        })
    }
}
