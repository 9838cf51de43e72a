use crate::domain::model::UnifiedCar;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
}

/// 任何能提供車輛清單的後端 (CMS、本地試算表、本地 JSON)
#[async_trait]
pub trait CarSource: Send + Sync {
    /// 用於日誌與錯誤訊息
    fn name(&self) -> &str;

    async fn fetch_cars(&self) -> Result<Vec<UnifiedCar>>;
}

/// CMS 圖片參照轉成可公開存取的 URL
pub trait ImageUrlBuilder: Send + Sync {
    fn image_url(&self, asset_ref: &str) -> Option<String>;
}
