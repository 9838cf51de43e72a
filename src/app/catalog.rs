use crate::adapters::{CmsCarSource, LocalCarSource, LocalStorage, UnavailableSource};
use crate::config::toml_config::CatalogConfig;
use crate::core::arbitrator::SourceArbitrator;
use crate::core::catalog::{self, CarQuery, SortOrder};
use crate::core::resolver::I18nContext;
use crate::domain::contact::{ContactAcknowledgement, ContactForm};
use crate::domain::model::{Locale, SourceMode, SourceState, UnifiedCar};
use crate::domain::ports::CarSource;
use crate::utils::error::Result;

/// 網站根部的資料上下文：翻譯 + 車輛來源仲裁
pub struct Catalog {
    i18n: I18nContext,
    arbitrator: SourceArbitrator,
}

impl Catalog {
    pub fn new(i18n: I18nContext, arbitrator: SourceArbitrator) -> Self {
        Self { i18n, arbitrator }
    }

    /// 依配置建立來源並載入翻譯；車輛要等 [`Catalog::load`] 才抓取
    pub async fn from_config(config: &CatalogConfig) -> Result<Self> {
        let storage = LocalStorage::new(config.local.data_dir.clone());

        let primary: Box<dyn CarSource> = if config.cms_enabled() {
            Box::new(CmsCarSource::from_config(config)?)
        } else {
            tracing::warn!("⚠️ CMS is not configured, primary source disabled");
            Box::new(UnavailableSource::new("cms", "cms.base_url"))
        };
        let fallback: Box<dyn CarSource> = Box::new(LocalCarSource::new(storage.clone(), config.local.cars_file.clone()));

        let i18n = I18nContext::load(&storage, &config.local.translations_file, config.catalog.locale).await;
        let arbitrator = SourceArbitrator::from_boxed(primary, fallback, config.catalog.source_mode);

        Ok(Self::new(i18n, arbitrator))
    }

    pub async fn load(&self) -> SourceState {
        self.arbitrator.load().await
    }

    pub async fn refresh(&self) -> SourceState {
        self.arbitrator.refresh().await
    }

    pub async fn set_mode(&self, mode: SourceMode) -> SourceState {
        self.arbitrator.set_mode(mode).await
    }

    pub async fn state(&self) -> SourceState {
        self.arbitrator.snapshot().await
    }

    /// 尚未載入時會先載入一次；筆數限制在排序之後套用
    pub async fn cars(&self, query: &CarQuery, order: SortOrder) -> Vec<UnifiedCar> {
        let state = self.arbitrator.snapshot().await;
        let state = if state.is_loaded() { state } else { self.load().await };

        let filter = CarQuery {
            limit: None,
            ..query.clone()
        };
        let mut cars = filter.apply(&state.cars);
        catalog::sort_cars(&mut cars, order);
        if let Some(limit) = query.limit {
            cars.truncate(limit);
        }
        cars
    }

    pub async fn car_by_slug(&self, slug: &str) -> Option<UnifiedCar> {
        self.cars(&CarQuery::new().slug(slug).limit(1), SortOrder::Source)
            .await
            .into_iter()
            .next()
    }

    pub fn i18n(&self) -> &I18nContext {
        &self.i18n
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.i18n.set_locale(locale);
    }

    pub fn t(&self, key: &str) -> String {
        self.i18n.t(key)
    }

    /// 驗證表單後回傳確認資訊與目前語系的確認訊息
    pub fn submit_contact(&self, form: &ContactForm) -> Result<(ContactAcknowledgement, String)> {
        let ack = form.acknowledge()?;
        let message = self.i18n.t_in(ack.message_key, ack.locale);
        Ok((ack, message))
    }
}

impl Drop for Catalog {
    fn drop(&mut self) {
        self.arbitrator.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{SourceKind, TranslationRow};
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FixedSource(Vec<UnifiedCar>);

    #[async_trait]
    impl CarSource for FixedSource {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_cars(&self) -> Result<Vec<UnifiedCar>> {
            Ok(self.0.clone())
        }
    }

    /// 慢速來源，模擬 CMS 延遲
    struct SlowSource(Vec<UnifiedCar>);

    #[async_trait]
    impl CarSource for SlowSource {
        fn name(&self) -> &str {
            "slow"
        }

        async fn fetch_cars(&self) -> Result<Vec<UnifiedCar>> {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            Ok(self.0.clone())
        }
    }

    fn car(slug: &str, price: u64) -> UnifiedCar {
        UnifiedCar {
            id: slug.to_string(),
            slug: slug.to_string(),
            price,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cars_load_lazily_and_sort() {
        let arbitrator = SourceArbitrator::new(
            FixedSource(vec![car("a", 30000), car("b", 12000)]),
            FixedSource(Vec::new()),
            SourceMode::Auto,
        );
        let catalog = Catalog::new(I18nContext::default(), arbitrator);

        let cars = catalog.cars(&CarQuery::new(), SortOrder::PriceAsc).await;
        assert_eq!(cars[0].slug, "b");
        assert_eq!(catalog.state().await.data_source, Some(SourceKind::Primary));
        assert_eq!(catalog.car_by_slug("a").await.map(|c| c.price), Some(30000));
    }

    #[tokio::test]
    async fn test_concurrent_first_queries_both_return_cars() {
        let arbitrator = SourceArbitrator::new(
            SlowSource(vec![car("a", 30000), car("b", 12000)]),
            FixedSource(Vec::new()),
            SourceMode::Auto,
        );
        let catalog = Catalog::new(I18nContext::default(), arbitrator);
        let query = CarQuery::new();

        let (first, second) = tokio::join!(
            catalog.cars(&query, SortOrder::Source),
            catalog.cars(&query, SortOrder::Source)
        );

        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_from_config_without_cms_uses_local_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cars.csv"), "id,brand,model,price\n1,Skoda,Octavia,15900\n").unwrap();
        std::fs::write(
            dir.path().join("translations.csv"),
            "key,de,fa\nnav.home,Startseite,خانه\ncontact.form.success,Danke!,\n",
        )
        .unwrap();

        let mut config = CatalogConfig::default();
        config.local.data_dir = dir.path().to_str().unwrap().to_string();
        config.local.cars_file = "cars.csv".to_string();
        config.local.translations_file = "translations.csv".to_string();
        config.catalog.locale = Locale::Fa;

        let catalog = Catalog::from_config(&config).await.unwrap();
        let state = catalog.load().await;

        assert_eq!(state.data_source, Some(SourceKind::Fallback));
        assert_eq!(state.cars[0].brand, "Skoda");
        assert!(state.last_error.unwrap().contains("cms.base_url"));
        assert_eq!(catalog.t("nav.home"), "خانه");

        let form = ContactForm {
            name: "Sara".to_string(),
            email: "sara@example.de".to_string(),
            message: "Ist der Octavia noch da?".to_string(),
            preferred_locale: Locale::Fa,
            ..Default::default()
        };
        let (ack, message) = catalog.submit_contact(&form).unwrap();
        assert!(ack.reference.starts_with("AH-"));
        assert_eq!(message, "Danke!");
    }

    #[test]
    fn test_set_locale() {
        let rows = vec![TranslationRow::new("nav.home", "Startseite", "خانه")];
        let arbitrator = SourceArbitrator::new(FixedSource(Vec::new()), FixedSource(Vec::new()), SourceMode::Auto);
        let mut catalog = Catalog::new(I18nContext::from_rows(&rows, Locale::De), arbitrator);

        assert_eq!(catalog.t("nav.home"), "Startseite");
        catalog.set_locale(Locale::Fa);
        assert_eq!(catalog.t("nav.home"), "خانه");
    }
}
