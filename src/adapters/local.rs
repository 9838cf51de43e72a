use crate::core::catalog::CarQuery;
use crate::core::normalizer::normalize_flat;
use crate::core::row_parser;
use crate::domain::model::UnifiedCar;
use crate::domain::ports::{CarSource, Storage};
use crate::domain::record::FlatCarRecord;
use crate::utils::error::{CatalogError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalFormat {
    /// xlsx / csv / tsv，第一列為表頭
    Table,
    /// 試算表匯出的 JSON 陣列
    Json,
}

impl LocalFormat {
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => LocalFormat::Json,
            _ => LocalFormat::Table,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonExport {
    List(Vec<serde_json::Value>),
    Wrapped { cars: Vec<serde_json::Value> },
}

/// 本地車輛資料 (通常當作備援來源)
pub struct LocalCarSource<S: Storage> {
    name: String,
    storage: S,
    path: String,
    format: LocalFormat,
    query: CarQuery,
}

impl<S: Storage> LocalCarSource<S> {
    pub fn new(storage: S, path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: format!("local:{}", path),
            format: LocalFormat::from_path(&path),
            storage,
            path,
            query: CarQuery::default(),
        }
    }

    pub fn with_query(mut self, query: CarQuery) -> Self {
        self.query = query;
        self
    }

    fn records_from_table(&self, bytes: &[u8]) -> Vec<FlatCarRecord> {
        let rows = row_parser::parse_rows(bytes);
        let Some((headers, body)) = rows.split_first() else {
            return Vec::new();
        };
        body.iter()
            .map(|row| FlatCarRecord::from_table_row(headers, row))
            .collect()
    }

    fn records_from_json(&self, bytes: &[u8]) -> Result<Vec<FlatCarRecord>> {
        let export: JsonExport = serde_json::from_slice(bytes).map_err(|e| CatalogError::ParseFailure {
            message: format!("{}: {}", self.path, e),
        })?;
        let values = match export {
            JsonExport::List(values) | JsonExport::Wrapped { cars: values } => values,
        };

        Ok(values
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value::<FlatCarRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("⚠️ {}: skipping car #{}: {}", self.path, index, e);
                    None
                }
            })
            .collect())
    }
}

#[async_trait]
impl<S: Storage> CarSource for LocalCarSource<S> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_cars(&self) -> Result<Vec<UnifiedCar>> {
        let bytes = self
            .storage
            .read_file(&self.path)
            .await
            .map_err(|e| CatalogError::source_unavailable(&self.name, e.to_string()))?;

        let records = match self.format {
            LocalFormat::Table => self.records_from_table(&bytes),
            LocalFormat::Json => self.records_from_json(&bytes)?,
        };

        let cars: Vec<UnifiedCar> = records.iter().map(normalize_flat).collect();
        tracing::debug!("📂 {}: normalized {} cars", self.name, cars.len());
        Ok(self.query.apply(&cars))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CARS_CSV: &str = "id,brand,model,year,price,financing,mileage,fuel,transmission,image,features,category,description\n\
1,BMW,320d,2019,\"24,900\",289,\"81.000 km\",Diesel,Automatik,/img/bmw.jpg,\"Navi, Leder\",limousine,Gepflegt\n\
2,VW,Golf,2020,18500,,42000,Benzin,Manuell,/img/golf.jpg,,,\n";

    #[tokio::test]
    async fn test_csv_cars_are_normalized() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cars.csv"), CARS_CSV).unwrap();

        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
        let source = LocalCarSource::new(storage, "cars.csv");
        let cars = source.fetch_cars().await.unwrap();

        assert_eq!(cars.len(), 2);
        assert_eq!(cars[0].price, 24900);
        assert_eq!(cars[0].mileage, 81000);
        assert_eq!(cars[0].features, vec!["Navi", "Leder"]);
        assert_eq!(cars[1].financing_per_month, 0);
        assert_eq!(cars[1].category, "all");
        assert!(cars[1].features.is_empty());
    }

    #[tokio::test]
    async fn test_json_export_with_query() {
        let dir = TempDir::new().unwrap();
        let json = serde_json::json!({
            "cars": [
                {"id": 1, "brand": "Audi", "model": "A3", "price": "21.990", "featured": true},
                {"id": 2, "brand": "Opel", "model": "Corsa", "price": 9900},
                "not-a-car"
            ]
        });
        std::fs::write(dir.path().join("cars.json"), json.to_string()).unwrap();

        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
        let source = LocalCarSource::new(storage, "cars.json").with_query(CarQuery::new().featured_only());
        let cars = source.fetch_cars().await.unwrap();

        assert_eq!(cars.len(), 1);
        assert_eq!(cars[0].brand, "Audi");
        assert_eq!(cars[0].price, 21990);
    }

    #[tokio::test]
    async fn test_missing_file_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().to_str().unwrap().to_string());
        let source = LocalCarSource::new(storage, "missing.xlsx");

        let err = source.fetch_cars().await.unwrap_err();
        assert!(matches!(err, CatalogError::SourceUnavailable { .. }));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(LocalFormat::from_path("cars.JSON"), LocalFormat::Json);
        assert_eq!(LocalFormat::from_path("cars.xlsx"), LocalFormat::Table);
        assert_eq!(LocalFormat::from_path("cars"), LocalFormat::Table);
    }
}
