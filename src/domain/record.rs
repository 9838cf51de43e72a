//! 進入系統時就標記來源的原始車輛資料
//!
//! 試算表 / 本地 JSON 匯出都是扁平格式 ([`FlatCarRecord`])，
//! CMS 文件則保留其巢狀圖片參照 ([`CmsCarRecord`])。

use serde::{Deserialize, Serialize};

/// 數值欄位可能是數字、字串 ("78,900 €") 或布林
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

/// 配備清單：逗號分隔字串或已經是陣列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureList {
    List(Vec<String>),
    Joined(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatCarRecord {
    pub id: Option<Scalar>,
    pub slug: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<Scalar>,
    pub price: Option<Scalar>,
    #[serde(alias = "financingPerMonth", alias = "financing_per_month")]
    pub financing: Option<Scalar>,
    pub mileage: Option<Scalar>,
    #[serde(alias = "fuelType", alias = "fuel_type")]
    pub fuel: Option<String>,
    pub transmission: Option<String>,
    #[serde(alias = "primaryImage", alias = "primary_image", alias = "imageUrl")]
    pub image: Option<String>,
    pub gallery: Option<Vec<String>>,
    pub features: Option<FeatureList>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub available: Option<Scalar>,
    pub featured: Option<Scalar>,
}

impl FlatCarRecord {
    /// 以表頭名稱對應欄位，未知欄位忽略；空白儲存格視為缺值
    pub fn from_table_row(headers: &[String], row: &[String]) -> Self {
        let mut record = FlatCarRecord::default();
        for (header, cell) in headers.iter().zip(row.iter()) {
            let cell = cell.trim();
            if cell.is_empty() {
                continue;
            }
            record.set_column(header, cell);
        }
        record
    }

    fn set_column(&mut self, header: &str, cell: &str) {
        let text = || Some(cell.to_string());
        let scalar = || Some(Scalar::from(cell));

        match header.trim().to_lowercase().as_str() {
            "id" => self.id = scalar(),
            "slug" => self.slug = text(),
            "brand" | "marke" => self.brand = text(),
            "model" | "modell" => self.model = text(),
            "year" | "baujahr" => self.year = scalar(),
            "price" | "preis" => self.price = scalar(),
            "financing" | "financingpermonth" | "finanzierung" => self.financing = scalar(),
            "mileage" | "kilometerstand" | "km" => self.mileage = scalar(),
            "fuel" | "fueltype" | "kraftstoff" => self.fuel = text(),
            "transmission" | "getriebe" => self.transmission = text(),
            "image" | "imageurl" | "bild" => self.image = text(),
            "features" | "ausstattung" => self.features = Some(FeatureList::Joined(cell.to_string())),
            "category" | "kategorie" => self.category = text(),
            "description" | "beschreibung" => self.description = text(),
            "available" | "verfügbar" => self.available = scalar(),
            "featured" => self.featured = scalar(),
            other => tracing::debug!("Ignoring unknown car column '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmsSlug {
    #[serde(default)]
    pub current: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CmsAssetRef {
    #[serde(rename = "_ref")]
    pub reference: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsImage {
    pub asset: Option<CmsAssetRef>,
    pub url: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsSpan {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsBlock {
    pub children: Vec<CmsSpan>,
}

/// 描述欄位：純文字或 rich-text 區塊
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CmsDescription {
    Plain(String),
    Blocks(Vec<CmsBlock>),
}

impl CmsDescription {
    pub fn to_plain_text(&self) -> String {
        match self {
            CmsDescription::Plain(text) => text.trim().to_string(),
            CmsDescription::Blocks(blocks) => blocks
                .iter()
                .map(|block| {
                    block
                        .children
                        .iter()
                        .map(|span| span.text.as_str())
                        .collect::<String>()
                })
                .filter(|paragraph| !paragraph.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CmsCarRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub slug: Option<CmsSlug>,
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<Scalar>,
    pub price: Option<Scalar>,
    #[serde(alias = "financing")]
    pub financing_per_month: Option<Scalar>,
    pub mileage: Option<Scalar>,
    #[serde(alias = "fuel")]
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub features: Option<FeatureList>,
    pub main_image: Option<CmsImage>,
    pub images: Vec<CmsImage>,
    pub description: Option<CmsDescription>,
    pub category: Option<String>,
    pub available: Option<Scalar>,
    pub featured: Option<Scalar>,
}

/// 依來源標記的原始車輛資料
#[derive(Debug, Clone, PartialEq)]
pub enum CarRecord {
    Spreadsheet(FlatCarRecord),
    Cms(CmsCarRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_table_row_maps_headers() {
        let headers: Vec<String> = ["ID", "Marke", "Model", "Preis", "Features", "Notes"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row: Vec<String> = ["7", "BMW", "320d", "31.500", "GPS, Leder", "x"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let record = FlatCarRecord::from_table_row(&headers, &row);
        assert_eq!(record.id, Some(Scalar::from("7")));
        assert_eq!(record.brand.as_deref(), Some("BMW"));
        assert_eq!(record.price, Some(Scalar::from("31.500")));
        assert_eq!(
            record.features,
            Some(FeatureList::Joined("GPS, Leder".to_string()))
        );
    }

    #[test]
    fn test_flat_record_accepts_camel_case_json() {
        let record: FlatCarRecord = serde_json::from_value(serde_json::json!({
            "id": 3,
            "fuelType": "Diesel",
            "financingPerMonth": "299 €",
            "primaryImage": "/img/a.jpg",
            "features": ["ABS", "GPS"]
        }))
        .unwrap();

        assert_eq!(record.fuel.as_deref(), Some("Diesel"));
        assert_eq!(record.image.as_deref(), Some("/img/a.jpg"));
        assert_eq!(
            record.features,
            Some(FeatureList::List(vec!["ABS".to_string(), "GPS".to_string()]))
        );
    }

    #[test]
    fn test_cms_description_blocks_to_text() {
        let description: CmsDescription = serde_json::from_value(serde_json::json!([
            {"_type": "block", "children": [{"text": "Gepflegt, "}, {"text": "scheckheft"}]},
            {"_type": "block", "children": []},
            {"_type": "block", "children": [{"text": "Unfallfrei"}]}
        ]))
        .unwrap();

        assert_eq!(description.to_plain_text(), "Gepflegt, scheckheft\n\nUnfallfrei");
    }
}
