use crate::domain::model::{UnifiedCar, CATEGORY_ALL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// 與 CMS 查詢相同的篩選條件；本地來源在記憶體中套用
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CarQuery {
    pub available: Option<bool>,
    pub featured: Option<bool>,
    pub brand: Option<String>,
    pub slug: Option<String>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// 保留來源順序
    #[default]
    Source,
    Newest,
    PriceAsc,
    PriceDesc,
    MileageAsc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "source" | "default" => Ok(SortOrder::Source),
            "newest" | "year" => Ok(SortOrder::Newest),
            "price-asc" | "price" => Ok(SortOrder::PriceAsc),
            "price-desc" => Ok(SortOrder::PriceDesc),
            "mileage-asc" | "mileage" => Ok(SortOrder::MileageAsc),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

impl CarQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn available_only(mut self) -> Self {
        self.available = Some(true);
        self
    }

    pub fn featured_only(mut self) -> Self {
        self.featured = Some(true);
        self
    }

    pub fn brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == CarQuery::default()
    }

    pub fn matches(&self, car: &UnifiedCar) -> bool {
        if self.available.is_some_and(|available| car.available != available) {
            return false;
        }
        if self.featured.is_some_and(|featured| car.featured != featured) {
            return false;
        }
        if let Some(brand) = non_empty(&self.brand) {
            if !car.brand.eq_ignore_ascii_case(brand) {
                return false;
            }
        }
        if let Some(slug) = non_empty(&self.slug) {
            if car.slug != slug {
                return false;
            }
        }
        if let Some(category) = non_empty(&self.category) {
            // 未分類 ("all") 的車輛永遠符合分類篩選
            let wanted_all = category.eq_ignore_ascii_case(CATEGORY_ALL);
            let car_all = car.category.eq_ignore_ascii_case(CATEGORY_ALL);
            if !wanted_all && !car_all && !car.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, cars: &[UnifiedCar]) -> Vec<UnifiedCar> {
        cars.iter()
            .filter(|car| self.matches(car))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub fn sort_cars(cars: &mut [UnifiedCar], order: SortOrder) {
    match order {
        SortOrder::Source => {}
        SortOrder::Newest => cars.sort_by(|a, b| b.year.cmp(&a.year)),
        SortOrder::PriceAsc => cars.sort_by_key(|car| car.price),
        SortOrder::PriceDesc => cars.sort_by(|a, b| b.price.cmp(&a.price)),
        SortOrder::MileageAsc => cars.sort_by_key(|car| car.mileage),
    }
}

/// 出現過的分類，不含 "all"
pub fn categories(cars: &[UnifiedCar]) -> Vec<String> {
    cars.iter()
        .map(|car| car.category.clone())
        .filter(|category| !category.eq_ignore_ascii_case(CATEGORY_ALL))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn brands(cars: &[UnifiedCar]) -> Vec<String> {
    cars.iter()
        .map(|car| car.brand.clone())
        .filter(|brand| !brand.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
