use crate::domain::model::{UnifiedCar, CATEGORY_ALL};
use crate::domain::ports::ImageUrlBuilder;
use crate::domain::record::{CarRecord, CmsCarRecord, CmsImage, FeatureList, FlatCarRecord, Scalar};

/// 不做任何轉換：參照本身已經是 URL 時直接使用
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughImages;

impl ImageUrlBuilder for PassthroughImages {
    fn image_url(&self, asset_ref: &str) -> Option<String> {
        let asset_ref = asset_ref.trim();
        (asset_ref.starts_with("http://") || asset_ref.starts_with("https://") || asset_ref.starts_with('/'))
            .then(|| asset_ref.to_string())
    }
}

pub fn normalize(record: &CarRecord, images: &dyn ImageUrlBuilder) -> UnifiedCar {
    match record {
        CarRecord::Spreadsheet(flat) => normalize_flat(flat),
        CarRecord::Cms(cms) => normalize_cms(cms, images),
    }
}

pub fn normalize_flat(record: &FlatCarRecord) -> UnifiedCar {
    let brand = text(record.brand.as_deref());
    let model = text(record.model.as_deref());
    let raw_id = scalar_text(record.id.as_ref());
    let slug = slug_or_derived(record.slug.as_deref(), &brand, &model, &raw_id);

    UnifiedCar {
        id: if raw_id.is_empty() { slug.clone() } else { raw_id },
        slug,
        brand,
        model,
        year: coerce_year(record.year.as_ref()),
        price: coerce_number(record.price.as_ref()),
        financing_per_month: coerce_number(record.financing.as_ref()),
        mileage: coerce_number(record.mileage.as_ref()),
        fuel_type: text(record.fuel.as_deref()),
        transmission: text(record.transmission.as_deref()),
        features: coerce_features(record.features.as_ref()),
        primary_image: text(record.image.as_deref()),
        gallery: record
            .gallery
            .iter()
            .flatten()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .collect(),
        description: text(record.description.as_deref()),
        category: category(record.category.as_deref()),
        available: coerce_bool(record.available.as_ref(), true),
        featured: coerce_bool(record.featured.as_ref(), false),
    }
}

pub fn normalize_cms(record: &CmsCarRecord, images: &dyn ImageUrlBuilder) -> UnifiedCar {
    let brand = text(record.brand.as_deref());
    let model = text(record.model.as_deref().or(record.title.as_deref()));
    let raw_id = record.id.trim().to_string();
    let explicit_slug = record.slug.as_ref().map(|slug| slug.current.as_str());
    let slug = slug_or_derived(explicit_slug, &brand, &model, &raw_id);

    let mut urls = record
        .main_image
        .iter()
        .chain(record.images.iter())
        .filter_map(|image| resolve_image(image, images));
    let primary_image = urls.next().unwrap_or_default();
    let gallery: Vec<String> = urls.filter(|url| *url != primary_image).collect();

    UnifiedCar {
        id: if raw_id.is_empty() { slug.clone() } else { raw_id },
        slug,
        brand,
        model,
        year: coerce_year(record.year.as_ref()),
        price: coerce_number(record.price.as_ref()),
        financing_per_month: coerce_number(record.financing_per_month.as_ref()),
        mileage: coerce_number(record.mileage.as_ref()),
        fuel_type: text(record.fuel_type.as_deref()),
        transmission: text(record.transmission.as_deref()),
        features: coerce_features(record.features.as_ref()),
        primary_image,
        gallery,
        description: record
            .description
            .as_ref()
            .map(|description| description.to_plain_text())
            .unwrap_or_default(),
        category: category(record.category.as_deref()),
        available: coerce_bool(record.available.as_ref(), true),
        featured: coerce_bool(record.featured.as_ref(), false),
    }
}

fn resolve_image(image: &CmsImage, images: &dyn ImageUrlBuilder) -> Option<String> {
    let asset = image.asset.as_ref();
    image
        .url
        .clone()
        .or_else(|| asset.and_then(|a| a.url.clone()))
        .filter(|url| !url.trim().is_empty())
        .or_else(|| {
            asset
                .and_then(|a| a.reference.as_deref())
                .and_then(|reference| images.image_url(reference))
        })
}

fn text(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

fn scalar_text(value: Option<&Scalar>) -> String {
    match value {
        Some(Scalar::Text(s)) => s.trim().to_string(),
        Some(Scalar::Number(n)) => n.to_string(),
        Some(Scalar::Bool(_)) | None => String::new(),
    }
}

/// 字串先去掉所有非數字字元 ("78,900 €" -> 78900)；負數、無法解析或缺值都是 0
pub fn coerce_number(value: Option<&Scalar>) -> u64 {
    match value {
        Some(Scalar::Number(n)) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f.trunc() as u64)
            })
            .unwrap_or(0),
        Some(Scalar::Text(s)) => s
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>()
            .parse()
            .unwrap_or(0),
        Some(Scalar::Bool(_)) | None => 0,
    }
}

fn coerce_year(value: Option<&Scalar>) -> u32 {
    u32::try_from(coerce_number(value)).unwrap_or(0)
}

pub fn coerce_features(value: Option<&FeatureList>) -> Vec<String> {
    let items: Vec<&str> = match value {
        Some(FeatureList::Joined(joined)) => joined.split(',').collect(),
        Some(FeatureList::List(list)) => list.iter().map(String::as_str).collect(),
        None => Vec::new(),
    };
    items
        .into_iter()
        .map(str::trim)
        .filter(|feature| !feature.is_empty())
        .map(str::to_string)
        .collect()
}

fn coerce_bool(value: Option<&Scalar>, default: bool) -> bool {
    match value {
        Some(Scalar::Bool(b)) => *b,
        Some(Scalar::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(default),
        Some(Scalar::Text(s)) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "ja" | "1" | "x" | "y" | "بله" => true,
            "false" | "no" | "nein" | "0" | "n" | "sold" | "verkauft" | "خیر" => false,
            _ => default,
        },
        None => default,
    }
}

fn category(value: Option<&str>) -> String {
    match value.map(str::trim) {
        Some(category) if !category.is_empty() => category.to_string(),
        _ => CATEGORY_ALL.to_string(),
    }
}

fn slug_or_derived(explicit: Option<&str>, brand: &str, model: &str, id: &str) -> String {
    match explicit.map(str::trim) {
        Some(slug) if !slug.is_empty() => slug.to_string(),
        _ => slugify(&format!("{} {} {}", brand, model, id)),
    }
}

pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}
