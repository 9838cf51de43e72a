use crate::config::toml_config::CatalogConfig;
use crate::core::catalog::{CarQuery, SortOrder};
use crate::domain::model::{Locale, SourceMode};
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "autohaus")]
#[command(about = "Car catalog and translation tooling for the dealership site")]
pub struct CliConfig {
    /// TOML 設定檔；未指定時只用預設值與環境變數
    #[arg(long, short = 'c')]
    pub config: Option<String>,

    #[arg(long, help = "Directory holding the local spreadsheets")]
    pub data_dir: Option<String>,

    #[arg(long, help = "Source mode: primary, fallback or auto")]
    pub mode: Option<SourceMode>,

    #[arg(long, help = "Display locale: de or fa")]
    pub locale: Option<Locale>,

    #[arg(long, short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 列出車輛
    Cars {
        #[arg(long)]
        brand: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        slug: Option<String>,
        #[arg(long)]
        featured: bool,
        #[arg(long, help = "Hide sold cars")]
        available: bool,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long, default_value = "source")]
        sort: SortOrder,
        #[arg(long, help = "Print the cars as JSON")]
        json: bool,
    },
    /// 查詢單一翻譯 key
    Translate {
        key: String,
        #[arg(long)]
        locale: Option<Locale>,
    },
    /// 輸出整棵翻譯樹 (JSON)
    Translations {
        #[arg(long)]
        locale: Option<Locale>,
    },
    /// 驗證並確認聯絡表單
    Contact {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        message: String,
        #[arg(long)]
        car_id: Option<String>,
    },
    /// 顯示來源狀態
    Status,
}

impl CliConfig {
    /// 命令列參數優先於設定檔與環境變數
    pub fn apply_to(&self, config: &mut CatalogConfig) {
        if let Some(dir) = &self.data_dir {
            config.local.data_dir = dir.clone();
        }
        if let Some(mode) = self.mode {
            config.catalog.source_mode = mode;
        }
        if let Some(locale) = self.locale {
            config.catalog.locale = locale;
        }
    }
}

impl Command {
    /// `cars` 子命令的篩選條件
    pub fn car_query(&self) -> Option<CarQuery> {
        let Command::Cars {
            brand,
            category,
            slug,
            featured,
            available,
            limit,
            ..
        } = self
        else {
            return None;
        };

        let mut query = CarQuery::new();
        if *available {
            query = query.available_only();
        }
        if *featured {
            query = query.featured_only();
        }
        if let Some(brand) = brand {
            query = query.brand(brand.clone());
        }
        if let Some(category) = category {
            query = query.category(category.clone());
        }
        if let Some(slug) = slug {
            query = query.slug(slug.clone());
        }
        if let Some(limit) = limit {
            query = query.limit(*limit);
        }
        Some(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cars_command() {
        let cli = CliConfig::try_parse_from([
            "autohaus", "--mode", "fallback", "--locale", "fa", "cars", "--brand", "BMW", "--featured", "--sort",
            "price-desc", "--limit", "3",
        ])
        .unwrap();

        assert_eq!(cli.mode, Some(SourceMode::Fallback));
        assert_eq!(cli.locale, Some(Locale::Fa));
        let query = cli.command.car_query().unwrap();
        assert_eq!(query.brand.as_deref(), Some("BMW"));
        assert_eq!(query.featured, Some(true));
        assert_eq!(query.available, None);
        assert_eq!(query.limit, Some(3));
        assert!(matches!(cli.command, Command::Cars { sort: SortOrder::PriceDesc, .. }));
    }

    #[test]
    fn test_overrides_applied_to_config() {
        let cli = CliConfig::try_parse_from(["autohaus", "--data-dir", "/tmp/site", "--mode", "primary", "status"]).unwrap();
        let mut config = CatalogConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config.local.data_dir, "/tmp/site");
        assert_eq!(config.catalog.source_mode, SourceMode::Primary);
        assert_eq!(config.catalog.locale, Locale::De);
        assert!(cli.command.car_query().is_none());
    }

    #[test]
    fn test_rejects_unknown_mode() {
        assert!(CliConfig::try_parse_from(["autohaus", "--mode", "cloud", "status"]).is_err());
    }
}
