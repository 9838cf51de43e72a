use anyhow::Context;
use autohaus_data::core::catalog::{brands, categories};
use autohaus_data::core::resolver;
use autohaus_data::domain::contact::ContactForm;
use autohaus_data::utils::{logger, validation::Validate};
use autohaus_data::{Catalog, CatalogConfig, CatalogError, CliConfig, Command};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    let format = if cli.json_logs {
        logger::LogFormat::Json
    } else {
        logger::LogFormat::Compact
    };
    logger::init(format, cli.verbose);

    tracing::info!("🚀 Starting autohaus CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            CatalogConfig::from_file(path).with_context(|| format!("failed to load config file '{}'", path))?
        }
        None => CatalogConfig::from_env(),
    };
    cli.apply_to(&mut config);

    // 驗證配置
    if let Err(e) = config.validate() {
        report(&e);
        std::process::exit(1);
    }

    let catalog = Catalog::from_config(&config).await?;

    match &cli.command {
        Command::Cars { sort, json, .. } => {
            let query = cli.command.car_query().unwrap_or_default();
            let cars = catalog.cars(&query, *sort).await;
            let state = catalog.state().await;
            if let Some(error) = &state.last_error {
                tracing::warn!("⚠️ {}", error);
            }

            if *json {
                println!("{}", serde_json::to_string_pretty(&cars)?);
            } else {
                for car in &cars {
                    println!(
                        "{:<24} {:<28} {:>4}  {:>9} €  {:>7} km  {}",
                        car.slug,
                        car.display_name(),
                        car.year,
                        car.price,
                        car.mileage,
                        if car.available { "" } else { "(sold)" }
                    );
                }
                println!("🚗 {} cars from {:?}", cars.len(), state.data_source);
            }
        }
        Command::Translate { key, locale } => {
            let locale = locale.unwrap_or(catalog.i18n().locale());
            match resolver::resolve_with(catalog.i18n().trees(), key, locale) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    tracing::warn!("⚠️ {}", e);
                    println!("{}", key);
                }
            }
        }
        Command::Translations { locale } => {
            let locale = locale.unwrap_or(catalog.i18n().locale());
            println!("{}", serde_json::to_string_pretty(catalog.i18n().trees().tree(locale))?);
        }
        Command::Contact {
            name,
            email,
            phone,
            message,
            car_id,
        } => {
            let form = ContactForm {
                name: name.clone(),
                email: email.clone(),
                phone: phone.clone(),
                message: message.clone(),
                car_id: car_id.clone(),
                preferred_locale: catalog.i18n().locale(),
            };

            if let Err(errors) = form.validate() {
                for e in &errors {
                    eprintln!("❌ {}", e);
                }
                std::process::exit(2);
            }
            let (ack, text) = catalog.submit_contact(&form)?;
            println!("✅ {} ({})", text, ack.reference);
        }
        Command::Status => {
            let state = catalog.load().await;
            println!("{}", serde_json::to_string_pretty(&StatusView::from(&state))?);
        }
    }

    Ok(())
}

fn report(e: &CatalogError) {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView<'a> {
    mode: autohaus_data::SourceMode,
    data_source: Option<autohaus_data::SourceKind>,
    last_error: Option<&'a str>,
    switched_from: Option<autohaus_data::SourceKind>,
    car_count: usize,
    brands: Vec<String>,
    categories: Vec<String>,
    loaded_at: Option<String>,
}

impl<'a> From<&'a autohaus_data::SourceState> for StatusView<'a> {
    fn from(state: &'a autohaus_data::SourceState) -> Self {
        Self {
            mode: state.mode,
            data_source: state.data_source,
            last_error: state.last_error.as_deref(),
            switched_from: state.switched_from,
            car_count: state.cars.len(),
            brands: brands(&state.cars),
            categories: categories(&state.cars),
            loaded_at: state.loaded_at.map(|at| at.to_rfc3339()),
        }
    }
}
