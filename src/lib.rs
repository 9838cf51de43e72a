pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{CmsCarSource, LocalCarSource, LocalStorage};
pub use app::Catalog;
pub use config::CatalogConfig;
pub use core::{CarQuery, I18nContext, SortOrder, SourceArbitrator};
pub use domain::model::{Locale, SourceKind, SourceMode, SourceState, UnifiedCar};
pub use utils::error::{CatalogError, Result};
