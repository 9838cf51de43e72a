use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Could not parse source data: {message}")]
    ParseFailure { message: String },

    #[error("Translation key not found in any locale: {key}")]
    TranslationMiss { key: String },

    #[error("Source '{source_name}' unavailable: {message}")]
    SourceUnavailable {
        source_name: String,
        message: String,
    },

    #[error("Missing configuration: {field}")]
    ConfigurationMissing { field: String },

    #[error("Invalid configuration value for {field} ('{value}'): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error on {field}: {message}")]
    ValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Configuration,
    Validation,
    System,
}

impl CatalogError {
    pub fn source_unavailable(source_name: &str, message: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.to_string(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ZipError(_) | Self::ParseFailure { .. } => ErrorCategory::Input,
            Self::SerializationError(_) | Self::TranslationMiss { .. } => ErrorCategory::Input,
            Self::ApiError(_) | Self::SourceUnavailable { .. } => ErrorCategory::Network,
            Self::TomlError(_)
            | Self::ConfigurationMissing { .. }
            | Self::InvalidConfigValue { .. } => ErrorCategory::Configuration,
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check that the data file is a valid .xlsx workbook or CSV/TSV export",
            ErrorCategory::Network => "Check the CMS URL and network access, or switch to --mode fallback",
            ErrorCategory::Configuration => "Check the config file and AUTOHAUS_* environment variables",
            ErrorCategory::Validation => "Fill in every required field and try again",
            ErrorCategory::System => "Check that the data directory exists and is readable",
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
