//! Filter configuration error types.
//!
//! Applying filters never fails; these errors only surface while loading
//! attribute specs and relation graphs.

use thiserror::Error;

/// Errors raised while loading or validating filter configuration.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unknown filter operation: {0}")]
    UnknownOperation(String),

    #[error("invalid filterable attribute {attribute}: {reason}")]
    InvalidAttribute { attribute: String, reason: String },

    #[error("invalid filter map: {0}")]
    InvalidFilters(String),

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("config file is {0} bytes, over the size limit")]
    ConfigTooLarge(u64),

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON config")]
    Json(#[from] serde_json::Error),

    #[error("invalid YAML config")]
    Yaml(#[from] serde_yml::Error),

    #[error("invalid TOML config")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias using FilterError.
pub type FilterResult<T> = Result<T, FilterError>;
