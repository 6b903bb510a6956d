pub mod app_config;
pub mod config;
pub mod products;

use thiserror::Error;

pub use app_config::{
    AppConfig, DestinationMode, DestinationSettings, Environment, HttpSettings,
    UpstreamCredentials,
};
pub use config::{load_app_config, load_app_config_from_env, MAX_IMPORT_CONCURRENCY};
pub use products::{
    CanonicalProduct, CreatedProduct, FailureKind, ImportReport, ImportResult, ProductImage,
    WeightUnit, DEFAULT_PRICE, DEFAULT_TITLE, DEFAULT_VENDOR, UNIDENTIFIED_CODE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
