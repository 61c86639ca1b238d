use thiserror::Error;

use crate::marketdata::provider::ProviderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] config::ConfigError),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("other: {0}")]
    Other(String),
}

pub type AppResult<T, E = AppError> = Result<T, E>;
