use tracing_subscriber::{EnvFilter, fmt};

use crate::config::TelemetryConfig;
use crate::errors::{AppError, AppResult};

pub fn init(cfg: &TelemetryConfig) -> AppResult<()> {
    let env_filter =
        EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = fmt::fmt().with_env_filter(env_filter).with_target(false);
    let result = if cfg.json {
        builder.json().with_ansi(false).try_init()
    } else {
        builder.compact().try_init()
    };
    result.map_err(|e| AppError::Other(e.to_string()))
}
