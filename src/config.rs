use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::AppResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "ProviderConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "ProviderConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ProviderConfig {
    fn default_base_url() -> String {
        "https://api.kucoin.com".to_string()
    }

    fn default_timeout_secs() -> u64 {
        10
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "AnalysisConfig::default_quote_currency")]
    pub quote_currency: String,
    #[serde(default = "AnalysisConfig::default_timeframe")]
    pub timeframe: String,
    #[serde(default = "AnalysisConfig::default_candle_limit")]
    pub candle_limit: usize,
    #[serde(default = "AnalysisConfig::default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

impl AnalysisConfig {
    fn default_quote_currency() -> String {
        "USDT".to_string()
    }

    fn default_timeframe() -> String {
        "1h".to_string()
    }

    fn default_candle_limit() -> usize {
        100
    }

    fn default_max_concurrent_fetches() -> usize {
        16
    }

    /// In-flight request cap for the per-symbol fan-out. Never below one.
    pub fn fetch_concurrency(&self) -> usize {
        self.max_concurrent_fetches.max(1)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            quote_currency: Self::default_quote_currency(),
            timeframe: Self::default_timeframe(),
            candle_limit: Self::default_candle_limit(),
            max_concurrent_fetches: Self::default_max_concurrent_fetches(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Settings {
    pub fn load_from(path: impl AsRef<Path>) -> AppResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("MARKETSCAN").separator("__"));
        let cfg = builder.build()?;
        Ok(cfg.try_deserialize()?)
    }
}
