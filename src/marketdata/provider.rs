use async_trait::async_trait;
use thiserror::Error;

use crate::marketdata::candles::CandleSeries;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("provider rejected request: {0}")]
    Api(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Capability supplied by the market-data venue: the symbol catalog, candle
/// history, and the last-trade price. Injected into the pipeline so tests
/// can substitute a double.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn list_symbols(&self) -> Result<Vec<String>, ProviderError>;

    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<CandleSeries, ProviderError>;

    async fn fetch_ticker_price(&self, symbol: &str) -> Result<f64, ProviderError>;
}
