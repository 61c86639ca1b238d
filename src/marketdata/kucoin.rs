use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use crate::config::ProviderConfig;
use crate::errors::{AppError, AppResult};
use crate::marketdata::candles::{Candle, CandleSeries};
use crate::marketdata::provider::{MarketDataSource, ProviderError};

const SUCCESS_CODE: &str = "200000";
const MAX_KLINES_PER_REQUEST: usize = 1500;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolEntry {
    base_currency: String,
    quote_currency: String,
    enable_trading: bool,
}

#[derive(Debug, Deserialize)]
struct Level1Ticker {
    price: String,
}

/// KuCoin public REST client. Cheap to clone and safe to share across the
/// concurrent per-symbol tasks.
#[derive(Clone)]
pub struct KucoinClient {
    client: Client,
    base_url: String,
}

impl KucoinClient {
    pub fn new(cfg: &ProviderConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| AppError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, ProviderError> {
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        if envelope.code != SUCCESS_CODE {
            return Err(ProviderError::Api(format!(
                "code {}: {}",
                envelope.code,
                envelope.msg.unwrap_or_default()
            )));
        }
        envelope
            .data
            .ok_or_else(|| ProviderError::Malformed("missing data field".into()))
    }

    fn venue_symbol(symbol: &str) -> String {
        symbol.replace('/', "-")
    }

    /// Maps a "1h"-style timeframe to KuCoin's kline type and bucket length
    /// in seconds.
    fn timeframe_param(timeframe: &str) -> Result<(&'static str, i64), ProviderError> {
        let mapped = match timeframe {
            "1m" => ("1min", 60),
            "3m" => ("3min", 180),
            "5m" => ("5min", 300),
            "15m" => ("15min", 900),
            "30m" => ("30min", 1_800),
            "1h" => ("1hour", 3_600),
            "2h" => ("2hour", 7_200),
            "4h" => ("4hour", 14_400),
            "6h" => ("6hour", 21_600),
            "8h" => ("8hour", 28_800),
            "12h" => ("12hour", 43_200),
            "1d" => ("1day", 86_400),
            "1w" => ("1week", 604_800),
            _ => {
                return Err(ProviderError::Api(format!(
                    "unsupported timeframe '{timeframe}'"
                )));
            }
        };
        Ok(mapped)
    }

    // Kline rows arrive as [time, open, close, high, low, volume, turnover],
    // all strings, time in epoch seconds.
    fn parse_candle(row: &[String]) -> Option<Candle> {
        let ts_secs: i64 = row.first()?.parse().ok()?;
        let timestamp = Utc.timestamp_opt(ts_secs, 0).single()?;
        Some(Candle {
            timestamp,
            open: row.get(1)?.parse().ok()?,
            close: row.get(2)?.parse().ok()?,
            high: row.get(3)?.parse().ok()?,
            low: row.get(4)?.parse().ok()?,
            volume: row.get(5)?.parse().ok()?,
        })
    }
}

#[async_trait]
impl MarketDataSource for KucoinClient {
    #[instrument(skip(self))]
    async fn list_symbols(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/v2/symbols", self.base_url);
        let entries: Vec<SymbolEntry> = self.get_json(url).await?;
        Ok(entries
            .into_iter()
            .filter(|s| s.enable_trading)
            .map(|s| format!("{}/{}", s.base_currency, s.quote_currency))
            .collect())
    }

    #[instrument(skip(self))]
    async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<CandleSeries, ProviderError> {
        let (kline_type, bucket_secs) = Self::timeframe_param(timeframe)?;
        let limit = limit.min(MAX_KLINES_PER_REQUEST);
        let end_at = Utc::now().timestamp();
        let start_at = end_at - bucket_secs * limit as i64;
        let url = format!(
            "{}/api/v1/market/candles?type={}&symbol={}&startAt={}&endAt={}",
            self.base_url,
            kline_type,
            Self::venue_symbol(symbol),
            start_at,
            end_at
        );
        let rows: Vec<Vec<String>> = self.get_json(url).await?;
        let candles: Vec<Candle> = rows.iter().filter_map(|r| Self::parse_candle(r)).collect();
        if candles.is_empty() {
            return Err(ProviderError::Malformed(format!(
                "no candles returned for {symbol}"
            )));
        }
        Ok(CandleSeries::new(candles))
    }

    #[instrument(skip(self))]
    async fn fetch_ticker_price(&self, symbol: &str) -> Result<f64, ProviderError> {
        let url = format!(
            "{}/api/v1/market/orderbook/level1?symbol={}",
            self.base_url,
            Self::venue_symbol(symbol)
        );
        let ticker: Level1Ticker = self.get_json(url).await?;
        ticker
            .price
            .parse()
            .map_err(|e| ProviderError::Malformed(format!("ticker price: {e}")))
    }
}
