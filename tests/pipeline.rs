use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use marketscan::analysis::{Action, AnalysisPipeline};
use marketscan::config::AnalysisConfig;
use marketscan::marketdata::{Candle, CandleSeries, MarketDataSource, ProviderError};

fn hourly_series(closes: &[f64]) -> CandleSeries {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    CandleSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| Candle {
                timestamp: start + chrono::Duration::hours(i as i64),
                open: close,
                high: close + 0.5,
                low: close - 0.5,
                close,
                volume: 1.0,
            })
            .collect(),
    )
}

fn uptrend(len: usize) -> Vec<f64> {
    (1..=len).map(|i| i as f64).collect()
}

#[derive(Default)]
struct MockProvider {
    symbols: Vec<String>,
    candles: HashMap<String, CandleSeries>,
    prices: HashMap<String, f64>,
    failing: Vec<String>,
    list_fails: bool,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockProvider {
    fn with_symbol(mut self, symbol: &str, closes: &[f64]) -> Self {
        self.symbols.push(symbol.to_string());
        self.candles
            .insert(symbol.to_string(), hourly_series(closes));
        self.prices
            .insert(symbol.to_string(), closes.last().copied().unwrap_or(0.0));
        self
    }

    fn with_failing_symbol(mut self, symbol: &str) -> Self {
        self.symbols.push(symbol.to_string());
        self.failing.push(symbol.to_string());
        self
    }
}

#[async_trait]
impl MarketDataSource for MockProvider {
    async fn list_symbols(&self) -> Result<Vec<String>, ProviderError> {
        if self.list_fails {
            return Err(ProviderError::Transport("connection refused".to_string()));
        }
        Ok(self.symbols.clone())
    }

    async fn fetch_candles(
        &self,
        symbol: &str,
        _timeframe: &str,
        _limit: usize,
    ) -> Result<CandleSeries, ProviderError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.iter().any(|s| s == symbol) {
            return Err(ProviderError::Api("rate limited".to_string()));
        }
        self.candles
            .get(symbol)
            .cloned()
            .ok_or_else(|| ProviderError::Malformed(format!("no fixture for {symbol}")))
    }

    async fn fetch_ticker_price(&self, symbol: &str) -> Result<f64, ProviderError> {
        self.prices
            .get(symbol)
            .copied()
            .ok_or_else(|| ProviderError::Api(format!("unknown symbol {symbol}")))
    }
}

fn config(max_concurrent: usize) -> AnalysisConfig {
    AnalysisConfig {
        max_concurrent_fetches: max_concurrent,
        ..AnalysisConfig::default()
    }
}

#[tokio::test]
async fn filters_to_quote_currency_and_keeps_catalog_order() {
    let closes = uptrend(100);
    let provider = Arc::new(
        MockProvider::default()
            .with_symbol("BTC/USDT", &closes)
            .with_symbol("ETH/BTC", &closes)
            .with_symbol("ETH/USDT", &closes)
            .with_symbol("SOL/USDT", &closes),
    );
    let pipeline = AnalysisPipeline::new(provider, config(4));

    let results = pipeline.run().await.unwrap();
    let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BTC/USDT", "ETH/USDT", "SOL/USDT"]);
}

#[tokio::test]
async fn one_failing_symbol_does_not_disturb_the_others() {
    let closes = uptrend(100);
    let provider = Arc::new(
        MockProvider::default()
            .with_symbol("BTC/USDT", &closes)
            .with_failing_symbol("BAD/USDT")
            .with_symbol("ETH/USDT", &closes),
    );
    let pipeline = AnalysisPipeline::new(provider, config(4));

    let results = pipeline.run().await.unwrap();
    assert_eq!(results.len(), 2);
    let symbols: Vec<&str> = results.iter().map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["BTC/USDT", "ETH/USDT"]);
    for result in &results {
        assert!(matches!(
            result.action,
            Action::Buy | Action::Sell | Action::Hold
        ));
    }
}

#[tokio::test]
async fn catalog_failure_is_fatal_to_the_run() {
    let provider = Arc::new(MockProvider {
        list_fails: true,
        ..MockProvider::default()
    });
    let pipeline = AnalysisPipeline::new(provider, config(4));

    assert!(pipeline.run().await.is_err());
}

#[tokio::test]
async fn uptrend_with_saturated_rsi_classifies_sell() {
    // A linear ramp keeps the last close inside the Bollinger bands (the
    // upper band sits about 11.5 steps above the window mean, the close
    // only 9.5), so only the RSI clause can fire.
    let provider = Arc::new(MockProvider::default().with_symbol("BTC/USDT", &uptrend(100)));
    let pipeline = AnalysisPipeline::new(provider, config(4));

    let results = pipeline.run().await.unwrap();
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert!(result.indicators.rsi14.unwrap() > 60.0);
    assert!(result.indicators.last_close < result.indicators.bb_upper.unwrap());
    assert_eq!(result.action, Action::Sell);
}

#[tokio::test]
async fn short_history_classifies_hold() {
    let provider = Arc::new(MockProvider::default().with_symbol("NEW/USDT", &uptrend(10)));
    let pipeline = AnalysisPipeline::new(provider, config(4));

    let results = pipeline.run().await.unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].indicators.rsi14.is_none());
    assert!(results[0].indicators.bb_upper.is_none());
    assert_eq!(results[0].action, Action::Hold);
}

#[tokio::test]
async fn sma200_is_informational_only() {
    let provider = Arc::new(MockProvider::default().with_symbol("BTC/USDT", &uptrend(100)));
    let pipeline = AnalysisPipeline::new(provider, config(4));

    let results = pipeline.run().await.unwrap();
    assert!(results[0].indicators.sma200.is_none());
    // classification still produced a signal without it
    assert_ne!(results[0].action, Action::Hold);
}

#[tokio::test]
async fn concurrency_cap_bounds_in_flight_fetches() {
    let closes = uptrend(100);
    let mut provider = MockProvider::default();
    for i in 0..8 {
        provider = provider.with_symbol(&format!("SYM{i}/USDT"), &closes);
    }
    let provider = Arc::new(provider);
    let pipeline = AnalysisPipeline::new(provider.clone(), config(2));

    let results = pipeline.run().await.unwrap();
    assert_eq!(results.len(), 8);
    assert!(provider.max_in_flight.load(Ordering::SeqCst) <= 2);
    assert!(provider.max_in_flight.load(Ordering::SeqCst) >= 1);
}
