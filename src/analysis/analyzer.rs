use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::analysis::indicators::{IndicatorEngine, IndicatorSet};
use crate::config::AnalysisConfig;
use crate::marketdata::provider::{MarketDataSource, ProviderError};

/// Discrete trading signal for one symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Buy => "BUY",
            Action::Sell => "SELL",
            Action::Hold => "HOLD",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub indicators: IndicatorSet,
    pub action: Action,
}

/// One symbol's failed analysis. The pipeline logs it and drops the symbol;
/// it is never fatal to the run.
#[derive(Debug, Error)]
#[error("analysis of {symbol} failed: {cause}")]
pub struct AnalysisFailure {
    pub symbol: String,
    #[source]
    pub cause: ProviderError,
}

pub struct SymbolAnalyzer {
    provider: Arc<dyn MarketDataSource>,
    timeframe: String,
    candle_limit: usize,
}

impl SymbolAnalyzer {
    pub fn new(provider: Arc<dyn MarketDataSource>, cfg: &AnalysisConfig) -> Self {
        Self {
            provider,
            timeframe: cfg.timeframe.clone(),
            candle_limit: cfg.candle_limit,
        }
    }

    /// Fetches history and ticker for one symbol, computes the indicator
    /// snapshot and classifies it. Provider failures are returned to the
    /// caller; they must not abort the other symbols.
    #[instrument(skip(self))]
    pub async fn analyze(&self, symbol: String) -> Result<AnalysisResult, AnalysisFailure> {
        match self.fetch_and_classify(&symbol).await {
            Ok((indicators, action)) => Ok(AnalysisResult {
                symbol,
                indicators,
                action,
            }),
            Err(cause) => Err(AnalysisFailure { symbol, cause }),
        }
    }

    async fn fetch_and_classify(
        &self,
        symbol: &str,
    ) -> Result<(IndicatorSet, Action), ProviderError> {
        let series = self
            .provider
            .fetch_candles(symbol, &self.timeframe, self.candle_limit)
            .await?;
        let price = self.provider.fetch_ticker_price(symbol).await?;
        let indicators = IndicatorEngine::compute(&series, price);
        let action = classify(&indicators);
        Ok((indicators, action))
    }
}

/// The buy branch is evaluated before the sell branch: when contradictory
/// conditions fire at once, BUY wins by evaluation order. An undefined RSI
/// or band leaves its clause unfired, so a too-short series reads HOLD.
pub fn classify(indicators: &IndicatorSet) -> Action {
    let oversold = indicators.rsi14.is_some_and(|r| r < 40.0);
    let below_band = indicators
        .bb_lower
        .is_some_and(|band| indicators.last_close <= band);
    if oversold || below_band {
        return Action::Buy;
    }

    let overbought = indicators.rsi14.is_some_and(|r| r > 60.0);
    let above_band = indicators
        .bb_upper
        .is_some_and(|band| indicators.last_close >= band);
    if overbought || above_band {
        return Action::Sell;
    }

    Action::Hold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(rsi14: Option<f64>, bands: Option<(f64, f64)>, last_close: f64) -> IndicatorSet {
        IndicatorSet {
            rsi14,
            macd_line: None,
            macd_signal: None,
            sma50: None,
            sma200: None,
            adx14: None,
            bb_upper: bands.map(|(_, upper)| upper),
            bb_lower: bands.map(|(lower, _)| lower),
            last_close,
            current_price: last_close,
        }
    }

    #[test]
    fn rsi_thresholds_are_strict() {
        assert_eq!(classify(&snapshot(Some(39.9999), None, 1.0)), Action::Buy);
        assert_eq!(classify(&snapshot(Some(40.0), None, 1.0)), Action::Hold);
        assert_eq!(classify(&snapshot(Some(40.0001), None, 1.0)), Action::Hold);
        assert_eq!(classify(&snapshot(Some(60.0), None, 1.0)), Action::Hold);
        assert_eq!(classify(&snapshot(Some(60.0001), None, 1.0)), Action::Sell);
    }

    #[test]
    fn band_touches_are_inclusive() {
        let set = snapshot(Some(50.0), Some((10.0, 20.0)), 10.0);
        assert_eq!(classify(&set), Action::Buy);

        let set = snapshot(Some(50.0), Some((10.0, 20.0)), 20.0);
        assert_eq!(classify(&set), Action::Sell);

        let set = snapshot(Some(50.0), Some((10.0, 20.0)), 15.0);
        assert_eq!(classify(&set), Action::Hold);
    }

    #[test]
    fn buy_wins_over_contradictory_sell() {
        // oversold RSI and a close at the upper band at the same time
        let set = snapshot(Some(35.0), Some((10.0, 20.0)), 20.0);
        assert_eq!(classify(&set), Action::Buy);
    }

    #[test]
    fn undefined_inputs_classify_as_hold() {
        assert_eq!(classify(&snapshot(None, None, 42.0)), Action::Hold);
        // defined bands but the close sits between them, RSI missing
        assert_eq!(
            classify(&snapshot(None, Some((10.0, 20.0)), 15.0)),
            Action::Hold
        );
    }
}
