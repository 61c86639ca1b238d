use crate::analysis::analyzer::AnalysisResult;

/// Renders one scan as a fixed-width text table. Formatting lives here so
/// the indicator snapshot itself stays numeric.
pub fn render(results: &[AnalysisResult]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<14} {:>12} {:>8} {:>10} {:>8} {:>12} {:>12}  {}\n",
        "SYMBOL", "PRICE", "RSI", "MACD", "ADX", "SMA50", "SMA200", "ACTION"
    ));
    for result in results {
        let i = &result.indicators;
        out.push_str(&format!(
            "{:<14} {:>12} {:>8} {:>10} {:>8} {:>12} {:>12}  {}\n",
            result.symbol,
            fmt(Some(i.current_price)),
            fmt(i.rsi14),
            fmt(i.macd_line),
            fmt(i.adx14),
            fmt(i.sma50),
            fmt(i.sma200),
            result.action.as_str(),
        ));
    }
    out
}

fn fmt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyzer::Action;
    use crate::analysis::indicators::IndicatorSet;

    #[test]
    fn undefined_indicators_render_as_dash() {
        let results = vec![AnalysisResult {
            symbol: "BTC/USDT".to_string(),
            indicators: IndicatorSet {
                rsi14: Some(55.5),
                macd_line: None,
                macd_signal: None,
                sma50: Some(100.25),
                sma200: None,
                adx14: None,
                bb_upper: None,
                bb_lower: None,
                last_close: 101.0,
                current_price: 101.5,
            },
            action: Action::Hold,
        }];
        let table = render(&results);
        let body = table.lines().nth(1).unwrap();
        assert!(body.starts_with("BTC/USDT"));
        assert!(body.contains("55.50"));
        assert!(body.contains(" - "));
        assert!(body.ends_with("HOLD"));
    }
}
