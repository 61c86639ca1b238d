use serde::Serialize;

use crate::marketdata::candles::CandleSeries;

/// Indicator snapshot for one symbol. `None` means the series was too short
/// for the window; a partial-window value is never substituted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorSet {
    pub rsi14: Option<f64>,
    pub macd_line: Option<f64>,
    pub macd_signal: Option<f64>,
    pub sma50: Option<f64>,
    pub sma200: Option<f64>,
    pub adx14: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub last_close: f64,
    pub current_price: f64,
}

pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Computes the full indicator battery over one candle series, keeping
    /// the last value of each derived series. Pure and deterministic.
    pub fn compute(series: &CandleSeries, ticker_price: f64) -> IndicatorSet {
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();

        let (macd_line, macd_signal) = macd(&closes, 12, 26, 9);
        let (bb_upper, bb_lower) = bollinger(&closes, 20, 2.0);

        IndicatorSet {
            rsi14: last(&rsi(&closes, 14)),
            macd_line: last(&macd_line),
            macd_signal: last(&macd_signal),
            sma50: last(&sma(&closes, 50)),
            sma200: last(&sma(&closes, 200)),
            adx14: last(&adx(&highs, &lows, &closes, 14)),
            bb_upper: last(&bb_upper),
            bb_lower: last(&bb_lower),
            // An empty series has no close; classification is Option-gated
            // on the bands, so NaN can never fire a signal.
            last_close: series.last_close().unwrap_or(f64::NAN),
            current_price: ticker_price,
        }
    }
}

fn last(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}

/// Trailing simple moving average, defined once the window is full.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let mut sum: f64 = values[..period].iter().sum();
    out[period - 1] = Some(sum / period as f64);
    for i in period..values.len() {
        sum += values[i] - values[i - period];
        out[i] = Some(sum / period as f64);
    }
    out
}

/// Exponential moving average seeded with the SMA of the first `period`
/// values, defined from index `period - 1` on.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut current = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(current);
    for i in period..values.len() {
        current = alpha * values[i] + (1.0 - alpha) * current;
        out[i] = Some(current);
    }
    out
}

/// MACD line (fast EMA minus slow EMA) and its signal line (EMA of the
/// defined portion of the MACD line).
pub fn macd(
    values: &[f64],
    fast: usize,
    slow: usize,
    signal: usize,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let fast_ema = ema(values, fast);
    let slow_ema = ema(values, slow);
    let line: Vec<Option<f64>> = fast_ema
        .iter()
        .zip(&slow_ema)
        .map(|(f, s)| match (f, s) {
            (Some(f), Some(s)) => Some(f - s),
            _ => None,
        })
        .collect();

    let defined: Vec<f64> = line.iter().flatten().copied().collect();
    let offset = line.len() - defined.len();
    let mut signal_line = vec![None; line.len()];
    for (i, value) in ema(&defined, signal).into_iter().enumerate() {
        signal_line[offset + i] = value;
    }
    (line, signal_line)
}

/// Wilder relative strength index. The first value needs `period + 1`
/// closes: the seed averages the first `period` deltas, then the recursive
/// form `avg = (avg * (period - 1) + current) / period` takes over.
pub fn rsi(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() <= period {
        return out;
    }
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    for i in 1..=period {
        let delta = values[i] - values[i - 1];
        if delta > 0.0 {
            avg_gain += delta;
        } else {
            avg_loss -= delta;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;
    out[period] = Some(rsi_value(avg_gain, avg_loss));

    for i in period + 1..values.len() {
        let delta = values[i] - values[i - 1];
        let (gain, loss) = if delta > 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;
        out[i] = Some(rsi_value(avg_gain, avg_loss));
    }
    out
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        // flat window reads neutral, pure gains saturate
        if avg_gain == 0.0 { 50.0 } else { 100.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

/// Bollinger bands: SMA(period) plus/minus `k` population standard
/// deviations over the same window.
pub fn bollinger(
    values: &[f64],
    period: usize,
    k: f64,
) -> (Vec<Option<f64>>, Vec<Option<f64>>) {
    let mut upper = vec![None; values.len()];
    let mut lower = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return (upper, lower);
    }
    for i in period - 1..values.len() {
        let window = &values[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance =
            window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / period as f64;
        let band = k * variance.sqrt();
        upper[i] = Some(mean + band);
        lower[i] = Some(mean - band);
    }
    (upper, lower)
}

/// Wilder average directional index from high/low/close. True range and
/// directional movement are Wilder-smoothed over `period` bars, DX is
/// derived from the DI spread, and ADX is a Wilder average of DX over
/// `period` more bars, so the first value lands at index `2 * period - 1`.
pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let len = closes.len();
    let mut out = vec![None; len];
    if period == 0 || len < 2 * period {
        return out;
    }

    let mut tr = Vec::with_capacity(len - 1);
    let mut plus_dm = Vec::with_capacity(len - 1);
    let mut minus_dm = Vec::with_capacity(len - 1);
    for i in 1..len {
        let up = highs[i] - highs[i - 1];
        let down = lows[i - 1] - lows[i];
        plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
        minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
        let range = (highs[i] - lows[i])
            .max((highs[i] - closes[i - 1]).abs())
            .max((lows[i] - closes[i - 1]).abs());
        tr.push(range);
    }

    let mut tr_sum: f64 = tr[..period].iter().sum();
    let mut plus_sum: f64 = plus_dm[..period].iter().sum();
    let mut minus_sum: f64 = minus_dm[..period].iter().sum();
    let mut dx_values = vec![dx(plus_sum, minus_sum, tr_sum)];
    for i in period..tr.len() {
        tr_sum = tr_sum - tr_sum / period as f64 + tr[i];
        plus_sum = plus_sum - plus_sum / period as f64 + plus_dm[i];
        minus_sum = minus_sum - minus_sum / period as f64 + minus_dm[i];
        dx_values.push(dx(plus_sum, minus_sum, tr_sum));
    }

    // dx_values[m] belongs to candle index `period + m`
    let mut current = dx_values[..period].iter().sum::<f64>() / period as f64;
    out[2 * period - 1] = Some(current);
    for m in period..dx_values.len() {
        current = (current * (period as f64 - 1.0) + dx_values[m]) / period as f64;
        out[period + m] = Some(current);
    }
    out
}

fn dx(plus_sum: f64, minus_sum: f64, tr_sum: f64) -> f64 {
    if tr_sum == 0.0 {
        return 0.0;
    }
    let plus_di = 100.0 * plus_sum / tr_sum;
    let minus_di = 100.0 * minus_sum / tr_sum;
    let di_sum = plus_di + minus_di;
    if di_sum == 0.0 {
        0.0
    } else {
        100.0 * (plus_di - minus_di).abs() / di_sum
    }
}
