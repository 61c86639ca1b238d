pub mod candles;
pub mod kucoin;
pub mod provider;

pub use candles::{Candle, CandleSeries};
pub use kucoin::KucoinClient;
pub use provider::{MarketDataSource, ProviderError};
