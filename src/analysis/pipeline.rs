use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use tracing::{info, warn};

use crate::analysis::analyzer::{AnalysisResult, SymbolAnalyzer};
use crate::config::AnalysisConfig;
use crate::errors::AppResult;
use crate::marketdata::provider::MarketDataSource;

pub struct AnalysisPipeline {
    provider: Arc<dyn MarketDataSource>,
    cfg: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(provider: Arc<dyn MarketDataSource>, cfg: AnalysisConfig) -> Self {
        Self { provider, cfg }
    }

    /// One scan wave: discover the symbol universe, fan out one analysis
    /// task per eligible symbol, join the whole batch, drop failures.
    ///
    /// Catalog retrieval failure is fatal to the run. Per-symbol failures
    /// are logged and skipped. `buffered` caps in-flight provider requests
    /// at the configured limit and keeps results in symbol-list order.
    /// Dropping the returned future cancels all outstanding tasks.
    pub async fn run(&self) -> AppResult<Vec<AnalysisResult>> {
        let symbols = self.provider.list_symbols().await?;
        let marker = format!("/{}", self.cfg.quote_currency);
        let eligible: Vec<String> = symbols.into_iter().filter(|s| s.contains(&marker)).collect();
        info!(
            symbols = eligible.len(),
            quote = %self.cfg.quote_currency,
            "scanning symbol universe"
        );

        let analyzer = Arc::new(SymbolAnalyzer::new(self.provider.clone(), &self.cfg));
        let outcomes: Vec<_> = stream::iter(eligible)
            .map(|symbol| {
                let analyzer = analyzer.clone();
                async move { analyzer.analyze(symbol).await }
            })
            .buffered(self.cfg.fetch_concurrency())
            .collect()
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(result) => results.push(result),
                Err(failure) => {
                    warn!(symbol = %failure.symbol, error = %failure.cause, "symbol skipped");
                }
            }
        }
        Ok(results)
    }
}
