use std::sync::Arc;

use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::analysis::pipeline::AnalysisPipeline;
use crate::config::Settings;
use crate::errors::AppResult;
use crate::marketdata::kucoin::KucoinClient;
use crate::marketdata::provider::MarketDataSource;
use crate::report;

pub struct App {
    settings: Settings,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub async fn run(self) -> AppResult<()> {
        let provider: Arc<dyn MarketDataSource> =
            Arc::new(KucoinClient::new(&self.settings.provider)?);
        let pipeline = AnalysisPipeline::new(provider, self.settings.analysis.clone());

        let run_id = Uuid::new_v4();
        let results = pipeline
            .run()
            .instrument(info_span!("scan", %run_id))
            .await?;
        info!(%run_id, results = results.len(), "scan finished");

        print!("{}", report::render(&results));
        Ok(())
    }
}
