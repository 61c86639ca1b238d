use clap::Parser;
use marketscan::{App, AppResult, Settings, telemetry};

#[derive(Debug, Parser)]
#[command(version, about = "Marketscan signal scanner")]
struct Cli {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Override the configured quote-currency filter (e.g. USDT).
    #[arg(short, long)]
    quote_currency: Option<String>,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load_from(&cli.config)?;
    if let Some(quote) = cli.quote_currency {
        settings.analysis.quote_currency = quote;
    }
    telemetry::init(&settings.telemetry)?;
    App::new(settings).run().await
}
