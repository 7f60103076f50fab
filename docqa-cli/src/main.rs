use clap::Parser;
use docqa_cli::{Cli, app, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before parsing so `.env` values feed the `env` fallbacks.
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    telemetry::init_logging();

    app::run(cli).await
}
