use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;
use trailio::config::{report_dotenv, AppConfig};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let loaded = dotenv();
    init_tracing();
    report_dotenv(loaded);
    let config = AppConfig::from_env()?;
    trailio::app::run_server(config).await
}
