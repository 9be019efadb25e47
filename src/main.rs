use clap::Parser;
use tracing_subscriber::EnvFilter;
use wheel_overlay::config::Config;
use wheel_overlay::error::OverlayError;

#[tokio::main]
async fn main() -> Result<(), OverlayError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::parse();
    wheel_overlay::runtime::run(config).await
}
