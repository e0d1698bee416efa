use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ferry_server::config::load();
    let addr = ferry_server::config::listen_addr(&config);
    let ax = ferry_server::build(&config).await?;

    info!(%addr, "[ferry] starting");
    ax.listen(addr).await?;

    Ok(())
}
