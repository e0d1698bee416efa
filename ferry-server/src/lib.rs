pub mod config;

use std::sync::Arc;

use anyhow::Result;
use ferry_axum::{axum, AxumApp, Delivery, RawResolver};
use ferry_core::ConfigSnapshot;
use tracing::info;

/// Connect the configured datasource and assemble the routes.
pub async fn build(config: &ConfigSnapshot) -> Result<AxumApp> {
    let datasource = ferry_blob::connect(config::datasource(config)?).await?;
    let compression = config::compression(config)?;
    info!(
        backend = datasource.name(),
        compression = compression.enabled,
        threshold = compression.threshold,
        "delivery configured"
    );

    let ax = axum(Delivery::new(datasource, compression), Arc::new(RawResolver))
        .service("/health", || async { "ok" });

    Ok(ax)
}
