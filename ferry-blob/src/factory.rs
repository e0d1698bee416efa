use std::sync::Arc;

use tracing::info;

use crate::{Datasource, DatasourceConfig, LocalDatasource, S3Datasource, StorageResult};

/// Build the process-wide datasource handle from configuration.
///
/// Called once at startup; the returned handle is shared, never rebuilt.
pub async fn connect(config: DatasourceConfig) -> StorageResult<Arc<dyn Datasource>> {
    match config {
        DatasourceConfig::Local(local) => {
            let datasource = LocalDatasource::open(local).await?;
            info!(root = %datasource.root().display(), "using local datasource");
            Ok(Arc::new(datasource))
        }
        DatasourceConfig::S3(s3) => {
            info!(bucket = %s3.bucket, endpoint = ?s3.endpoint_url(), "using s3 datasource");
            let datasource = S3Datasource::connect(s3).await?;
            Ok(Arc::new(datasource))
        }
    }
}
