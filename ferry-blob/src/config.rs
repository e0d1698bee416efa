use std::path::PathBuf;

/// Which backend to connect at startup, with its settings.
#[derive(Debug, Clone)]
pub enum DatasourceConfig {
    Local(LocalConfig),
    S3(S3Config),
}

/// Settings for [`LocalDatasource`](crate::LocalDatasource).
#[derive(Debug, Clone)]
pub struct LocalConfig {
    /// Root directory; created on open if missing.
    pub directory: PathBuf,
}

impl LocalConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

/// Settings for [`S3Datasource`](crate::S3Datasource).
#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    /// Host name or full URL of an S3-compatible endpoint. `None` uses AWS.
    pub endpoint: Option<String>,
    pub port: Option<u16>,
    pub use_ssl: bool,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Path-style addressing (`endpoint/bucket/key`), needed by most self-hosted stores.
    pub force_path_style: bool,
}

impl S3Config {
    pub fn new(
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: None,
            port: None,
            use_ssl: true,
            region: "us-east-1".to_string(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            force_path_style: false,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_ssl(mut self, use_ssl: bool) -> Self {
        self.use_ssl = use_ssl;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_path_style(mut self, force_path_style: bool) -> Self {
        self.force_path_style = force_path_style;
        self
    }

    /// Endpoint URL handed to the SDK.
    ///
    /// A bare host gets a scheme from `use_ssl` and the optional port; a value
    /// that already carries a scheme is used as given.
    pub fn endpoint_url(&self) -> Option<String> {
        let endpoint = self.endpoint.as_deref()?.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            return None;
        }
        if endpoint.contains("://") {
            return Some(endpoint.to_string());
        }

        let scheme = if self.use_ssl { "https" } else { "http" };
        Some(match self.port {
            Some(port) => format!("{scheme}://{endpoint}:{port}"),
            None => format!("{scheme}://{endpoint}"),
        })
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("region", &self.region)
            .field("access_key_id", &"***")
            .field("secret_access_key", &"***")
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_host_gets_scheme_and_port() {
        let config = S3Config::new("files", "key", "secret")
            .with_endpoint("minio.local")
            .with_port(9000)
            .with_ssl(false);
        assert_eq!(config.endpoint_url().as_deref(), Some("http://minio.local:9000"));
    }

    #[test]
    fn full_url_is_kept() {
        let config = S3Config::new("files", "key", "secret")
            .with_endpoint("https://s3.example.com/")
            .with_port(9000);
        assert_eq!(config.endpoint_url().as_deref(), Some("https://s3.example.com"));
    }

    #[test]
    fn no_endpoint_means_aws() {
        let config = S3Config::new("files", "key", "secret");
        assert_eq!(config.endpoint_url(), None);
        assert_eq!(config.region, "us-east-1");
    }

    #[test]
    fn debug_hides_credentials() {
        let config = S3Config::new("files", "AKIA123", "topsecret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("AKIA123"));
        assert!(!rendered.contains("topsecret"));
    }
}
