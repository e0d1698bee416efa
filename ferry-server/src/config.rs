use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use ferry_axum::CompressionConfig;
use ferry_blob::{DatasourceConfig, LocalConfig, S3Config};
use ferry_core::{ConfigSnapshot, FerryConfig};

pub const ENV_PREFIX: &str = "FERRY__";

/// Defaults overlaid with `FERRY__*` environment variables.
pub fn load() -> ConfigSnapshot {
    let mut config = FerryConfig::new();
    config.load_env(ENV_PREFIX);
    with_defaults(config).snapshot()
}

pub fn with_defaults(mut config: FerryConfig) -> FerryConfig {
    config.set_default("http.host", "127.0.0.1");
    config.set_default("http.port", "3000");
    config.set_default("compression.enabled", "false");
    config.set_default("compression.threshold", "204800");
    config.set_default("compression.drain_timeout_ms", "2000");
    config.set_default("datasource.type", "local");
    config.set_default("datasource.local.directory", "./uploads");
    config.set_default("datasource.s3.use_ssl", "true");
    config.set_default("datasource.s3.region", "us-east-1");
    config.set_default("datasource.s3.force_path_style", "false");
    config
}

pub fn listen_addr(config: &ConfigSnapshot) -> String {
    let host = config
        .get_string("http.host")
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = config.get_u16("http.port").unwrap_or(3000);
    format!("{host}:{port}")
}

pub fn compression(config: &ConfigSnapshot) -> Result<CompressionConfig> {
    let defaults = CompressionConfig::default();
    Ok(CompressionConfig {
        enabled: bool_or(config, "compression.enabled", defaults.enabled)?,
        threshold: parsed_or(config, "compression.threshold", defaults.threshold, ConfigSnapshot::get_u64)?,
        drain_timeout: Duration::from_millis(parsed_or(
            config,
            "compression.drain_timeout_ms",
            defaults.drain_timeout.as_millis() as u64,
            ConfigSnapshot::get_u64,
        )?),
    })
}

pub fn datasource(config: &ConfigSnapshot) -> Result<DatasourceConfig> {
    let kind = config
        .get_string("datasource.type")
        .unwrap_or_else(|| "local".to_string());

    match kind.trim().to_ascii_lowercase().as_str() {
        "local" => {
            let directory = config
                .get_string("datasource.local.directory")
                .unwrap_or_else(|| "./uploads".to_string());
            Ok(DatasourceConfig::Local(LocalConfig::new(directory)))
        }
        "s3" => {
            let bucket = required(config.get_string("datasource.s3.bucket"), "datasource.s3.bucket")?;
            let key = required(
                config.get_string("datasource.s3.access_key_id"),
                "datasource.s3.access_key_id",
            )?;
            let secret = required(
                config.get_string("datasource.s3.secret_access_key"),
                "datasource.s3.secret_access_key",
            )?;

            let mut s3 = S3Config::new(bucket, key, secret)
                .with_ssl(bool_or(config, "datasource.s3.use_ssl", true)?)
                .with_path_style(bool_or(config, "datasource.s3.force_path_style", false)?);
            if let Some(region) = config.get_string("datasource.s3.region") {
                s3 = s3.with_region(region);
            }
            if let Some(endpoint) = config.get_string("datasource.s3.endpoint") {
                s3 = s3.with_endpoint(endpoint);
            }
            if config.get("datasource.s3.port").is_some() {
                s3 = s3.with_port(required(config.get_u16("datasource.s3.port"), "datasource.s3.port")?);
            }
            Ok(DatasourceConfig::S3(s3))
        }
        other => bail!("Unknown datasource.type '{other}' (expected 'local' or 's3')"),
    }
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("Missing or invalid config value '{key}'"))
}

fn bool_or(config: &ConfigSnapshot, key: &str, default: bool) -> Result<bool> {
    parsed_or(config, key, default, ConfigSnapshot::get_bool)
}

fn parsed_or<T>(
    config: &ConfigSnapshot,
    key: &str,
    default: T,
    parse: fn(&ConfigSnapshot, &str) -> Option<T>,
) -> Result<T> {
    match config.get(key) {
        None => Ok(default),
        Some(_) => required(parse(config, key), key),
    }
}
