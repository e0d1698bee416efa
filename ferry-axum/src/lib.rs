//! ferry-axum: file delivery over Axum.
//!
//! Serves objects from a [`ferry_blob::Datasource`] with byte-range support,
//! content negotiation and streaming compression.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ferry_axum::{axum, CompressionConfig, Delivery, RawResolver};
//! use ferry_blob::{connect, DatasourceConfig, LocalConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let datasource = connect(DatasourceConfig::Local(LocalConfig::new("./uploads"))).await?;
//! let delivery = Delivery::new(datasource, CompressionConfig::enabled());
//!
//! axum(delivery, Arc::new(RawResolver))
//!     .service("/health", || async { "ok" })
//!     .listen("127.0.0.1:3000")
//!     .await
//! # }
//! ```

pub mod app;
pub mod config;
pub mod delivery;
pub mod files;
pub mod params;
pub mod resolver;
pub mod state;
mod error;

pub use app::{axum, AxumApp, REQUEST_ID_HEADER};
pub use config::CompressionConfig;
pub use delivery::{CompressionChoice, Delivery, DeliveryDecision, DeliveryRequest};
pub use error::FerryAxumError;
pub use params::{DeliveryParams, NO_COMPRESS_HEADER};
pub use resolver::{ObjectResolver, RawResolver, StaticResolver, StoredObject};
pub use state::FerryAxumState;
