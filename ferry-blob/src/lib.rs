//! # ferry-blob: storage backends for file delivery
//!
//! One byte-level contract, [`Datasource`], over backends with very different
//! characteristics: a local directory and any S3-compatible object store.
//!
//! - **Streaming reads**: `get` returns a [`ByteStream`] bounded to the
//!   requested span, never the whole object in memory
//! - **Absence as a value**: missing objects are `None`, not errors
//! - **Lazy listing**: [`Datasource::list`] drives `clear` and `total_size`
//!   without buffering the full key set
//! - **Configuration-time selection**: [`connect`] turns a
//!   [`DatasourceConfig`] into one shared `Arc<dyn Datasource>`
//!
//! ```rust,no_run
//! use bytes::Bytes;
//! use ferry_blob::{connect, ByteRange, DatasourceConfig, LocalConfig, StorageResult};
//!
//! # async fn run() -> StorageResult<()> {
//! let datasource = connect(DatasourceConfig::Local(LocalConfig::new("./uploads"))).await?;
//!
//! datasource.save("hello.txt", Bytes::from_static(b"Hello, world!"), Some("text/plain")).await?;
//!
//! if let Some(size) = datasource.size("hello.txt").await? {
//!     let first_half = datasource.get("hello.txt", ByteRange::new(0, Some(size / 2))).await?;
//!     assert!(first_half.is_some());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
pub mod datasource;
mod error;
mod factory;
mod local;
mod s3;
mod types;

pub use config::{DatasourceConfig, LocalConfig, S3Config};
pub use datasource::Datasource;
pub use error::{StorageError, StorageResult};
pub use factory::connect;
pub use local::LocalDatasource;
pub use s3::S3Datasource;
pub use types::{ByteRange, ByteStream, FailedKey, ObjectEntry, ObjectStream, ResolvedRange};

/// Read buffer size for backend streams.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;
