//! ferry-core: configuration and error primitives shared by the Ferry crates.

pub mod config;
pub mod errors;

pub use config::{ConfigSnapshot, FerryConfig};
pub use errors::{ErrorKind, FerryError, FerryResult};
