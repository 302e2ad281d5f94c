//! # tributary-sources
//!
//! Resource backends for the tributary configuration engine:
//!
//! - [`FileResource`] — a configuration file, watched via filesystem
//!   notifications.
//! - [`EnvResource`] — prefix-filtered environment variables, watched by
//!   interval polling.
//! - [`HttpResource`] — a key/value HTTP endpoint (e.g. a distributed
//!   config store's raw-value API), watched by interval polling.
//!
//! Every backend implements the byte-for-byte change-suppression discipline:
//! raw content identical to the last observed content never produces a
//! change notification.

pub mod env;
pub mod file;
pub mod http;

pub use env::EnvResource;
pub use file::FileResource;
pub use http::HttpResource;
