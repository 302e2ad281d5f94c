//! # tributary
//!
//! Multi-source configuration aggregation with live reload.
//!
//! Configuration is pulled from heterogeneous sources (files, environment
//! variables, HTTP key/value endpoints — anything implementing
//! [`Resource`]), decoded into a canonical structured form, merged with
//! last-writer-wins precedence over top-level keys, and deserialized onto a
//! caller-defined configuration type.
//!
//! [`load`] runs that pipeline once. [`watch`] keeps it running: every
//! source is observed for changes, change bursts are debounced onto a fixed
//! one-second tick, and each dirty tick triggers a full reload whose result
//! is republished as a fresh typed snapshot. Failed reloads are retried on
//! every tick until they succeed or the session is stopped.

pub mod load;
pub mod merge;
pub mod watch;

pub use load::{from_document, load};
pub use merge::merge;
pub use watch::{RELOAD_INTERVAL, watch};

pub use tributary_core::{
    Decoder, DecoderRegistry, Resource, Result, StopHandle, TributaryError, Value,
};
