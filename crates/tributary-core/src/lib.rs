//! # tributary-core
//!
//! Core types, traits, and contracts for the tributary configuration engine.
//! This crate defines the shared vocabulary used by every other crate in the
//! workspace: the structured value model, the error taxonomy, the decoder
//! registry, and the resource (configuration source) contract.

pub mod decoder;
pub mod error;
pub mod resource;
pub mod value;

pub use decoder::{Decoder, DecoderRegistry};
pub use error::{Result, TributaryError};
pub use resource::{Resource, StopHandle};
pub use value::Value;
