//! Format decoders and the registry that resolves them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::Result;
use crate::value::Value;

/// A format-specific parser producing a [`Value`] from raw bytes.
///
/// `parse` is pure and stateless. The top-level value must be `Value::Map`;
/// implementations return a `Decode` error for any other shape, carrying the
/// offending line or offset where the underlying parser reports one.
pub trait Decoder: Send + Sync {
    fn parse(&self, data: &[u8]) -> Result<Value>;
}

/// Maps a format identifier (e.g. `"json"`, `"toml"`) to a decoder.
///
/// Built once at process start and passed by reference into resource
/// constructors. Registration is expected to finish before any resource is
/// constructed; lookups after that are read-only.
#[derive(Default)]
pub struct DecoderRegistry {
    decoders: HashMap<String, Arc<dyn Decoder>>,
}

impl DecoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder under a format identifier, replacing any previous
    /// registration for that identifier.
    pub fn register(&mut self, format: impl Into<String>, decoder: Arc<dyn Decoder>) {
        let format = format.into();
        debug!(format = %format, "registering decoder");
        self.decoders.insert(format, decoder);
    }

    pub fn resolve(&self, format: &str) -> Option<Arc<dyn Decoder>> {
        self.decoders.get(format).cloned()
    }
}

impl fmt::Debug for DecoderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderRegistry")
            .field("formats", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}
