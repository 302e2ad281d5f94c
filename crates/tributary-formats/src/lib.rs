//! # tributary-formats
//!
//! Built-in decoders for the tributary configuration engine: JSON, YAML,
//! TOML, and line-oriented `KEY=VALUE` text ("env"). [`default_registry`]
//! returns a registry with all of them registered.

pub mod env;
pub mod json;
pub mod toml;
pub mod yaml;

use std::sync::Arc;

use tributary_core::{DecoderRegistry, Result, TributaryError, Value};

pub use self::env::EnvDecoder;
pub use self::json::JsonDecoder;
pub use self::toml::TomlDecoder;
pub use self::yaml::YamlDecoder;

/// A registry with every built-in decoder registered under its usual
/// format identifier (plus the `yml` alias for YAML).
pub fn default_registry() -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    registry.register("json", Arc::new(JsonDecoder));
    registry.register("yaml", Arc::new(YamlDecoder));
    registry.register("yml", Arc::new(YamlDecoder));
    registry.register("toml", Arc::new(TomlDecoder));
    registry.register("env", Arc::new(EnvDecoder));
    registry
}

/// Enforce the map-shaped top level invariant shared by all decoders.
pub(crate) fn require_map(format: &str, value: Value) -> Result<Value> {
    if value.is_map() {
        Ok(value)
    } else {
        Err(TributaryError::decode(
            format,
            format!("top-level value must be a map, got {}", value.kind()),
        ))
    }
}
