//! YAML decoder.

use tributary_core::{Decoder, Result, TributaryError, Value};

use crate::require_map;

pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn parse(&self, data: &[u8]) -> Result<Value> {
        // Deserializing through serde_json::Value rejects the YAML shapes the
        // value model cannot represent (non-string keys, tagged values).
        let parsed: serde_json::Value = serde_yaml::from_slice(data)
            .map_err(|e| TributaryError::decode("yaml", e))?;
        require_map("yaml", parsed.into())
    }
}
