//! JSON decoder.

use tributary_core::{Decoder, Result, TributaryError, Value};

use crate::require_map;

pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn parse(&self, data: &[u8]) -> Result<Value> {
        // serde_json reports line and column in its error display.
        let parsed: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| TributaryError::decode("json", e))?;
        require_map("json", parsed.into())
    }
}
