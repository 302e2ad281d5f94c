//! Line-oriented `KEY=VALUE` decoder, the shape produced by the environment
//! variable backend. Every value is kept as a string.

use std::collections::BTreeMap;
use std::str;

use tributary_core::{Decoder, Result, TributaryError, Value};

pub struct EnvDecoder;

impl Decoder for EnvDecoder {
    fn parse(&self, data: &[u8]) -> Result<Value> {
        let text = str::from_utf8(data).map_err(|e| TributaryError::decode("env", e))?;
        let mut fields = BTreeMap::new();
        for (idx, line) in text.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(TributaryError::decode(
                    "env",
                    format!("line {}: missing '=' in {line:?}", idx + 1),
                ));
            };
            fields.insert(key.to_owned(), Value::String(value.to_owned()));
        }
        Ok(Value::Map(fields))
    }
}
