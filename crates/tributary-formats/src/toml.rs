//! TOML decoder.

use std::str;

use tributary_core::{Decoder, Result, TributaryError, Value};

pub struct TomlDecoder;

impl Decoder for TomlDecoder {
    fn parse(&self, data: &[u8]) -> Result<Value> {
        let text = str::from_utf8(data).map_err(|e| TributaryError::decode("toml", e))?;
        // A TOML document is a table, so the top level is a map by
        // construction.
        let table: toml::Table =
            toml::from_str(text).map_err(|e| TributaryError::decode("toml", e))?;
        Ok(Value::Map(
            table.into_iter().map(|(k, v)| (k, from_toml(v))).collect(),
        ))
    }
}

fn from_toml(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i as f64),
        toml::Value::Float(f) => Value::Number(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => Value::Map(
            table.into_iter().map(|(k, v)| (k, from_toml(v))).collect(),
        ),
    }
}
