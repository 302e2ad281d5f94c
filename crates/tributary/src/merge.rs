//! Document merging.

use std::collections::BTreeMap;

use tributary_core::{Result, TributaryError, Value};

/// Merge map-shaped documents into one, in input order.
///
/// The merge is shallow at the top level: a last-writer-wins union of
/// top-level keys, never a recursive deep merge. When two documents both
/// define a key whose value is a map, the later document's entire subtree
/// replaces the earlier one's wholesale. Callers structure multi-source
/// precedence (file defaults, environment overrides) around this
/// overwrite-by-key rule, so it must stay exactly as is.
///
/// Values are copied in full; the result shares no storage with any input.
/// An empty input yields an empty map. A non-map document is a `Merge` error.
pub fn merge(documents: &[Value]) -> Result<Value> {
    let mut merged = BTreeMap::new();
    for document in documents {
        let Value::Map(fields) = document else {
            return Err(TributaryError::Merge(format!(
                "document must be a map, got {}",
                document.kind()
            )));
        };
        for (key, value) in fields {
            merged.insert(key.clone(), value.clone());
        }
    }
    Ok(Value::Map(merged))
}
