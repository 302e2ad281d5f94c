//! One-shot aggregated load: fetch every resource, merge, map onto a typed
//! configuration object.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use tributary_core::{Resource, Result, TributaryError, Value};

use crate::merge::merge;

/// Load every resource strictly in the given order, merge the documents, and
/// deserialize the merged map onto a fresh `T`.
///
/// Fail-fast: the first resource, decode, merge, or mapping error aborts the
/// whole load; no partial configuration is ever returned. Nothing is cached;
/// every call re-fetches every resource from scratch.
pub async fn load<T>(cancel: &CancellationToken, resources: &[Arc<dyn Resource>]) -> Result<T>
where
    T: DeserializeOwned,
{
    if cancel.is_cancelled() {
        return Err(TributaryError::Cancelled);
    }
    let mut documents = Vec::with_capacity(resources.len());
    for resource in resources {
        documents.push(resource.load(cancel).await?);
    }
    from_document(merge(&documents)?)
}

/// Map a merged document onto a typed configuration object.
pub fn from_document<T>(document: Value) -> Result<T>
where
    T: DeserializeOwned,
{
    let json: serde_json::Value = document.into();
    serde_json::from_value(json).map_err(|e| TributaryError::SchemaMapping(e.to_string()))
}
