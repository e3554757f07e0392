//! Request parameter normalization.
//!
//! Depending on how the caller parsed the request, a parameter value is a
//! plain string, an array of strings, or something else entirely. This module
//! coerces the accepted shapes into an ordered list of strings per parameter.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{SearchError, SearchResult};

/// Parameter name to its ordered raw values.
pub type NormalizedParams = IndexMap<String, Vec<String>>;

/// Normalizes raw query parameters, preserving parameter and value order.
///
/// - `"Smith"` becomes `["Smith"]`
/// - `["Smith", "Jones"]` is passed through
/// - anything else (objects, numbers, mixed arrays) is rejected
pub fn normalize_query_params(params: &Map<String, Value>) -> SearchResult<NormalizedParams> {
    params
        .iter()
        .map(|(name, value)| -> SearchResult<(String, Vec<String>)> {
            Ok((name.clone(), normalize_value(name, value)?))
        })
        .collect()
}

/// Normalizes the value of a single parameter.
pub fn normalize_value(name: &str, value: &Value) -> SearchResult<Vec<String>> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                _ => Err(SearchError::invalid_value(name)),
            })
            .collect(),
        _ => Err(SearchError::invalid_value(name)),
    }
}
