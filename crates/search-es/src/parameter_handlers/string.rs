//! String parameter handler for Elasticsearch.

use serde_json::json;

use crate::query::Query;
use crate::registry::CompiledSearchParam;

/// Builds an ES query clause for a string search parameter.
///
/// Matches the field itself and any of its sub-fields, so `name` also
/// searches `name.family`, `name.given`, etc.
pub fn build_query(compiled: &CompiledSearchParam, value: &str) -> Query {
    let path = &compiled.path;
    Query::leaf(json!({
        "multi_match": {
            "fields": [path, format!("{}.*", path)],
            "query": value,
            "lenient": true
        }
    }))
}
