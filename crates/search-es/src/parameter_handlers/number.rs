//! Number parameter handler for Elasticsearch.

use serde_json::{Value, json};
use tracing::warn;

use crate::query::Query;
use crate::registry::CompiledSearchParam;
use crate::types::SearchPrefix;

/// Builds an ES query clause for a number search parameter.
///
/// Format: `[prefix]number`. Equality honours the implicit precision of the
/// value as written.
pub fn build_query(compiled: &CompiledSearchParam, value: &str) -> Query {
    let (prefix, number) = SearchPrefix::extract(value.trim());
    match range_condition(&compiled.path, prefix, number) {
        Some(condition) => Query::leaf(condition),
        None => {
            warn!(path = %compiled.path, value, "Ignoring unparseable number search value");
            Query::match_none()
        }
    }
}

/// Builds the range clause for `[prefix]number` on `field`.
///
/// Shared with the quantity handler, which ranges on `<path>.value`.
pub(crate) fn range_condition(field: &str, prefix: SearchPrefix, number: &str) -> Option<Value> {
    let num: f64 = number.parse().ok().filter(|n: &f64| n.is_finite())?;
    let precision = implicit_range(number);

    let condition = match prefix {
        SearchPrefix::Eq => json!({
            "range": { field: { "gte": num - precision, "lt": num + precision } }
        }),
        SearchPrefix::Ne => json!({
            "bool": {
                "should": [
                    { "range": { field: { "lt": num - precision } } },
                    { "range": { field: { "gte": num + precision } } }
                ]
            }
        }),
        SearchPrefix::Gt | SearchPrefix::Sa => json!({ "range": { field: { "gt": num } } }),
        SearchPrefix::Lt | SearchPrefix::Eb => json!({ "range": { field: { "lt": num } } }),
        SearchPrefix::Ge => json!({ "range": { field: { "gte": num } } }),
        SearchPrefix::Le => json!({ "range": { field: { "lte": num } } }),
        SearchPrefix::Ap => {
            // Approximately ±10%
            let margin = (num * 0.1).abs().max(precision);
            json!({
                "range": { field: { "gte": num - margin, "lte": num + margin } }
            })
        }
    };

    Some(condition)
}

/// Determines the implicit precision based on string representation.
///
/// "100" has implicit precision of 0.5 (integer)
/// "100.0" has implicit precision of 0.05
/// "100.00" has implicit precision of 0.005
pub(crate) fn implicit_range(value: &str) -> f64 {
    let mantissa = value.split(['e', 'E']).next().unwrap_or(value);
    if let Some(dot_pos) = mantissa.find('.') {
        let decimal_places = mantissa.len() - dot_pos - 1;
        0.5 * 10.0_f64.powi(-(decimal_places as i32))
    } else {
        0.5
    }
}
