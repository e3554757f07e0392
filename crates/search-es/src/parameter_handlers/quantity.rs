//! Quantity parameter handler for Elasticsearch.

use serde_json::json;
use tracing::warn;

use crate::query::Query;
use crate::registry::CompiledSearchParam;
use crate::types::SearchPrefix;

use super::number;

/// Builds an ES query clause for a quantity search parameter.
///
/// Format: `[prefix]number|system|code`, `[prefix]number||code`,
/// `[prefix]number|code` or `[prefix]number`.
pub fn build_query(compiled: &CompiledSearchParam, value: &str) -> Query {
    let path = &compiled.path;
    let (num_part, system, code) = parse_quantity_value(value.trim());
    let (prefix, num_str) = SearchPrefix::extract(num_part);

    let Some(num_condition) = number::range_condition(&format!("{}.value", path), prefix, num_str)
    else {
        warn!(path = %path, value, "Ignoring unparseable quantity search value");
        return Query::match_none();
    };

    let mut must_conditions = vec![Query::leaf(num_condition)];

    if let Some(sys) = system {
        must_conditions.push(Query::leaf(json!({
            "term": { format!("{}.system.keyword", path): sys }
        })));
    }

    if let Some(c) = code {
        let condition = if system.is_some() {
            json!({ "term": { format!("{}.code.keyword", path): c } })
        } else {
            // Without a system the code may be a UCUM code or a display unit
            json!({
                "multi_match": {
                    "fields": [format!("{}.code.keyword", path), format!("{}.unit.keyword", path)],
                    "query": c,
                    "lenient": true
                }
            })
        };
        must_conditions.push(Query::leaf(condition));
    }

    Query::must(must_conditions)
}

/// Parses a quantity value string into (number, system, code).
///
/// Formats:
/// - `5.4` -> ("5.4", None, None)
/// - `5.4|mg` -> ("5.4", None, Some("mg"))
/// - `5.4||mg` -> ("5.4", None, Some("mg"))
/// - `5.4|http://unitsofmeasure.org|mg` -> ("5.4", Some("http://..."), Some("mg"))
fn parse_quantity_value(value: &str) -> (&str, Option<&str>, Option<&str>) {
    let parts: Vec<&str> = value.splitn(3, '|').collect();
    match parts.as_slice() {
        [num] => (*num, None, None),
        [num, code] => (*num, None, non_empty(*code)),
        [num, system, code] => (*num, non_empty(*system), non_empty(*code)),
        _ => (value, None, None),
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() { None } else { Some(s) }
}
