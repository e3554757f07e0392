//! Token parameter handler for Elasticsearch.

use serde_json::{Value, json};

use crate::query::Query;
use crate::registry::CompiledSearchParam;

/// A parsed `[system]|[code]` token value.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TokenValue<'a> {
    system: Option<&'a str>,
    code: Option<&'a str>,
    /// `|code`: the matched element must have no system.
    no_system: bool,
}

fn parse_token(value: &str) -> TokenValue<'_> {
    match value.split_once('|') {
        Some(("", code)) => TokenValue {
            system: None,
            code: Some(code),
            no_system: true,
        },
        Some((system, "")) => TokenValue {
            system: Some(system),
            code: None,
            no_system: false,
        },
        Some((system, code)) => TokenValue {
            system: Some(system),
            code: Some(code),
            no_system: false,
        },
        None => TokenValue {
            system: None,
            code: Some(value),
            no_system: false,
        },
    }
}

/// Builds an ES query clause for a token search parameter.
///
/// The same parameter may point at a `code`, `Coding`, `CodeableConcept`,
/// `Identifier` or `ContactPoint`, so the code is matched against every field
/// those types keep it in.
pub fn build_query(compiled: &CompiledSearchParam, value: &str) -> Query {
    let path = &compiled.path;
    let token = parse_token(value);
    let mut conditions: Vec<Value> = Vec::new();

    if let Some(system) = token.system {
        conditions.push(json!({
            "match": { format!("{}.system.keyword", path): system }
        }));
    }

    if let Some(code) = token.code {
        conditions.push(json!({
            "multi_match": {
                "fields": [
                    format!("{}.code.keyword", path),
                    format!("{}.coding.code.keyword", path),
                    format!("{}.value.keyword", path),
                    format!("{}.keyword", path),
                    path
                ],
                "query": code,
                "lenient": true
            }
        }));
    }

    if token.no_system {
        conditions.push(json!({
            "bool": {
                "must_not": {
                    "exists": { "field": format!("{}.system", path) }
                }
            }
        }));
    }

    match <[Value; 1]>::try_from(conditions) {
        Ok([single]) => Query::leaf(single),
        Err(conditions) => Query::must(conditions.into_iter().map(Query::leaf).collect()),
    }
}
