//! `_sort` clause builder.
//!
//! Independent of query compilation: resolves each sort directive against the
//! registry and emits Elasticsearch sort entries.

use serde_json::{Value, json};

use crate::compiler::SearchRequest;
use crate::error::{SearchError, SearchResult};
use crate::registry::SearchParameterResolver;
use crate::types::{SearchParamType, SortDirective};

/// Name of the sort query parameter.
pub const SORT_PARAMETER: &str = "_sort";

/// Builds the sort clause from the raw `_sort` value.
///
/// Only date parameters can be sorted on. Each of their fields yields
/// entries for the field itself and for `start`/`end`, so `Period` values
/// sort as well.
pub fn build_sort_clause<R>(
    registry: &R,
    resource_type: &str,
    raw_sort: &Value,
) -> SearchResult<Vec<Value>>
where
    R: SearchParameterResolver + ?Sized,
{
    let sort = match raw_sort {
        Value::String(s) => s,
        Value::Array(_) => {
            return Err(SearchError::invalid(
                "_sort parameter cannot be used multiple times on a search query",
            ));
        }
        _ => return Err(SearchError::invalid_value(SORT_PARAMETER)),
    };

    let mut clauses = Vec::new();
    for directive in sort
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(SortDirective::parse)
    {
        let definition = registry
            .resolve(resource_type, &directive.parameter)
            .ok_or_else(|| {
                SearchError::invalid(format!(
                    "Unknown _sort parameter value: {}. Sort parameter values must use a valid search parameter",
                    directive.parameter
                ))
            })?;

        if definition.param_type != SearchParamType::Date {
            return Err(SearchError::invalid(format!(
                "Invalid _sort parameter: {}. Only date type parameters can currently be used for sorting",
                directive.parameter
            )));
        }

        let order = directive.direction.as_es_order();
        for compiled in &definition.compiled {
            for field in [
                compiled.path.clone(),
                format!("{}.start", compiled.path),
                format!("{}.end", compiled.path),
            ] {
                clauses.push(json!({ field: { "order": order, "unmapped_type": "long" } }));
            }
        }
    }

    Ok(clauses)
}

/// Builds the sort clause for a request; empty when it has no `_sort`.
pub fn build_sort_for_request<R>(registry: &R, request: &SearchRequest) -> SearchResult<Vec<Value>>
where
    R: SearchParameterResolver + ?Sized,
{
    match request.query_params.get(SORT_PARAMETER) {
        Some(raw) => build_sort_clause(registry, &request.resource_type, raw),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{InMemorySearchParameterRegistry, SearchParameterDefinition};

    fn registry() -> InMemorySearchParameterRegistry {
        InMemorySearchParameterRegistry::from_definitions(vec![
            SearchParameterDefinition::new("Encounter", "date", SearchParamType::Date)
                .with_path("period"),
            SearchParameterDefinition::new("Encounter", "status", SearchParamType::Token)
                .with_path("status"),
        ])
        .unwrap()
    }

    #[test]
    fn test_descending_date_sort() {
        let clauses = build_sort_clause(&registry(), "Encounter", &json!("-date")).unwrap();
        assert_eq!(
            clauses,
            vec![
                json!({ "period": { "order": "desc", "unmapped_type": "long" } }),
                json!({ "period.start": { "order": "desc", "unmapped_type": "long" } }),
                json!({ "period.end": { "order": "desc", "unmapped_type": "long" } }),
            ]
        );
    }

    #[test]
    fn test_repeated_sort_rejected() {
        let err = build_sort_clause(&registry(), "Encounter", &json!(["date", "-date"]))
            .unwrap_err();
        assert!(err.message().contains("multiple times"));
    }

    #[test]
    fn test_unknown_sort_parameter() {
        let err = build_sort_clause(&registry(), "Encounter", &json!("foo")).unwrap_err();
        assert!(err.message().contains("foo"));
    }

    #[test]
    fn test_non_date_sort_rejected() {
        let err = build_sort_clause(&registry(), "Encounter", &json!("status")).unwrap_err();
        assert!(err.message().contains("Only date type"));
    }

    #[test]
    fn test_request_without_sort() {
        let request = SearchRequest::new("Encounter").with_param("status", "finished");
        assert!(build_sort_for_request(&registry(), &request).unwrap().is_empty());
    }
}
