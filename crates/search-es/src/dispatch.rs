//! Type dispatch for a single compiled descriptor and value.

use serde_json::json;

use crate::query::Query;
use crate::registry::{CompiledSearchParam, Condition};
use crate::types::SearchParamType;

/// Builds the query for one descriptor and one value, per declared type.
///
/// Implementations own the shape of the produced clauses; the compiler only
/// nests them.
pub trait TypeQueryBuilder {
    fn string_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query;
    fn date_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query;
    fn token_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query;
    fn number_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query;
    fn quantity_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query;
    fn reference_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query;
}

/// Dispatches `value` to the constructor for `param_type`.
///
/// `composite`, `special`, `uri` and unrecognised types use the string
/// constructor. A descriptor carrying a [`Condition`] is wrapped so that the
/// sibling field must match as well.
pub fn build_type_query<B>(
    builder: &B,
    param_type: SearchParamType,
    compiled: &CompiledSearchParam,
    value: &str,
) -> Query
where
    B: TypeQueryBuilder + ?Sized,
{
    let query = match param_type {
        SearchParamType::String => builder.string_query(compiled, value),
        SearchParamType::Date => builder.date_query(compiled, value),
        SearchParamType::Token => builder.token_query(compiled, value),
        SearchParamType::Number => builder.number_query(compiled, value),
        SearchParamType::Quantity => builder.quantity_query(compiled, value),
        SearchParamType::Reference => builder.reference_query(compiled, value),
        SearchParamType::Composite
        | SearchParamType::Special
        | SearchParamType::Uri
        | SearchParamType::Other => builder.string_query(compiled, value),
    };

    match &compiled.condition {
        Some(condition) => Query::must(vec![query, condition_query(condition)]),
        None => query,
    }
}

/// Matches the condition value on the sibling field.
///
/// This is not a nested query: the two matches may come from different
/// elements of the same array, so results can over-match but never
/// under-match.
fn condition_query(condition: &Condition) -> Query {
    let field = &condition.field;
    Query::leaf(json!({
        "multi_match": {
            "fields": [field, format!("{}.*", field)],
            "query": condition.value,
            "lenient": true
        }
    }))
}
