//! Query tree produced by the compiler.
//!
//! Leaves are opaque Query DSL fragments owned by the type constructors. The
//! compiler only ever composes them with [`BoolQuery`] nodes and the
//! [`Query::All`] conjunction list.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value, json};

/// A composable Elasticsearch query clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// Opaque Query DSL produced by a type constructor.
    Leaf(Value),
    /// A `bool` node.
    Bool(BoolQuery),
    /// Clauses that must all match, emitted for parameters that compile to
    /// more than one descriptor. Spliced into an enclosing `must`/`filter`.
    All(Vec<Query>),
}

/// The `bool` compound query. Absent lists are omitted from the output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Option<Vec<Query>>,
    pub should: Option<Vec<Query>>,
    pub filter: Option<Vec<Query>>,
}

impl Query {
    /// Wraps raw Query DSL.
    pub fn leaf(value: Value) -> Self {
        Query::Leaf(value)
    }

    /// `{ bool: { must: [...] } }`
    pub fn must(clauses: Vec<Query>) -> Self {
        Query::Bool(BoolQuery {
            must: Some(clauses),
            ..Default::default()
        })
    }

    /// `{ bool: { should: [...] } }`
    pub fn should(clauses: Vec<Query>) -> Self {
        Query::Bool(BoolQuery {
            should: Some(clauses),
            ..Default::default()
        })
    }

    /// A query matching no document.
    pub fn match_none() -> Self {
        Query::Leaf(json!({ "match_none": {} }))
    }

    /// Returns the bool node, if this is one.
    pub fn as_bool(&self) -> Option<&BoolQuery> {
        match self {
            Query::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Renders the query as Elasticsearch Query DSL.
    pub fn to_json(&self) -> Value {
        match self {
            Query::Leaf(value) => value.clone(),
            Query::Bool(b) => b.to_json(),
            Query::All(clauses) => json!({ "bool": { "must": conjunction(clauses) } }),
        }
    }
}

impl BoolQuery {
    /// Renders `{ "bool": { ... } }`.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(filter) = &self.filter {
            body.insert("filter".to_string(), Value::Array(conjunction(filter)));
        }
        if let Some(must) = &self.must {
            body.insert("must".to_string(), Value::Array(conjunction(must)));
        }
        if let Some(should) = &self.should {
            body.insert(
                "should".to_string(),
                Value::Array(should.iter().map(Query::to_json).collect()),
            );
        }
        json!({ "bool": Value::Object(body) })
    }
}

/// Renders clauses of an AND context, splicing nested `All` lists in place.
fn conjunction(clauses: &[Query]) -> Vec<Value> {
    let mut out = Vec::with_capacity(clauses.len());
    for clause in clauses {
        match clause {
            Query::All(inner) => out.extend(conjunction(inner)),
            other => out.push(other.to_json()),
        }
    }
    out
}

impl From<Value> for Query {
    fn from(value: Value) -> Self {
        Query::Leaf(value)
    }
}

impl Serialize for Query {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(field: &str, value: &str) -> Query {
        Query::leaf(json!({ "term": { field: value } }))
    }

    #[test]
    fn test_leaf_renders_verbatim() {
        let q = term("gender", "male");
        assert_eq!(q.to_json(), json!({ "term": { "gender": "male" } }));
    }

    #[test]
    fn test_bool_omits_absent_lists() {
        let q = Query::should(vec![term("a", "1"), term("a", "2")]);
        assert_eq!(
            q.to_json(),
            json!({ "bool": { "should": [
                { "term": { "a": "1" } },
                { "term": { "a": "2" } }
            ] } })
        );
    }

    #[test]
    fn test_all_is_spliced_into_must() {
        let q = Query::Bool(BoolQuery {
            filter: Some(vec![]),
            must: Some(vec![
                Query::All(vec![term("a", "1"), term("b", "1")]),
                term("c", "1"),
            ]),
            should: None,
        });
        assert_eq!(
            q.to_json(),
            json!({ "bool": {
                "filter": [],
                "must": [
                    { "term": { "a": "1" } },
                    { "term": { "b": "1" } },
                    { "term": { "c": "1" } }
                ]
            } })
        );
    }

    #[test]
    fn test_all_inside_should_becomes_must() {
        let q = Query::should(vec![
            Query::All(vec![term("a", "1"), term("b", "1")]),
            Query::All(vec![term("a", "2"), term("b", "2")]),
        ]);
        let rendered = q.to_json();
        assert_eq!(
            rendered["bool"]["should"][0],
            json!({ "bool": { "must": [
                { "term": { "a": "1" } },
                { "term": { "b": "1" } }
            ] } })
        );
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let q = Query::must(vec![term("x", "y")]);
        assert_eq!(serde_json::to_value(&q).unwrap(), q.to_json());
    }
}
