//! Search request compilation.
//!
//! Turns a [`SearchRequest`] into a single `bool` query:
//!
//! ```text
//! { bool: { filter: <additional filters>, must: [ one clause per (parameter, value) ] } }
//! ```
//!
//! Within one value, comma-separated alternatives are ORed (`should`); within
//! one alternative, every compiled descriptor of the parameter must match.
//! Separate values of the same parameter (`name=a&name=b`) are ANDed.

use serde_json::{Map, Value};
use tracing::{debug, trace};
use url::form_urlencoded;

use crate::config::CompilerConfig;
use crate::dispatch::{TypeQueryBuilder, build_type_query};
use crate::error::{SearchError, SearchResult};
use crate::normalize::normalize_query_params;
use crate::parameter_handlers::EsTypeQueryBuilder;
use crate::query::{BoolQuery, Query};
use crate::registry::{SearchParameterDefinition, SearchParameterResolver};
use crate::split::split_alternatives;

/// A search against one resource type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchRequest {
    /// The resource type being searched.
    pub resource_type: String,
    /// Raw query parameters: a string or a list of strings per name.
    pub query_params: Map<String, Value>,
}

impl SearchRequest {
    /// Creates a request with no parameters.
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            query_params: Map::new(),
        }
    }

    /// Adds a raw parameter value.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(name.into(), value.into());
        self
    }

    /// Parses an `application/x-www-form-urlencoded` query string.
    ///
    /// A repeated name collects its values into a list, in order.
    pub fn from_query_string(resource_type: impl Into<String>, query: &str) -> Self {
        let mut query_params = Map::new();
        for (name, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = Value::String(value.into_owned());
            match query_params.get_mut(&*name) {
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    query_params.insert(name.into_owned(), value);
                }
            }
        }
        Self {
            resource_type: resource_type.into(),
            query_params,
        }
    }
}

/// Compiles search requests against a registry.
pub struct QueryCompiler<'a, R: ?Sized, B: ?Sized = EsTypeQueryBuilder> {
    registry: &'a R,
    builder: &'a B,
    config: &'a CompilerConfig,
}

impl<'a, R, B> QueryCompiler<'a, R, B>
where
    R: SearchParameterResolver + ?Sized,
    B: TypeQueryBuilder + ?Sized,
{
    /// Creates a new compiler.
    pub fn new(registry: &'a R, builder: &'a B, config: &'a CompilerConfig) -> Self {
        Self {
            registry,
            builder,
            config,
        }
    }

    /// Compiles a request into the top-level `bool` query.
    ///
    /// `additional_filters` are placed in `filter` unchanged. Fails on the
    /// first parameter whose value is malformed or that the registry does not
    /// know for the request's resource type.
    pub fn compile(
        &self,
        request: &SearchRequest,
        additional_filters: Vec<Query>,
    ) -> SearchResult<Query> {
        let resource_type = request.resource_type.as_str();
        let params = normalize_query_params(&request.query_params)?;
        let mut must = Vec::new();

        for (name, values) in &params {
            if !self.config.is_searchable(name) {
                trace!(param = %name, "Skipping non-searchable parameter");
                continue;
            }

            let definition = self
                .registry
                .resolve(resource_type, name)
                .ok_or_else(|| SearchError::unknown_parameter(name, resource_type))?;

            for value in values {
                must.push(compile_parameter(self.builder, &definition, value));
            }
        }

        debug!(
            resource_type,
            clauses = must.len(),
            filters = additional_filters.len(),
            "Compiled search request"
        );

        Ok(Query::Bool(BoolQuery {
            filter: Some(additional_filters),
            must: Some(must),
            should: None,
        }))
    }
}

/// Compiles a request with the stock Elasticsearch type constructors and
/// default configuration.
pub fn compile<R>(
    registry: &R,
    request: &SearchRequest,
    additional_filters: Vec<Query>,
) -> SearchResult<Query>
where
    R: SearchParameterResolver + ?Sized,
{
    let config = CompilerConfig::default();
    let builder = EsTypeQueryBuilder::from_config(&config);
    QueryCompiler::new(registry, &builder, &config).compile(request, additional_filters)
}

/// Compiles one raw value of one parameter.
///
/// Each alternative yields the bare descriptor query when the parameter has
/// a single descriptor, otherwise a [`Query::All`] of one query per
/// descriptor. Two or more alternatives are wrapped in `should`.
pub fn compile_parameter<B>(
    builder: &B,
    definition: &SearchParameterDefinition,
    value: &str,
) -> Query
where
    B: TypeQueryBuilder + ?Sized,
{
    let alternatives: Vec<Query> = split_alternatives(value)
        .iter()
        .map(|alternative| {
            let per_descriptor: Vec<Query> = definition
                .compiled
                .iter()
                .map(|compiled| {
                    build_type_query(builder, definition.param_type, compiled, alternative)
                })
                .collect();
            single_or(per_descriptor, Query::All)
        })
        .collect();

    single_or(alternatives, Query::should)
}

/// Unwraps a one-element list, otherwise combines with `wrap`.
fn single_or(queries: Vec<Query>, wrap: impl FnOnce(Vec<Query>) -> Query) -> Query {
    match <[Query; 1]>::try_from(queries) {
        Ok([single]) => single,
        Err(queries) => wrap(queries),
    }
}
