//! Helios FHIR Server Elasticsearch Search Compiler
//!
//! This crate compiles a FHIR search request (a resource type plus raw query
//! parameters) into an Elasticsearch `bool` query. It does not talk to
//! Elasticsearch; the produced [`Query`] is rendered with [`Query::to_json`]
//! or `serde` and handed to whatever executes searches.
//!
//! # Architecture
//!
//! - [`normalize`] - coerces raw parameter values into ordered string lists
//! - [`split`] - splits a value into comma-separated OR alternatives
//! - [`dispatch`] - routes one descriptor and value to its type constructor
//! - [`parameter_handlers`] - the Elasticsearch type constructors
//! - [`compiler`] - per-parameter and per-request composition
//! - [`sort`] - `_sort` clause builder
//! - [`registry`] - search parameter definitions and lookup
//!
//! # Quick Start
//!
//! ```
//! use helios_search_es::{
//!     InMemorySearchParameterRegistry, SearchParamType, SearchParameterDefinition,
//!     SearchRequest, compile,
//! };
//! use serde_json::json;
//!
//! let registry = InMemorySearchParameterRegistry::from_definitions(vec![
//!     SearchParameterDefinition::new("Patient", "family", SearchParamType::String)
//!         .with_path("name.family"),
//! ])
//! .unwrap();
//!
//! let request = SearchRequest::from_query_string("Patient", "family=Smith,Jones&_count=10");
//! let query = compile(&registry, &request, vec![]).unwrap();
//!
//! let body = query.to_json();
//! assert_eq!(body["bool"]["must"][0]["bool"]["should"].as_array().unwrap().len(), 2);
//! assert_eq!(body["bool"]["filter"], json!([]));
//! ```

pub mod compiler;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod normalize;
pub mod parameter_handlers;
pub mod query;
pub mod registry;
pub mod sort;
pub mod split;
pub mod types;

pub use compiler::{QueryCompiler, SearchRequest, compile, compile_parameter};
pub use config::CompilerConfig;
pub use dispatch::{TypeQueryBuilder, build_type_query};
pub use error::{SearchError, SearchResult};
pub use parameter_handlers::EsTypeQueryBuilder;
pub use query::{BoolQuery, Query};
pub use registry::{
    CompiledSearchParam, Condition, InMemorySearchParameterRegistry, RegistryError,
    SearchParameterDefinition, SearchParameterResolver,
};
pub use sort::{build_sort_clause, build_sort_for_request};
pub use split::split_alternatives;
pub use types::{SearchParamType, SearchPrefix, SortDirection, SortDirective};
