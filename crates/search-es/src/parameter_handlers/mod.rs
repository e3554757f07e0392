//! Parameter type handlers for Elasticsearch query building.
//!
//! Each module translates one compiled descriptor and one value of a FHIR
//! search parameter type into Query DSL. [`EsTypeQueryBuilder`] plugs them
//! into the compiler.

pub mod date;
pub mod number;
pub mod quantity;
pub mod reference;
pub mod string;
pub mod token;

use crate::config::CompilerConfig;
use crate::dispatch::TypeQueryBuilder;
use crate::query::Query;
use crate::registry::CompiledSearchParam;

/// Type constructors targeting documents indexed as plain FHIR JSON.
#[derive(Debug, Clone, Default)]
pub struct EsTypeQueryBuilder {
    base_url: Option<String>,
}

impl EsTypeQueryBuilder {
    /// Creates a builder with no server base URL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder from compiler configuration.
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
        }
    }

    /// Sets the server base URL used to relate absolute and relative references.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}

impl TypeQueryBuilder for EsTypeQueryBuilder {
    fn string_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query {
        string::build_query(compiled, value)
    }

    fn date_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query {
        date::build_query(compiled, value)
    }

    fn token_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query {
        token::build_query(compiled, value)
    }

    fn number_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query {
        number::build_query(compiled, value)
    }

    fn quantity_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query {
        quantity::build_query(compiled, value)
    }

    fn reference_query(&self, compiled: &CompiledSearchParam, value: &str) -> Query {
        reference::build_query(compiled, value, self.base_url.as_deref())
    }
}
