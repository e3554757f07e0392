//! Search parameter registry.
//!
//! The compiler only needs read access to resolved definitions, expressed by
//! [`SearchParameterResolver`]. [`InMemorySearchParameterRegistry`] is the
//! stock implementation, indexed by (resource type, parameter name) and
//! populated from compiled definition files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::types::SearchParamType;

/// Secondary requirement on a sibling field of the same array element.
///
/// Serialized as the triple `[field, operator, value]`, e.g.
/// `["type", "=", "email"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "(String, String, String)",
    into = "(String, String, String)"
)]
pub struct Condition {
    /// Sibling field name.
    pub field: String,
    /// Operator placeholder; not interpreted.
    pub operator: String,
    /// Value the sibling field must match.
    pub value: String,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

impl From<(String, String, String)> for Condition {
    fn from((field, operator, value): (String, String, String)) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }
}

impl From<Condition> for (String, String, String) {
    fn from(c: Condition) -> Self {
        (c.field, c.operator, c.value)
    }
}

/// One indexed field a search parameter maps onto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledSearchParam {
    /// Resource type owning the field.
    pub resource_type: String,
    /// Dotted path of the indexed field (e.g. `name`, `telecom.value`).
    pub path: String,
    /// Optional sibling-field requirement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    /// Target resource types, for reference parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target: Vec<String>,
}

impl CompiledSearchParam {
    pub fn new(resource_type: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            path: path.into(),
            condition: None,
            target: Vec::new(),
        }
    }

    /// Attaches a sibling-field condition.
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Sets target types for reference parameters.
    pub fn with_targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target = targets.into_iter().map(Into::into).collect();
        self
    }
}

/// Complete definition of a search parameter for one resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParameterDefinition {
    /// Resource type the parameter is defined on.
    pub resource_type: String,
    /// Parameter code as used in the query string (e.g. "name").
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub param_type: SearchParamType,
    /// Canonical URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Indexed fields; all of them must match a single value.
    pub compiled: Vec<CompiledSearchParam>,
}

impl SearchParameterDefinition {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        param_type: SearchParamType,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            param_type,
            url: None,
            description: None,
            compiled: Vec::new(),
        }
    }

    /// Appends a compiled descriptor.
    pub fn with_compiled(mut self, compiled: CompiledSearchParam) -> Self {
        self.compiled.push(compiled);
        self
    }

    /// Appends a descriptor for `path` on this definition's resource type.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        let compiled = CompiledSearchParam::new(self.resource_type.clone(), path);
        self.with_compiled(compiled)
    }
}

/// Read-only lookup of search parameter definitions.
pub trait SearchParameterResolver {
    /// Resolves `(resource_type, name)` to its definition.
    fn resolve(&self, resource_type: &str, name: &str) -> Option<Arc<SearchParameterDefinition>>;
}

impl<T: SearchParameterResolver + ?Sized> SearchParameterResolver for &T {
    fn resolve(&self, resource_type: &str, name: &str) -> Option<Arc<SearchParameterDefinition>> {
        (**self).resolve(resource_type, name)
    }
}

impl<T: SearchParameterResolver + ?Sized> SearchParameterResolver for Arc<T> {
    fn resolve(&self, resource_type: &str, name: &str) -> Option<Arc<SearchParameterDefinition>> {
        (**self).resolve(resource_type, name)
    }
}

/// Error during registry population.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// A definition for this (resource type, name) already exists.
    #[error("search parameter '{name}' already registered for {resource_type}")]
    Duplicate { resource_type: String, name: String },

    /// The definitions file could not be read.
    #[error("failed to read search parameters from '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The definitions document is not valid.
    #[error("invalid search parameter definitions: {0}")]
    Parse(#[from] serde_json::Error),
}

/// In-memory registry of search parameter definitions.
#[derive(Default)]
pub struct InMemorySearchParameterRegistry {
    /// Definitions indexed by resource type, then parameter name.
    params_by_type: HashMap<String, HashMap<String, Arc<SearchParameterDefinition>>>,
}

impl InMemorySearchParameterRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from definitions, rejecting duplicates.
    pub fn from_definitions<I>(definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = SearchParameterDefinition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Parses a JSON array of definitions.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let definitions: Vec<SearchParameterDefinition> = serde_json::from_str(json)?;
        let registry = Self::from_definitions(definitions)?;
        debug!(params = registry.len(), "Loaded search parameter definitions");
        Ok(registry)
    }

    /// Reads a JSON array of definitions from a file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Registers a definition.
    pub fn register(&mut self, definition: SearchParameterDefinition) -> Result<(), RegistryError> {
        let by_name = self
            .params_by_type
            .entry(definition.resource_type.clone())
            .or_default();

        if by_name.contains_key(&definition.name) {
            return Err(RegistryError::Duplicate {
                resource_type: definition.resource_type,
                name: definition.name,
            });
        }

        by_name.insert(definition.name.clone(), Arc::new(definition));
        Ok(())
    }

    /// Returns the number of registered definitions.
    pub fn len(&self) -> usize {
        self.params_by_type.values().map(HashMap::len).sum()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns all resource types that have registered parameters.
    pub fn resource_types(&self) -> Vec<String> {
        self.params_by_type.keys().cloned().collect()
    }

    /// Gets all definitions for a resource type.
    pub fn params_for(&self, resource_type: &str) -> Vec<Arc<SearchParameterDefinition>> {
        self.params_by_type
            .get(resource_type)
            .map(|params| params.values().cloned().collect())
            .unwrap_or_default()
    }
}

impl SearchParameterResolver for InMemorySearchParameterRegistry {
    fn resolve(&self, resource_type: &str, name: &str) -> Option<Arc<SearchParameterDefinition>> {
        self.params_by_type
            .get(resource_type)
            .and_then(|params| params.get(name))
            .cloned()
    }
}

impl std::fmt::Debug for InMemorySearchParameterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySearchParameterRegistry")
            .field("params_count", &self.len())
            .field(
                "resource_types",
                &self.params_by_type.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
