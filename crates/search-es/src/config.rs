//! Compiler configuration.
//!
//! # Example
//!
//! ```rust
//! use helios_search_es::CompilerConfig;
//!
//! let config = CompilerConfig::default();
//! assert!(!config.is_searchable("_count"));
//! assert!(config.is_searchable("name"));
//!
//! let config: CompilerConfig =
//!     serde_json::from_str(r#"{ "baseUrl": "https://fhir.example.org" }"#).unwrap();
//! assert!(!config.is_searchable("_sort"));
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Query parameters that control paging, formatting and result shaping.
/// They are not backed by an indexed field.
pub const DEFAULT_NON_SEARCHABLE_PARAMETERS: &[&str] = &[
    "_count",
    "_offset",
    "_cursor",
    "_sort",
    "_total",
    "_summary",
    "_elements",
    "_include",
    "_revinclude",
    "_contained",
    "_containedType",
    "_format",
    "_getpagesoffset",
    "_pretty",
];

/// Configuration shared by the query and sort compilers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    /// Parameters silently excluded from compilation.
    pub non_searchable_parameters: HashSet<String>,

    /// Base URL of the FHIR server, used to relate absolute and relative
    /// references.
    pub base_url: Option<String>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            non_searchable_parameters: DEFAULT_NON_SEARCHABLE_PARAMETERS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            base_url: None,
        }
    }
}

impl CompilerConfig {
    /// Sets the server base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds a parameter to the non-searchable set.
    pub fn with_non_searchable(mut self, name: impl Into<String>) -> Self {
        self.non_searchable_parameters.insert(name.into());
        self
    }

    /// Returns true if `name` should be compiled into the query.
    pub fn is_searchable(&self, name: &str) -> bool {
        !self.non_searchable_parameters.contains(name)
    }
}
