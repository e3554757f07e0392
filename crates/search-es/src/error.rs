//! Error types for search compilation.
//!
//! Compilation surfaces a single error kind, [`SearchError::InvalidSearchParameter`],
//! raised eagerly when a request parameter cannot be turned into a query.
//! Registry population reports its own [`RegistryError`](crate::registry::RegistryError).

use thiserror::Error;

/// Errors raised while compiling a search request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// A query parameter is malformed or unknown for the resource type.
    #[error("{message}")]
    InvalidSearchParameter { message: String },
}

impl SearchError {
    /// Creates an error with a free-form message.
    pub fn invalid(message: impl Into<String>) -> Self {
        SearchError::InvalidSearchParameter {
            message: message.into(),
        }
    }

    /// The value of `name` is neither a string nor a list of strings.
    pub fn invalid_value(name: &str) -> Self {
        Self::invalid(format!(
            "Invalid search parameter: '{}' must be a string or a list of strings",
            name
        ))
    }

    /// The registry has no definition of `name` for `resource_type`.
    pub fn unknown_parameter(name: &str, resource_type: &str) -> Self {
        Self::invalid(format!(
            "Invalid search parameter '{}' for resource type {}",
            name, resource_type
        ))
    }

    /// Returns the human-readable message.
    pub fn message(&self) -> &str {
        match self {
            SearchError::InvalidSearchParameter { message } => message,
        }
    }
}

/// Result alias for compilation.
pub type SearchResult<T> = Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_parameter_message() {
        let err = SearchError::unknown_parameter("foo", "Patient");
        assert!(err.to_string().contains("'foo'"));
        assert!(err.to_string().contains("Patient"));
    }

    #[test]
    fn test_invalid_value_message() {
        let err = SearchError::invalid_value("name");
        assert_eq!(err.message(), err.to_string());
        assert!(err.message().contains("'name'"));
    }
}
