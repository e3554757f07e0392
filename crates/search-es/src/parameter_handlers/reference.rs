//! Reference parameter handler for Elasticsearch.

use serde_json::json;

use crate::query::Query;
use crate::registry::CompiledSearchParam;

/// Builds an ES query clause for a reference search parameter.
///
/// Accepts `Type/id`, an absolute URL, or a bare `id`. Every spelling under
/// which the reference may have been stored is matched.
pub fn build_query(compiled: &CompiledSearchParam, value: &str, base_url: Option<&str>) -> Query {
    let field = format!("{}.reference.keyword", compiled.path);
    let base = base_url.map(|b| b.trim_end_matches('/'));

    if is_absolute(value) {
        let mut references = vec![value.to_string()];
        // A local absolute URL may have been stored in relative form
        if let Some(relative) = base.and_then(|b| value.strip_prefix(b))
            && let Some(relative) = relative.strip_prefix('/')
        {
            let relative = relative.trim_start_matches('/');
            if !relative.is_empty() {
                references.push(relative.to_string());
            }
        }
        return Query::leaf(json!({ "terms": { field: references } }));
    }

    if value.contains('/') {
        let mut references = vec![value.to_string()];
        if let Some(b) = base {
            references.push(format!("{}/{}", b, value));
        }
        return Query::leaf(json!({ "terms": { field: references } }));
    }

    // Bare id: expand to every declared target type
    if compiled.target.is_empty() {
        return Query::leaf(json!({
            "wildcard": { field: { "value": format!("*/{}", escape_wildcard(value)) } }
        }));
    }

    let references: Vec<String> = compiled
        .target
        .iter()
        .map(|target| format!("{}/{}", target, value))
        .collect();
    Query::leaf(json!({ "terms": { field: references } }))
}

/// Escapes the `wildcard` query metacharacters so `value` matches literally.
fn escape_wildcard(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '*' | '?' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn is_absolute(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://") || value.starts_with("urn:")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compiled() -> CompiledSearchParam {
        CompiledSearchParam::new("Observation", "subject")
    }

    #[test]
    fn test_relative_reference() {
        let clause = build_query(&compiled(), "Patient/123", None).to_json();
        assert_eq!(
            clause,
            json!({ "terms": { "subject.reference.keyword": ["Patient/123"] } })
        );
    }

    #[test]
    fn test_relative_reference_with_base_url() {
        let clause =
            build_query(&compiled(), "Patient/123", Some("https://fhir.example.org/")).to_json();
        assert_eq!(
            clause["terms"]["subject.reference.keyword"],
            json!(["Patient/123", "https://fhir.example.org/Patient/123"])
        );
    }

    #[test]
    fn test_local_absolute_reference() {
        let clause = build_query(
            &compiled(),
            "https://fhir.example.org/Patient/123",
            Some("https://fhir.example.org"),
        )
        .to_json();
        assert_eq!(
            clause["terms"]["subject.reference.keyword"],
            json!(["https://fhir.example.org/Patient/123", "Patient/123"])
        );
    }

    #[test]
    fn test_foreign_absolute_reference() {
        let clause = build_query(
            &compiled(),
            "https://other.org/Patient/1",
            Some("https://fhir.example.org"),
        )
        .to_json();
        assert_eq!(
            clause["terms"]["subject.reference.keyword"],
            json!(["https://other.org/Patient/1"])
        );
    }

    #[test]
    fn test_base_url_must_end_at_path_boundary() {
        let clause = build_query(
            &compiled(),
            "https://fhir.example.org.evil.com/Patient/1",
            Some("https://fhir.example.org"),
        )
        .to_json();
        assert_eq!(
            clause["terms"]["subject.reference.keyword"],
            json!(["https://fhir.example.org.evil.com/Patient/1"])
        );
    }

    #[test]
    fn test_id_without_targets_is_literal() {
        let clause = build_query(&compiled(), "*", None).to_json();
        assert_eq!(
            clause["wildcard"]["subject.reference.keyword"]["value"],
            "*/\\*"
        );

        let clause = build_query(&compiled(), "a?b\\c", None).to_json();
        assert_eq!(
            clause["wildcard"]["subject.reference.keyword"]["value"],
            "*/a\\?b\\\\c"
        );
    }

    #[test]
    fn test_id_with_targets() {
        let compiled = compiled().with_targets(["Patient", "Group"]);
        let clause = build_query(&compiled, "123", None).to_json();
        assert_eq!(
            clause["terms"]["subject.reference.keyword"],
            json!(["Patient/123", "Group/123"])
        );
    }

    #[test]
    fn test_id_without_targets() {
        let clause = build_query(&compiled(), "123", None).to_json();
        assert_eq!(
            clause["wildcard"]["subject.reference.keyword"]["value"],
            "*/123"
        );
    }
}
