//! Tests for loading search parameter definitions from disk.

use std::io::Write;

use serde_json::json;
use tempfile::NamedTempFile;

use helios_search_es::{
    InMemorySearchParameterRegistry, RegistryError, SearchParamType, SearchParameterResolver,
    SearchRequest, build_sort_for_request, compile,
};

const DEFINITIONS: &str = r#"[
    {
        "resourceType": "Observation",
        "name": "code",
        "type": "token",
        "compiled": [{ "resourceType": "Observation", "path": "code" }]
    },
    {
        "resourceType": "Observation",
        "name": "subject",
        "type": "reference",
        "compiled": [{ "resourceType": "Observation", "path": "subject", "target": ["Patient", "Group"] }]
    },
    {
        "resourceType": "Observation",
        "name": "value-quantity",
        "type": "quantity",
        "compiled": [{ "resourceType": "Observation", "path": "valueQuantity" }]
    },
    {
        "resourceType": "Observation",
        "name": "date",
        "type": "date",
        "compiled": [
            { "resourceType": "Observation", "path": "effectiveDateTime" },
            { "resourceType": "Observation", "path": "effectivePeriod" }
        ]
    },
    {
        "resourceType": "Observation",
        "name": "code-value-quantity",
        "type": "composite",
        "compiled": [{ "resourceType": "Observation", "path": "component" }]
    }
]"#;

fn write_definitions(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_registry_from_file() {
    let file = write_definitions(DEFINITIONS);
    let registry = InMemorySearchParameterRegistry::from_json_file(file.path()).unwrap();

    assert_eq!(registry.len(), 5);
    let subject = registry.resolve("Observation", "subject").unwrap();
    assert_eq!(subject.param_type, SearchParamType::Reference);
    assert_eq!(subject.compiled[0].target, vec!["Patient", "Group"]);
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = InMemorySearchParameterRegistry::from_json_file(dir.path().join("missing.json"));
    assert!(matches!(result, Err(RegistryError::Io { .. })));
}

#[test]
fn test_unknown_type_tag_falls_back_to_string() {
    let file = write_definitions(
        r#"[{
            "resourceType": "Patient",
            "name": "phonetic",
            "type": "phonetic-match",
            "compiled": [{ "resourceType": "Patient", "path": "name" }]
        }]"#,
    );
    let registry = InMemorySearchParameterRegistry::from_json_file(file.path()).unwrap();

    let request = SearchRequest::new("Patient").with_param("phonetic", "Smyth");
    let query = compile(&registry, &request, vec![]).unwrap().to_json();
    assert_eq!(
        query["bool"]["must"][0],
        json!({ "multi_match": { "fields": ["name", "name.*"], "query": "Smyth", "lenient": true } })
    );
}

#[test]
fn test_compile_against_loaded_registry() {
    let file = write_definitions(DEFINITIONS);
    let registry = InMemorySearchParameterRegistry::from_json_file(file.path()).unwrap();

    let request = SearchRequest::from_query_string(
        "Observation",
        "subject=123&value-quantity=gt5.4|http://unitsofmeasure.org|mg&code-value-quantity=x&_sort=-date",
    );
    let query = compile(&registry, &request, vec![]).unwrap().to_json();
    let must = query["bool"]["must"].as_array().unwrap();
    assert_eq!(must.len(), 3);

    assert_eq!(
        must[0]["terms"]["subject.reference.keyword"],
        json!(["Patient/123", "Group/123"])
    );
    assert_eq!(must[1]["bool"]["must"][0]["range"]["valueQuantity.value"]["gt"], json!(5.4));
    // Composite parameters use the string constructor
    assert_eq!(must[2]["multi_match"]["fields"], json!(["component", "component.*"]));

    let sort = build_sort_for_request(&registry, &request).unwrap();
    assert_eq!(sort.len(), 6);
    assert_eq!(sort[0], json!({ "effectiveDateTime": { "order": "desc", "unmapped_type": "long" } }));
    assert_eq!(sort[5], json!({ "effectivePeriod.end": { "order": "desc", "unmapped_type": "long" } }));
}
