//! Flattening through the public API

mod support;

use ldkit_json_ld::node_map::{generate_node_map, BlankNodeIssuer};
use ldkit_json_ld::{expand, flatten, JsonLdOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::init_test_tracing;

#[test]
fn test_flatten_merges_repeated_subjects() {
    let (store, _guard) = init_test_tracing();
    let doc = json!([
        {"@id": "http://example.org/a", "http://example.org/p": "1"},
        {"@id": "http://example.org/a", "http://example.org/q": "2"}
    ]);
    let flattened = flatten(&doc, None, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        flattened,
        json!([{
            "@id": "http://example.org/a",
            "http://example.org/p": [{"@value": "1"}],
            "http://example.org/q": [{"@value": "2"}]
        }])
    );
    assert!(store.has_span("jsonld_flatten"));
}

#[test]
fn test_flatten_preserves_node_map() {
    let doc = json!({
        "@context": {"@vocab": "http://example.org/"},
        "@id": "http://example.org/a",
        "knows": {
            "name": "Anonymous",
            "knows": {"@id": "http://example.org/c", "name": "C"}
        },
        "tags": {"@list": ["x", "y"]}
    });
    let options = JsonLdOptions::default();
    let expanded = expand(&doc, &options).unwrap();
    let flattened = flatten(&doc, None, &options).unwrap();

    let original = generate_node_map(&expanded, &mut BlankNodeIssuer::default()).unwrap();
    let regenerated = generate_node_map(&flattened, &mut BlankNodeIssuer::default()).unwrap();
    assert_eq!(original, regenerated);
}

#[test]
fn test_flatten_labels_blank_nodes() {
    let doc = json!({
        "@id": "http://example.org/a",
        "http://example.org/knows": {"http://example.org/name": "B"}
    });
    let flattened = flatten(&doc, None, &JsonLdOptions::default().with_ordered(true)).unwrap();
    assert_eq!(
        flattened,
        json!([
            {"@id": "_:b0", "http://example.org/name": [{"@value": "B"}]},
            {"@id": "http://example.org/a", "http://example.org/knows": [{"@id": "_:b0"}]}
        ])
    );
}

#[test]
fn test_flatten_named_graph_with_context() {
    let doc = json!({
        "@context": {"ex": "http://example.org/"},
        "@id": "ex:g",
        "@graph": [
            {"@id": "ex:x", "ex:p": "1"},
            {"@id": "ex:y", "ex:p": "2"}
        ]
    });
    let context = json!({"ex": "http://example.org/"});
    let flattened = flatten(&doc, Some(&context), &JsonLdOptions::default()).unwrap();
    assert_eq!(
        flattened,
        json!({
            "@context": {"ex": "http://example.org/"},
            "@graph": [{
                "@id": "ex:g",
                "@graph": [
                    {"@id": "ex:x", "ex:p": "1"},
                    {"@id": "ex:y", "ex:p": "2"}
                ]
            }]
        })
    );
}

#[test]
fn test_flatten_empty_document() {
    let flattened = flatten(&json!({}), Some(&json!({})), &JsonLdOptions::default()).unwrap();
    assert_eq!(flattened, json!({"@graph": []}));
}

#[test]
fn test_flatten_concatenates_repeated_values() {
    let doc = json!([
        {"@id": "http://example.org/a", "@type": "http://example.org/T", "http://example.org/p": "1"},
        {"@id": "http://example.org/a", "@type": "http://example.org/T", "http://example.org/p": ["1", "2"]}
    ]);
    let flattened = flatten(&doc, None, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        flattened,
        json!([{
            "@id": "http://example.org/a",
            "@type": ["http://example.org/T"],
            "http://example.org/p": [{"@value": "1"}, {"@value": "1"}, {"@value": "2"}]
        }])
    );
}
