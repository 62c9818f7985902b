//! Compaction through the public API

mod support;

use ldkit_json_ld::{compact, expand, ErrorCode, JsonLdOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::{init_test_tracing, options_with_documents};

fn person_context() -> serde_json::Value {
    json!({
        "ex": "http://example.org/",
        "name": "ex:name",
        "knows": {"@id": "ex:knows", "@type": "@id"}
    })
}

#[test]
fn test_compact_with_terms_and_prefixes() {
    let (store, _guard) = init_test_tracing();
    let expanded = json!([{
        "@id": "http://example.org/a",
        "@type": ["http://example.org/Person"],
        "http://example.org/name": [{"@value": "A"}],
        "http://example.org/knows": [{"@id": "http://example.org/b"}]
    }]);
    let compacted = compact(&expanded, &person_context(), &JsonLdOptions::default()).unwrap();
    assert_eq!(
        compacted,
        json!({
            "@context": person_context(),
            "@id": "ex:a",
            "@type": "ex:Person",
            "name": "A",
            "knows": "ex:b"
        })
    );
    assert!(store.has_span("jsonld_compact"));
}

#[test]
fn test_compact_then_expand_recovers_input() {
    let expanded = json!([{
        "@id": "http://example.org/a",
        "@type": ["http://example.org/Person"],
        "http://example.org/name": [{"@value": "A"}, {"@value": "Alpha"}],
        "http://example.org/knows": [{"@id": "http://example.org/b"}, {"@id": "http://example.org/c"}]
    }]);
    let compacted = compact(&expanded, &person_context(), &JsonLdOptions::default()).unwrap();
    let recovered = expand(&compacted, &JsonLdOptions::default()).unwrap();
    assert_eq!(recovered, expanded);
}

#[test]
fn test_compact_accepts_context_document() {
    let doc = json!({"@id": "http://example.org/a", "http://example.org/p": "v"});
    let context = json!({"@context": {"p": "http://example.org/p"}});
    let compacted = compact(&doc, &context, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        compacted,
        json!({"@context": {"p": "http://example.org/p"}, "@id": "http://example.org/a", "p": "v"})
    );
}

#[test]
fn test_compact_empty_context_is_omitted() {
    let doc = json!({"@id": "http://example.org/a", "http://example.org/p": "v"});
    let compacted = compact(&doc, &json!({}), &JsonLdOptions::default()).unwrap();
    assert_eq!(compacted, json!({"@id": "http://example.org/a", "http://example.org/p": "v"}));
}

#[test]
fn test_compact_without_compact_arrays() {
    let options = JsonLdOptions::default().with_compact_arrays(false);
    let doc = json!({"@id": "http://example.org/a", "http://example.org/p": "v"});
    let compacted = compact(&doc, &json!({"p": "http://example.org/p"}), &options).unwrap();
    assert_eq!(
        compacted,
        json!({
            "@context": {"p": "http://example.org/p"},
            "@graph": [{"@id": "http://example.org/a", "p": ["v"]}]
        })
    );
}

#[test]
fn test_compact_default_language() {
    let doc = json!([{
        "@id": "http://example.org/a",
        "http://example.org/label": [
            {"@value": "Hello", "@language": "en"},
            {"@value": "Hallo", "@language": "de"}
        ]
    }]);
    let context = json!({"@language": "en", "label": "http://example.org/label"});
    let compacted = compact(&doc, &context, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        compacted,
        json!({
            "@context": context,
            "@id": "http://example.org/a",
            "label": ["Hello", {"@value": "Hallo", "@language": "de"}]
        })
    );
}

#[test]
fn test_compact_relative_to_base() {
    let options = JsonLdOptions::default().with_base("http://example.org/docs/");
    let doc = json!({"@id": "http://example.org/docs/a", "http://example.org/p": {"@id": "http://example.org/docs/b"}});
    let compacted = compact(&doc, &json!({"p": {"@id": "http://example.org/p", "@type": "@id"}}), &options).unwrap();
    assert_eq!(compacted["@id"], json!("a"));
    assert_eq!(compacted["p"], json!("b"));

    let options = options.with_compact_to_relative(false);
    let compacted = compact(&doc, &json!({"p": {"@id": "http://example.org/p", "@type": "@id"}}), &options).unwrap();
    assert_eq!(compacted["@id"], json!("http://example.org/docs/a"));
}

#[test]
fn test_compact_remote_context() {
    let options = options_with_documents(&[(
        "http://example.org/ctx.jsonld",
        json!({"@context": {"name": "http://schema.org/name"}}),
    )]);
    let doc = json!({"http://schema.org/name": "Ada"});
    let compacted = compact(&doc, &json!("http://example.org/ctx.jsonld"), &options).unwrap();
    assert_eq!(
        compacted,
        json!({"@context": "http://example.org/ctx.jsonld", "name": "Ada"})
    );
}

#[test]
fn test_compact_invalid_context() {
    let doc = json!({"http://example.org/p": "v"});
    let err = compact(&doc, &json!({"p": {"@id": 5}}), &JsonLdOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidIriMapping);
}
