//! Framing through the public API

mod support;

use ldkit_json_ld::{frame, Embed, ErrorCode, JsonLdOptions};
use pretty_assertions::assert_eq;
use serde_json::{json, Value as JsonValue};
use support::{init_test_tracing, options_with_documents};

fn people() -> JsonValue {
    json!({
        "@context": {"@vocab": "http://example.org/"},
        "@graph": [
            {
                "@id": "http://example.org/alice",
                "@type": "Person",
                "name": "Alice",
                "age": 41,
                "knows": {"@id": "http://example.org/bob"}
            },
            {
                "@id": "http://example.org/bob",
                "@type": "Robot",
                "name": "Bob"
            }
        ]
    })
}

fn vocab() -> JsonValue {
    json!({"@vocab": "http://example.org/"})
}

#[test]
fn test_frame_embeds_referenced_nodes() {
    let (store, _guard) = init_test_tracing();
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Person"}),
        &JsonLdOptions::default(),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/alice",
            "@type": "Person",
            "name": "Alice",
            "age": 41,
            "knows": {"@id": "http://example.org/bob", "@type": "Robot", "name": "Bob"}
        })
    );
    assert!(store.has_span("jsonld_frame"));
}

#[test]
fn test_frame_embed_never_leaves_references() {
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Person", "knows": {"@embed": "@never"}}),
        &JsonLdOptions::default(),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/alice",
            "@type": "Person",
            "name": "Alice",
            "age": 41,
            "knows": {"@id": "http://example.org/bob"}
        })
    );
}

#[test]
fn test_frame_explicit_drops_unframed_properties() {
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Person", "@explicit": true}),
        &JsonLdOptions::default(),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/alice",
            "@type": "Person"
        })
    );
}

#[test]
fn test_frame_explicit_option_with_listed_property() {
    let options = JsonLdOptions::default().with_explicit(true);
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Person", "name": {}}),
        &options,
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/alice",
            "@type": "Person",
            "name": "Alice"
        })
    );
}

#[test]
fn test_frame_multiple_matches_use_graph() {
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "name": {}, "@explicit": true}),
        &JsonLdOptions::default(),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@graph": [
                {"@id": "http://example.org/alice", "@type": "Person", "name": "Alice"},
                {"@id": "http://example.org/bob", "@type": "Robot", "name": "Bob"}
            ]
        })
    );
}

#[test]
fn test_frame_default_value() {
    let framed = frame(
        &people(),
        &json!({
            "@context": vocab(),
            "@type": "Robot",
            "nick": {"@default": "none"}
        }),
        &JsonLdOptions::default(),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/bob",
            "@type": "Robot",
            "name": "Bob",
            "nick": "none"
        })
    );
}

#[test]
fn test_frame_missing_default_is_null() {
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Robot", "@requireAll": false, "nick": {}}),
        &JsonLdOptions::default().with_explicit(true),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/bob",
            "@type": "Robot",
            "nick": null
        })
    );
}

#[test]
fn test_frame_prunes_unused_blank_node_ids() {
    let doc = json!({
        "@context": vocab(),
        "@type": "Person",
        "name": "Anonymous"
    });
    let framed = frame(&doc, &json!({"@context": vocab(), "@type": "Person"}), &JsonLdOptions::default()).unwrap();
    assert_eq!(
        framed,
        json!({"@context": vocab(), "@type": "Person", "name": "Anonymous"})
    );
}

#[test]
fn test_frame_without_omit_graph() {
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Robot"}),
        &JsonLdOptions::default().with_omit_graph(false),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@graph": [{"@id": "http://example.org/bob", "@type": "Robot", "name": "Bob"}]
        })
    );
}

#[test]
fn test_frame_embed_option_never() {
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Person"}),
        &JsonLdOptions::default().with_embed(Embed::Never),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/alice",
            "@type": "Person",
            "name": "Alice",
            "age": 41,
            "knows": {"@id": "http://example.org/bob"}
        })
    );
}

#[test]
fn test_frame_remote_frame_document() {
    let options = options_with_documents(&[(
        "http://example.org/frame.jsonld",
        json!({"@context": vocab(), "@type": "Robot"}),
    )]);
    let framed = frame(&people(), &json!("http://example.org/frame.jsonld"), &options).unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/bob",
            "@type": "Robot",
            "name": "Bob"
        })
    );
}

#[test]
fn test_frame_require_all_default_and_option() {
    let pattern = json!({"@context": vocab(), "@type": ["Person", "Robot"], "age": {}});

    // every listed property must match by default
    let framed = frame(&people(), &pattern, &JsonLdOptions::default()).unwrap();
    assert_eq!(framed["@id"], json!("http://example.org/alice"));
    assert!(framed.get("@graph").is_none());

    let framed = frame(&people(), &pattern, &JsonLdOptions::default().with_require_all(false)).unwrap();
    assert_eq!(framed["@graph"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_frame_omit_default_option() {
    let framed = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Robot", "@requireAll": false, "nick": {}}),
        &JsonLdOptions::default().with_omit_default(true),
    )
    .unwrap();
    assert_eq!(
        framed,
        json!({
            "@context": vocab(),
            "@id": "http://example.org/bob",
            "@type": "Robot",
            "name": "Bob"
        })
    );
}

#[test]
fn test_frame_default_graph_only() {
    let doc = json!({
        "@context": vocab(),
        "@id": "http://example.org/g",
        "@graph": [{"@id": "http://example.org/x", "@type": "Person"}]
    });
    let pattern = json!({"@context": vocab(), "@type": "Person"});

    let merged = frame(&doc, &pattern, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        merged,
        json!({"@context": vocab(), "@id": "http://example.org/x", "@type": "Person"})
    );

    let default_only = frame(&doc, &pattern, &JsonLdOptions::default().with_frame_default(true)).unwrap();
    assert_eq!(default_only, json!({"@context": vocab()}));
}

#[test]
fn test_frame_invalid_embed_value() {
    let err = frame(
        &people(),
        &json!({"@context": vocab(), "@type": "Person", "@embed": "sometimes"}),
        &JsonLdOptions::default(),
    )
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidEmbedValue);
}
