//! Expansion through the public API

mod support;

use ldkit_json_ld::{
    expand, ErrorCode, JsonLdOptions, JsonLdProcessor, ProcessingMode, RemoteDocument,
    StaticDocumentLoader, WarningCode,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use support::{init_test_tracing, options_with_documents};

// ============================================================================
// Basic expansion
// ============================================================================

#[test]
fn test_expand_compact_iri_property() {
    let doc = json!({"@context": {"ex": "http://example.org/"}, "ex:name": "Ada"});
    let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
    assert_eq!(expanded, json!([{"http://example.org/name": [{"@value": "Ada"}]}]));
}

#[test]
fn test_expand_opens_span() {
    let (store, _guard) = init_test_tracing();
    let processor = JsonLdProcessor::default();
    processor.expand(&json!({"http://example.org/p": 1})).unwrap();
    assert!(store.has_span("jsonld_expand"));
    assert_eq!(store.find_span("jsonld_expand").unwrap().level, tracing::Level::DEBUG);
}

#[test]
fn test_expand_is_idempotent() {
    let documents = [
        json!({
            "@context": {
                "ex": "http://example.org/",
                "knows": {"@id": "ex:knows", "@type": "@id"},
                "tags": {"@id": "ex:tags", "@container": "@list"},
                "label": {"@id": "ex:label", "@container": "@language"},
                "parent": {"@reverse": "ex:child"}
            },
            "@id": "ex:a",
            "@type": "ex:Person",
            "knows": "ex:b",
            "tags": ["x", 2, true],
            "label": {"de": "Hallo", "en": "Hello"},
            "parent": {"@id": "ex:mom"}
        }),
        json!({
            "@context": {"@vocab": "http://example.org/"},
            "@id": "http://example.org/g",
            "@graph": [
                {"@id": "http://example.org/x", "value": {"@value": "1", "@type": "http://www.w3.org/2001/XMLSchema#integer"}}
            ]
        }),
    ];
    for doc in documents {
        let once = expand(&doc, &JsonLdOptions::default()).unwrap();
        let twice = expand(&once, &JsonLdOptions::default()).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_expand_base_iri() {
    let doc = json!({
        "@context": {"@base": "http://example.org/base/"},
        "@id": "a",
        "http://example.org/p": {"@id": "../b"}
    });
    let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "@id": "http://example.org/base/a",
            "http://example.org/p": [{"@id": "http://example.org/b"}]
        }])
    );
}

#[test]
fn test_expand_typed_and_language_values() {
    let doc = json!({
        "@context": {
            "date": {"@id": "http://example.org/date", "@type": "http://www.w3.org/2001/XMLSchema#date"},
            "label": {"@id": "http://example.org/label", "@container": "@language"}
        },
        "@id": "http://example.org/x",
        "date": "2020-01-01",
        "label": {"de": "Hallo", "en": "Hi"}
    });
    let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "@id": "http://example.org/x",
            "http://example.org/date": [
                {"@value": "2020-01-01", "@type": "http://www.w3.org/2001/XMLSchema#date"}
            ],
            "http://example.org/label": [
                {"@value": "Hallo", "@language": "de"},
                {"@value": "Hi", "@language": "en"}
            ]
        }])
    );
}

#[test]
fn test_expand_context_option() {
    let options = JsonLdOptions::default().with_expand_context(json!({"@vocab": "http://example.org/"}));
    let expanded = expand(&json!({"name": "x"}), &options).unwrap();
    assert_eq!(expanded, json!([{"http://example.org/name": [{"@value": "x"}]}]));
}

#[test]
fn test_expand_remote_context() {
    let options = options_with_documents(&[(
        "http://example.org/ctx.jsonld",
        json!({"@context": {"name": "http://schema.org/name"}}),
    )]);
    let doc = json!({"@context": "http://example.org/ctx.jsonld", "name": "A"});
    let expanded = expand(&doc, &options).unwrap();
    assert_eq!(expanded, json!([{"http://schema.org/name": [{"@value": "A"}]}]));
}

#[test]
fn test_expand_remote_document_with_context_link() {
    let loader = StaticDocumentLoader::new()
        .with_remote_document(
            "http://example.org/data.json",
            RemoteDocument::raw("http://example.org/data.json", r#"{"@id": "thing", "name": "Ada"}"#)
                .with_context_url("http://example.org/ctx.jsonld"),
        )
        .with_document(
            "http://example.org/ctx.jsonld",
            json!({"@context": {"name": "http://schema.org/name"}}),
        );
    let options = JsonLdOptions::default().with_document_loader(Arc::new(loader));
    let expanded = expand(&json!("http://example.org/data.json"), &options).unwrap();
    assert_eq!(
        expanded,
        json!([{"@id": "http://example.org/thing", "http://schema.org/name": [{"@value": "Ada"}]}])
    );
}

#[test]
fn test_expand_remote_document_not_json() {
    let loader = StaticDocumentLoader::new().with_remote_document(
        "http://example.org/data.json",
        RemoteDocument::raw("http://example.org/data.json", "{not json"),
    );
    let options = JsonLdOptions::default().with_document_loader(Arc::new(loader));
    let err = expand(&json!("http://example.org/data.json"), &options).unwrap_err();
    assert_eq!(err.code(), ErrorCode::LoadingDocumentFailed);
}

// ============================================================================
// Scoped contexts
// ============================================================================

#[test]
fn test_type_scoped_context_does_not_propagate() {
    let doc = json!({
        "@context": {
            "@vocab": "http://example.org/",
            "Outer": {"@context": {"inner": "http://example.org/typed#inner"}}
        },
        "@type": "Outer",
        "inner": {"inner": "x"}
    });
    let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "@type": ["http://example.org/Outer"],
            "http://example.org/typed#inner": [{"http://example.org/inner": [{"@value": "x"}]}]
        }])
    );
}

#[test]
fn test_type_scoped_context_with_propagate() {
    let doc = json!({
        "@context": {
            "@vocab": "http://example.org/",
            "Outer": {"@context": {"@propagate": true, "inner": "http://example.org/typed#inner"}}
        },
        "@type": "Outer",
        "inner": {"inner": "x"}
    });
    let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "@type": ["http://example.org/Outer"],
            "http://example.org/typed#inner": [{"http://example.org/typed#inner": [{"@value": "x"}]}]
        }])
    );
}

#[test]
fn test_property_scoped_context() {
    let doc = json!({
        "@context": {
            "@vocab": "http://example.org/",
            "author": {"@context": {"name": "http://schema.org/name"}}
        },
        "name": "Book",
        "author": {"name": "Ada"}
    });
    let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
    assert_eq!(
        expanded,
        json!([{
            "http://example.org/name": [{"@value": "Book"}],
            "http://example.org/author": [{"http://schema.org/name": [{"@value": "Ada"}]}]
        }])
    );
}

// ============================================================================
// Errors and warnings
// ============================================================================

#[test]
fn test_invalid_value_object() {
    let doc = json!({"http://example.org/p": {"@value": "x", "@id": "http://example.org/y"}});
    let err = expand(&doc, &JsonLdOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidValueObject);
}

#[test]
fn test_invalid_default_language() {
    let doc = json!({"@context": {"@language": 5}, "http://example.org/p": "x"});
    let err = expand(&doc, &JsonLdOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidDefaultLanguage);
}

#[test]
fn test_missing_remote_context() {
    let doc = json!({"@context": "http://example.org/missing.jsonld", "http://example.org/p": "x"});
    let err = expand(&doc, &JsonLdOptions::default()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::LoadingRemoteContextFailed);
}

#[test]
fn test_version_rejected_in_json_ld_10() {
    let options = JsonLdOptions::default().with_processing_mode(ProcessingMode::JsonLd10);
    let doc = json!({"@context": {"@version": 1.1}, "http://example.org/p": "x"});
    let err = expand(&doc, &options).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProcessingModeConflict);
}

#[test]
fn test_keyword_like_term_is_ignored_with_warning() {
    let processor = JsonLdProcessor::default();
    let expanded = processor
        .expand(&json!({
            "@context": {"@foo": "http://example.org/foo"},
            "@id": "http://example.org/a",
            "http://example.org/p": "x"
        }))
        .unwrap();
    assert_eq!(
        expanded,
        json!([{"@id": "http://example.org/a", "http://example.org/p": [{"@value": "x"}]}])
    );
    assert!(processor
        .warnings()
        .iter()
        .any(|w| w.code == WarningCode::KeywordLikeValue));
}

#[test]
fn test_unknown_keyword_in_data_is_dropped_with_warning() {
    let processor = JsonLdProcessor::default();
    let expanded = processor
        .expand(&json!({"@foo": 1, "http://example.org/p": 2}))
        .unwrap();
    assert_eq!(expanded, json!([{"http://example.org/p": [{"@value": 2}]}]));
    assert!(processor
        .warnings()
        .iter()
        .any(|w| w.code == WarningCode::KeywordLikeValue && w.message.contains("@foo")));
}
