//! Context processing through the public processor types

mod support;

use ldkit_json_ld::context::processor::ContextProcessor;
use ldkit_json_ld::diagnostics::Diagnostics;
use ldkit_json_ld::{ActiveContext, ErrorCode, JsonLdOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use support::options_with_documents;

#[test]
fn test_array_contexts_are_processed_in_order() {
    let options = JsonLdOptions::default();
    let diagnostics = Diagnostics::new();
    let contexts = ContextProcessor::new(&options, &diagnostics);
    let empty = ActiveContext::new();

    let a = json!({"ex": "http://example.org/", "name": "ex:name", "@language": "en"});
    let b = json!({
        "@vocab": "http://example.org/vocab/",
        "name": {"@id": "ex:title", "@language": "de"},
        "@language": null
    });

    let together = contexts.process(&empty, &json!([a, b]), None).unwrap();
    let first = contexts.process(&empty, &a, None).unwrap();
    let stepwise = contexts.process(&first, &b, None).unwrap();
    assert_eq!(together.to_json(), stepwise.to_json());
    assert_eq!(
        together.expand_iri("name", false, true).as_deref(),
        Some("http://example.org/title")
    );
    assert_eq!(together.language, None);
}

#[test]
fn test_cyclic_term_definitions_fail() {
    let options = JsonLdOptions::default();
    let diagnostics = Diagnostics::new();
    let contexts = ContextProcessor::new(&options, &diagnostics);
    let err = contexts
        .process(&ActiveContext::new(), &json!({"a": "b", "b": "a"}), None)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::CyclicIriMapping);
}

#[test]
fn test_protected_terms() {
    let options = JsonLdOptions::default();
    let diagnostics = Diagnostics::new();
    let contexts = ContextProcessor::new(&options, &diagnostics);
    let protected = contexts
        .process(
            &ActiveContext::new(),
            &json!({"@protected": true, "p": "http://example.org/p"}),
            None,
        )
        .unwrap();

    // same definition again is fine
    contexts
        .process(&protected, &json!({"p": "http://example.org/p"}), None)
        .unwrap();

    let err = contexts
        .process(&protected, &json!({"p": "http://example.org/other"}), None)
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ProtectedTermRedefinition);

    let err = contexts.process(&protected, &json!(null), None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidContextNullification);
}

#[test]
fn test_invalid_local_context() {
    let options = JsonLdOptions::default();
    let diagnostics = Diagnostics::new();
    let contexts = ContextProcessor::new(&options, &diagnostics);
    let err = contexts.process(&ActiveContext::new(), &json!(5), None).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidLocalContext);
}

#[test]
fn test_default_language_is_lowercased() {
    let options = JsonLdOptions::default();
    let diagnostics = Diagnostics::new();
    let contexts = ContextProcessor::new(&options, &diagnostics);
    let active = contexts
        .process(&ActiveContext::new(), &json!({"@language": "EN-us"}), None)
        .unwrap();
    assert_eq!(active.language.as_deref(), Some("en-us"));
    assert!(diagnostics.is_empty());
}

#[test]
fn test_remote_context_relative_to_base() {
    let options = options_with_documents(&[(
        "http://example.org/contexts/person.jsonld",
        json!({"@context": {"name": "http://schema.org/name"}}),
    )]);
    let diagnostics = Diagnostics::new();
    let contexts = ContextProcessor::new(&options, &diagnostics);
    let active = contexts
        .process(
            &ActiveContext::new(),
            &json!("contexts/person.jsonld"),
            Some("http://example.org/doc.jsonld"),
        )
        .unwrap();
    assert_eq!(
        active.expand_iri("name", false, true).as_deref(),
        Some("http://schema.org/name")
    );
}

#[test]
fn test_vocab_relative_to_base() {
    let options = JsonLdOptions::default();
    let diagnostics = Diagnostics::new();
    let contexts = ContextProcessor::new(&options, &diagnostics);
    let active = contexts
        .process(
            &ActiveContext::with_base(Some("http://example.org/base/".to_string())),
            &json!({"@vocab": "terms#"}),
            None,
        )
        .unwrap();
    assert_eq!(active.vocab.as_deref(), Some("http://example.org/base/terms#"));
}
