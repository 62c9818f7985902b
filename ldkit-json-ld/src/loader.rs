//! Remote documents and the document loader collaborator
//!
//! The processor never performs I/O itself. Documents, contexts and frames
//! given by IRI are resolved through a [`DocumentLoader`] supplied in the
//! options; the loader decides how (and whether) to fetch them.

use crate::error::{ErrorCode, JsonLdError, Result};
use ldkit_vocab::json_ld;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// Document content as returned by a loader
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Already parsed JSON
    Json(JsonValue),
    /// Raw text, parsed by the processor
    Raw(String),
}

/// A document retrieved by a loader
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub document: Document,
    /// Final URL of the document (after redirects)
    pub document_url: Option<String>,
    /// Context linked via an HTTP Link header
    pub context_url: Option<String>,
    pub content_type: Option<String>,
    pub profile: Option<String>,
}

impl RemoteDocument {
    pub fn new(document_url: impl Into<String>, document: JsonValue) -> Self {
        Self {
            document: Document::Json(document),
            document_url: Some(document_url.into()),
            context_url: None,
            content_type: Some(json_ld::MEDIA_TYPE.to_string()),
            profile: None,
        }
    }

    pub fn raw(document_url: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            document: Document::Raw(text.into()),
            document_url: Some(document_url.into()),
            context_url: None,
            content_type: Some(json_ld::MEDIA_TYPE.to_string()),
            profile: None,
        }
    }

    pub fn with_context_url(mut self, context_url: impl Into<String>) -> Self {
        self.context_url = Some(context_url.into());
        self
    }

    /// Parsed document content.
    ///
    /// Raw text that is not valid JSON fails with `loading document failed`.
    pub fn into_json(self) -> Result<JsonValue> {
        match self.document {
            Document::Json(value) => Ok(value),
            Document::Raw(text) => serde_json::from_str(&text).map_err(|e| {
                JsonLdError::loading(
                    ErrorCode::LoadingDocumentFailed,
                    self.document_url.unwrap_or_default(),
                    format!("error parsing document content as JSON: {}", e),
                )
            }),
        }
    }
}

/// Options passed to a loader with each request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    pub extract_all_scripts: bool,
    /// Profile of the document being requested
    pub profile: Option<String>,
    /// Profiles the caller would like the server to honour
    pub request_profile: Vec<String>,
}

impl LoaderOptions {
    /// Options for dereferencing a remote context
    pub fn for_context() -> Self {
        Self {
            profile: Some(json_ld::CONTEXT_PROFILE.to_string()),
            request_profile: vec![json_ld::CONTEXT_PROFILE.to_string()],
            ..Default::default()
        }
    }

    /// Options for dereferencing a frame document
    pub fn for_frame() -> Self {
        Self {
            profile: Some(json_ld::FRAME_PROFILE.to_string()),
            request_profile: vec![json_ld::FRAME_PROFILE.to_string()],
            ..Default::default()
        }
    }
}

/// This trait is implemented by consumers of the API, to provide remote
/// documents and contexts.
///
/// Failures must be reported as [`JsonLdError::Loading`] with one of
/// `loading document failed`, `loading remote context failed` or
/// `multiple context link headers`.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, url: &str, options: &LoaderOptions) -> Result<RemoteDocument>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&str, &LoaderOptions) -> Result<RemoteDocument> + Send + Sync,
{
    fn load(&self, url: &str, options: &LoaderOptions) -> Result<RemoteDocument> {
        self(url, options)
    }
}

/// Loader used when none is configured: every request fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDocumentLoader;

impl DocumentLoader for NoDocumentLoader {
    fn load(&self, url: &str, _options: &LoaderOptions) -> Result<RemoteDocument> {
        Err(JsonLdError::loading(
            ErrorCode::LoadingDocumentFailed,
            url,
            "no document loader configured",
        ))
    }
}

/// In-memory loader serving a fixed set of documents by URL.
#[derive(Debug, Clone, Default)]
pub struct StaticDocumentLoader {
    documents: HashMap<String, RemoteDocument>,
}

impl StaticDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a JSON document under `url`
    pub fn with_document(mut self, url: impl Into<String>, document: JsonValue) -> Self {
        let url = url.into();
        self.documents
            .insert(url.clone(), RemoteDocument::new(url, document));
        self
    }

    /// Register a fully described remote document under `url`
    pub fn with_remote_document(mut self, url: impl Into<String>, document: RemoteDocument) -> Self {
        self.documents.insert(url.into(), document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: RemoteDocument) {
        self.documents.insert(url.into(), document);
    }
}

impl DocumentLoader for StaticDocumentLoader {
    fn load(&self, url: &str, _options: &LoaderOptions) -> Result<RemoteDocument> {
        self.documents.get(url).cloned().ok_or_else(|| {
            JsonLdError::loading(ErrorCode::LoadingDocumentFailed, url, "document not found")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_loader() {
        let loader = StaticDocumentLoader::new()
            .with_document("http://example.org/ctx", json!({"@context": {"a": "http://a/"}}));

        let doc = loader
            .load("http://example.org/ctx", &LoaderOptions::for_context())
            .unwrap();
        assert_eq!(doc.document_url.as_deref(), Some("http://example.org/ctx"));
        assert_eq!(doc.into_json().unwrap(), json!({"@context": {"a": "http://a/"}}));

        let err = loader
            .load("http://example.org/missing", &LoaderOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::LoadingDocumentFailed);
    }

    #[test]
    fn test_raw_document_parsing() {
        let doc = RemoteDocument::raw("http://example.org/doc", r#"{"@id": "x"}"#);
        assert_eq!(doc.into_json().unwrap(), json!({"@id": "x"}));

        let bad = RemoteDocument::raw("http://example.org/bad", "{not json");
        assert_eq!(
            bad.into_json().unwrap_err().code(),
            ErrorCode::LoadingDocumentFailed
        );
    }

    #[test]
    fn test_closure_loader() {
        let loader = |url: &str, _: &LoaderOptions| -> Result<RemoteDocument> {
            Ok(RemoteDocument::new(url, json!({"@id": url})))
        };
        let doc = loader.load("http://example.org/x", &LoaderOptions::default()).unwrap();
        assert_eq!(doc.into_json().unwrap(), json!({"@id": "http://example.org/x"}));
    }

    #[test]
    fn test_no_loader() {
        let err = NoDocumentLoader
            .load("http://example.org/x", &LoaderOptions::default())
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::LoadingDocumentFailed);
    }
}
