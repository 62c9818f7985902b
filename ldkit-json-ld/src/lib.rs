//! JSON-LD 1.1 processing library
//!
//! This library implements the JSON-LD 1.1 processing algorithms:
//! - Context processing and IRI expansion
//! - Document expansion
//! - Compaction against a context
//! - Flattening through a node map
//! - Framing
//!
//! # Example
//!
//! ```
//! use ldkit_json_ld::{compact, expand, JsonLdOptions};
//! use serde_json::json;
//!
//! let doc = json!({
//!     "@context": {"name": "http://schema.org/name"},
//!     "@id": "http://example.org/person/1",
//!     "name": "John Doe"
//! });
//! let expanded = expand(&doc, &JsonLdOptions::default()).unwrap();
//! assert_eq!(
//!     expanded,
//!     json!([{
//!         "@id": "http://example.org/person/1",
//!         "http://schema.org/name": [{"@value": "John Doe"}]
//!     }])
//! );
//!
//! let compacted = compact(
//!     &expanded,
//!     &json!({"name": "http://schema.org/name"}),
//!     &JsonLdOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(compacted["name"], json!("John Doe"));
//! ```

pub mod compact;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod expand;
pub mod flatten;
pub mod frame;
pub mod iri;
pub mod loader;
pub mod node_map;
pub mod options;
pub mod processor;
pub mod value;

pub use context::{ActiveContext, Container, Direction, TermDefinition};
pub use diagnostics::{Warning, WarningCode};
pub use error::{ErrorCode, JsonLdError, Result};
pub use loader::{
    Document, DocumentLoader, LoaderOptions, NoDocumentLoader, RemoteDocument,
    StaticDocumentLoader,
};
pub use options::{Embed, JsonLdOptions, ProcessingMode};
pub use processor::JsonLdProcessor;

use serde_json::Value as JsonValue;

/// Expand a JSON-LD document.
///
/// # Arguments
/// * `input` - The document, or a string URL resolved through the document loader
/// * `options` - Processing options
///
/// # Returns
/// The expanded document, always an array.
pub fn expand(input: &JsonValue, options: &JsonLdOptions) -> Result<JsonValue> {
    JsonLdProcessor::new(options.clone()).expand(input)
}

/// Compact a JSON-LD document against a context.
///
/// `context` may be the context itself or an object holding it under
/// `@context`.
pub fn compact(input: &JsonValue, context: &JsonValue, options: &JsonLdOptions) -> Result<JsonValue> {
    JsonLdProcessor::new(options.clone()).compact(input, context)
}

/// Flatten a JSON-LD document, compacting the result when `context` is
/// given.
pub fn flatten(
    input: &JsonValue,
    context: Option<&JsonValue>,
    options: &JsonLdOptions,
) -> Result<JsonValue> {
    JsonLdProcessor::new(options.clone()).flatten(input, context)
}

/// Frame a JSON-LD document.
///
/// # Example
/// ```
/// use ldkit_json_ld::{frame, JsonLdOptions};
/// use serde_json::json;
///
/// let doc = json!({
///     "@context": {"@vocab": "http://example.org/"},
///     "@graph": [
///         {"@id": "http://example.org/lib", "@type": "Library", "contains": {"@id": "http://example.org/book"}},
///         {"@id": "http://example.org/book", "@type": "Book", "title": "My Book"}
///     ]
/// });
/// let framed = frame(
///     &doc,
///     &json!({"@context": {"@vocab": "http://example.org/"}, "@type": "Library"}),
///     &JsonLdOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(framed["contains"]["title"], json!("My Book"));
/// ```
pub fn frame(input: &JsonValue, frame: &JsonValue, options: &JsonLdOptions) -> Result<JsonValue> {
    JsonLdProcessor::new(options.clone()).frame(input, frame)
}
