//! Processor options
//!
//! Mirrors the JSON-LD API `JsonLdOptions` dictionary. Options can be built
//! in code with the `with_*` methods or deserialized from a JSON options
//! object using the camelCase names from the JSON-LD API.

use crate::loader::DocumentLoader;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

/// JSON-LD processing mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    #[serde(rename = "json-ld-1.0")]
    JsonLd10,
    #[default]
    #[serde(rename = "json-ld-1.1")]
    JsonLd11,
}

impl ProcessingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            ProcessingMode::JsonLd10 => "json-ld-1.0",
            ProcessingMode::JsonLd11 => "json-ld-1.1",
        }
    }
}

/// Framing embed policy (`@embed`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Embed {
    /// Embed every occurrence
    #[serde(rename = "@always")]
    Always,
    /// Embed the first occurrence in each top-level result, reference the rest
    #[default]
    #[serde(rename = "@once")]
    Once,
    /// JSON-LD 1.0 behaviour; treated like `@once`
    #[serde(rename = "@last")]
    Last,
    /// Reuse the already produced output object for the same subject
    #[serde(rename = "@link")]
    Link,
    /// Always emit a node reference
    #[serde(rename = "@never")]
    Never,
}

impl Embed {
    pub fn parse(s: &str) -> Option<Embed> {
        match s {
            "@always" => Some(Embed::Always),
            "@once" => Some(Embed::Once),
            "@last" => Some(Embed::Last),
            "@link" => Some(Embed::Link),
            "@never" => Some(Embed::Never),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Embed::Always => "@always",
            Embed::Once => "@once",
            Embed::Last => "@last",
            Embed::Link => "@link",
            Embed::Never => "@never",
        }
    }
}

/// Options for the Expand, Compact, Flatten and Frame operations
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonLdOptions {
    /// Base IRI, overriding the document URL
    pub base: Option<String>,

    /// Context applied before any context declared by the document
    pub expand_context: Option<JsonValue>,

    pub processing_mode: ProcessingMode,

    /// Collapse single-element arrays during compaction (default true)
    pub compact_arrays: bool,

    /// Compact document-relative IRIs against the base (default true)
    pub compact_to_relative: bool,

    /// Process object keys and node map subjects in lexicographic order
    pub ordered: bool,

    /// Frame only the default graph instead of the merged graph
    pub frame_default: bool,

    /// Omit the top-level @graph when a frame matches a single node.
    ///
    /// When unset, defaults to true in JSON-LD 1.1 and false in 1.0.
    pub omit_graph: Option<bool>,

    /// Default @embed flag for framing
    pub embed: Embed,

    /// Default @explicit flag for framing
    pub explicit: bool,

    /// Default @requireAll flag for framing (default true)
    pub require_all: bool,

    /// Default @omitDefault flag for framing
    pub omit_default: bool,

    /// Loader used for remote documents, contexts and frames
    #[serde(skip)]
    pub document_loader: Option<Arc<dyn DocumentLoader>>,
}

impl Default for JsonLdOptions {
    fn default() -> Self {
        Self {
            base: None,
            expand_context: None,
            processing_mode: ProcessingMode::default(),
            compact_arrays: true,
            compact_to_relative: true,
            ordered: false,
            frame_default: false,
            omit_graph: None,
            embed: Embed::default(),
            explicit: false,
            require_all: true,
            omit_default: false,
            document_loader: None,
        }
    }
}

impl fmt::Debug for JsonLdOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLdOptions")
            .field("base", &self.base)
            .field("expand_context", &self.expand_context)
            .field("processing_mode", &self.processing_mode)
            .field("compact_arrays", &self.compact_arrays)
            .field("compact_to_relative", &self.compact_to_relative)
            .field("ordered", &self.ordered)
            .field("frame_default", &self.frame_default)
            .field("omit_graph", &self.omit_graph)
            .field("embed", &self.embed)
            .field("explicit", &self.explicit)
            .field("require_all", &self.require_all)
            .field("omit_default", &self.omit_default)
            .field("document_loader", &self.document_loader.as_ref().map(|_| "<loader>"))
            .finish()
    }
}

impl JsonLdOptions {
    /// Create options with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Deserialize options from a JSON-LD API options object.
    pub fn from_json(value: &JsonValue) -> Result<Self, serde_json::Error> {
        JsonLdOptions::deserialize(value)
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn with_expand_context(mut self, context: JsonValue) -> Self {
        self.expand_context = Some(context);
        self
    }

    pub fn with_processing_mode(mut self, mode: ProcessingMode) -> Self {
        self.processing_mode = mode;
        self
    }

    pub fn with_compact_arrays(mut self, compact_arrays: bool) -> Self {
        self.compact_arrays = compact_arrays;
        self
    }

    pub fn with_compact_to_relative(mut self, compact_to_relative: bool) -> Self {
        self.compact_to_relative = compact_to_relative;
        self
    }

    pub fn with_ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    pub fn with_frame_default(mut self, frame_default: bool) -> Self {
        self.frame_default = frame_default;
        self
    }

    pub fn with_omit_graph(mut self, omit_graph: bool) -> Self {
        self.omit_graph = Some(omit_graph);
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = embed;
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_require_all(mut self, require_all: bool) -> Self {
        self.require_all = require_all;
        self
    }

    pub fn with_omit_default(mut self, omit_default: bool) -> Self {
        self.omit_default = omit_default;
        self
    }

    pub fn with_document_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.document_loader = Some(loader);
        self
    }

    pub fn is_json_ld_10(&self) -> bool {
        self.processing_mode == ProcessingMode::JsonLd10
    }

    /// Effective omitGraph flag
    pub fn omit_graph(&self) -> bool {
        self.omit_graph
            .unwrap_or(self.processing_mode == ProcessingMode::JsonLd11)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let opts = JsonLdOptions::default();
        assert!(opts.compact_arrays);
        assert!(opts.compact_to_relative);
        assert!(!opts.ordered);
        assert_eq!(opts.processing_mode, ProcessingMode::JsonLd11);
        assert_eq!(opts.embed, Embed::Once);
        assert!(opts.require_all);
        assert!(opts.omit_graph());
    }

    #[test]
    fn test_from_json_camel_case() {
        let opts = JsonLdOptions::from_json(&json!({
            "base": "http://example.org/",
            "processingMode": "json-ld-1.0",
            "compactArrays": false,
            "ordered": true,
            "embed": "@never",
            "requireAll": false
        }))
        .unwrap();

        assert_eq!(opts.base.as_deref(), Some("http://example.org/"));
        assert!(opts.is_json_ld_10());
        assert!(!opts.compact_arrays);
        assert!(opts.compact_to_relative);
        assert!(opts.ordered);
        assert_eq!(opts.embed, Embed::Never);
        assert!(!opts.require_all);
        assert!(!opts.omit_graph());
    }

    #[test]
    fn test_builders() {
        let opts = JsonLdOptions::new()
            .with_ordered(true)
            .with_omit_graph(false)
            .with_embed(Embed::Always);
        assert!(opts.ordered);
        assert!(!opts.omit_graph());
        assert_eq!(opts.embed, Embed::Always);
    }

    #[test]
    fn test_embed_parse() {
        assert_eq!(Embed::parse("@link"), Some(Embed::Link));
        assert_eq!(Embed::parse("@sometimes"), None);
        assert_eq!(Embed::Never.as_str(), "@never");
    }
}
