//! The four JSON-LD API operations
//!
//! `JsonLdProcessor` wires context processing, expansion, node map
//! generation, compaction and framing together for one set of options.
//! Each call is independent: blank node labels, remote context caches and
//! warnings start fresh.

use crate::compact::CompactProcessor;
use crate::context::processor::ContextProcessor;
use crate::context::ActiveContext;
use crate::diagnostics::{Diagnostics, Warning};
use crate::error::Result;
use crate::expand::{ExpandProcessor, ExpansionFlags};
use crate::flatten::flatten_element;
use crate::frame::{prune_blank_nodes, replace_nulls, replace_preserved, FrameFlags, Framer};
use crate::loader::LoaderOptions;
use crate::node_map::{generate_node_map, merge_node_maps, BlankNodeIssuer, DEFAULT_GRAPH, MERGED_GRAPH};
use crate::options::JsonLdOptions;
use crate::value::{as_array, is_empty_object};
use serde_json::{Map, Value as JsonValue};
use std::borrow::Cow;
use tracing::debug;

/// A document after loading: its JSON, the URL it came from and the
/// context URL advertised alongside it.
struct LoadedDocument<'d> {
    document: Cow<'d, JsonValue>,
    document_url: Option<String>,
    context_url: Option<String>,
}

/// Runs expand, compact, flatten and frame with a fixed set of options.
///
/// Warnings raised during the most recent call are available through
/// [`JsonLdProcessor::warnings`].
pub struct JsonLdProcessor {
    options: JsonLdOptions,
    diagnostics: Diagnostics,
}

impl Default for JsonLdProcessor {
    fn default() -> Self {
        Self::new(JsonLdOptions::default())
    }
}

impl JsonLdProcessor {
    pub fn new(options: JsonLdOptions) -> Self {
        Self {
            options,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn options(&self) -> &JsonLdOptions {
        &self.options
    }

    /// Warnings from the last call
    pub fn warnings(&self) -> Vec<Warning> {
        self.diagnostics.snapshot()
    }

    /// Expand a document. A string input is a URL fetched through the
    /// document loader.
    pub fn expand(&self, input: &JsonValue) -> Result<JsonValue> {
        let _span = tracing::debug_span!("jsonld_expand").entered();
        self.diagnostics.take();
        let (expanded, _) = self.expand_input(&self.options, input)?;
        Ok(expanded)
    }

    /// Compact a document against `context`.
    pub fn compact(&self, input: &JsonValue, context: &JsonValue) -> Result<JsonValue> {
        let _span = tracing::debug_span!("jsonld_compact").entered();
        self.diagnostics.take();
        let expand_options = self.options.clone().with_ordered(false);
        let (expanded, document_url) =
            self.expand_input(&expand_options, input)?;
        self.compact_expanded(&expanded, context, document_url, false)
    }

    /// Flatten a document, compacting the result when a context is given.
    pub fn flatten(&self, input: &JsonValue, context: Option<&JsonValue>) -> Result<JsonValue> {
        let _span = tracing::debug_span!("jsonld_flatten").entered();
        self.diagnostics.take();
        let (expanded, document_url) =
            self.expand_input(&self.options, input)?;
        let flattened = flatten_element(&expanded, self.options.ordered)?;
        match context {
            Some(context) if !context.is_null() => {
                self.compact_expanded(&flattened, context, document_url, true)
            }
            _ => Ok(flattened),
        }
    }

    /// Frame a document. The frame's `@context` is used to compact the
    /// result.
    pub fn frame(&self, input: &JsonValue, frame: &JsonValue) -> Result<JsonValue> {
        let _span = tracing::debug_span!("jsonld_frame").entered();
        self.diagnostics.take();

        let mut options = self.options.clone();
        if options.is_json_ld_10() {
            options.ordered = true;
        }
        let expand_options = options.clone().with_ordered(false);
        let (expanded, document_url) =
            self.expand_input(&expand_options, input)?;

        let contexts = ContextProcessor::new(&options, &self.diagnostics);
        let frame_document = load(&contexts, frame, LoaderOptions::for_frame())?;
        let context = frame_document
            .document
            .as_object()
            .and_then(|m| m.get("@context"))
            .cloned();
        let context_base = frame_document
            .document_url
            .clone()
            .or_else(|| options.base.clone());
        let frame_object = frame_document.document.as_object().cloned();
        let (expanded_frame, _) = self.expand_loaded(&expand_options, frame_document, true)?;

        let active_base = options.base.clone().or_else(|| {
            if options.compact_to_relative {
                document_url.clone()
            } else {
                None
            }
        });
        let active = contexts.process(
            &ActiveContext::with_base(active_base),
            context.as_ref().unwrap_or(&JsonValue::Null),
            context_base.as_deref(),
        )?;

        let frame_default = options.frame_default
            || frame_object.is_some_and(|m| {
                m.keys()
                    .any(|k| active.expand_iri(k, false, true).as_deref() == Some("@graph"))
            });

        let mut issuer = BlankNodeIssuer::default();
        let mut graph_map = generate_node_map(&expanded, &mut issuer)?;
        let graph_name = if frame_default {
            DEFAULT_GRAPH
        } else {
            let merged = merge_node_maps(&graph_map);
            graph_map.insert(MERGED_GRAPH.to_string(), merged);
            MERGED_GRAPH
        };
        debug!(graph = graph_name, subjects = graph_map.get(graph_name).map_or(0, |g| g.len()), "framing");

        let mut framer = Framer::new(&graph_map, graph_name, FrameFlags::from_options(&options));
        let mut results = JsonValue::Array(framer.frame(&expanded_frame)?);
        if !options.is_json_ld_10() {
            prune_blank_nodes(&mut results);
        }
        let results = replace_preserved(results);

        let compactor = CompactProcessor::new(&contexts);
        let compacted = compactor.compact_element(&active, None, &results)?;
        let graph_key = compactor.compact_iri(&active, "@graph", None, true, false)?;
        let mut output = Map::new();
        if let Some(context) = context {
            output.insert("@context".to_string(), context);
        }
        output.extend(into_graph_object(compacted, &graph_key));

        let output = match replace_nulls(JsonValue::Object(output)) {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        };
        if options.omit_graph() || output.get(&graph_key).is_some_and(JsonValue::is_array) {
            return Ok(JsonValue::Object(output));
        }

        let mut wrapped = Map::new();
        let mut node = Map::new();
        let mut existing = None;
        for (key, value) in output {
            if key == "@context" {
                wrapped.insert(key, value);
            } else if key == graph_key {
                existing = Some(value);
            } else {
                node.insert(key, value);
            }
        }
        let mut graph = Vec::new();
        if !node.is_empty() {
            graph.push(JsonValue::Object(node));
        }
        graph.extend(existing);
        wrapped.insert(graph_key, JsonValue::Array(graph));
        Ok(JsonValue::Object(wrapped))
    }

    /// Load (when `input` is a URL) and expand a document; returns the
    /// expanded array and the document URL.
    fn expand_input(
        &self,
        options: &JsonLdOptions,
        input: &JsonValue,
    ) -> Result<(JsonValue, Option<String>)> {
        let contexts = ContextProcessor::new(options, &self.diagnostics);
        let loaded = load(&contexts, input, LoaderOptions::default())?;
        self.expand_loaded(options, loaded, false)
    }

    fn expand_loaded(
        &self,
        options: &JsonLdOptions,
        loaded: LoadedDocument<'_>,
        frame_expansion: bool,
    ) -> Result<(JsonValue, Option<String>)> {
        let contexts = ContextProcessor::new(options, &self.diagnostics);
        let base = options.base.clone().or_else(|| loaded.document_url.clone());
        let mut active = ActiveContext::with_base(base.clone());

        if let Some(ref expand_context) = options.expand_context {
            let local = expand_context.get("@context").unwrap_or(expand_context);
            active = contexts.process(&active, local, base.as_deref())?;
        }
        if let Some(ref context_url) = loaded.context_url {
            active = contexts.process(
                &active,
                &JsonValue::String(context_url.clone()),
                Some(context_url),
            )?;
        }

        let expander = ExpandProcessor::new(
            &contexts,
            ExpansionFlags {
                frame_expansion,
                ordered: options.ordered,
            },
        );
        let expanded = expander.expand_element(&active, None, &loaded.document, base.as_deref(), false)?;
        let expanded = match expanded {
            JsonValue::Object(mut map) if map.len() == 1 && map.contains_key("@graph") => {
                map.remove("@graph").unwrap_or(JsonValue::Null)
            }
            other => other,
        };
        Ok((JsonValue::Array(as_array(expanded)), loaded.document_url))
    }

    fn compact_expanded(
        &self,
        expanded: &JsonValue,
        context: &JsonValue,
        document_url: Option<String>,
        force_graph: bool,
    ) -> Result<JsonValue> {
        let contexts = ContextProcessor::new(&self.options, &self.diagnostics);
        let context = match context {
            JsonValue::Object(map) if map.contains_key("@context") => &map["@context"],
            other => other,
        };
        let active_base = self.options.base.clone().or_else(|| {
            if self.options.compact_to_relative {
                document_url.clone()
            } else {
                None
            }
        });
        let context_base = document_url.or_else(|| self.options.base.clone());
        let active = contexts.process(&ActiveContext::with_base(active_base), context, context_base.as_deref())?;

        let compactor = CompactProcessor::new(&contexts);
        let compacted = compactor.compact_element(&active, None, expanded)?;
        let graph_key = compactor.compact_iri(&active, "@graph", None, true, false)?;
        // A lone node may carry its own `@graph`; wrap it before shaping.
        let compacted = if force_graph && compacted.as_object().is_some_and(|m| !m.is_empty()) {
            JsonValue::Array(vec![compacted])
        } else {
            compacted
        };
        let mut result = into_graph_object(compacted, &graph_key);
        if force_graph && !result.contains_key(&graph_key) {
            result.insert(graph_key, JsonValue::Array(Vec::new()));
        }

        let empty_context = context.is_null()
            || is_empty_object(context)
            || context.as_array().is_some_and(Vec::is_empty);
        if empty_context {
            return Ok(JsonValue::Object(result));
        }
        let mut output = Map::new();
        output.insert("@context".to_string(), context.clone());
        output.extend(result);
        Ok(JsonValue::Object(output))
    }
}

/// Top-level compaction result as a map: an empty array becomes `{}` and a
/// non-empty array is put under the `@graph` key.
fn into_graph_object(compacted: JsonValue, graph_key: &str) -> Map<String, JsonValue> {
    match compacted {
        JsonValue::Object(map) => map,
        JsonValue::Array(items) if items.is_empty() => Map::new(),
        JsonValue::Array(items) => {
            let mut map = Map::new();
            map.insert(graph_key.to_string(), JsonValue::Array(items));
            map
        }
        _ => Map::new(),
    }
}

/// Inline JSON is used as is; a string is a URL fetched through the
/// configured document loader.
fn load<'d>(
    contexts: &ContextProcessor<'_>,
    input: &'d JsonValue,
    loader_options: LoaderOptions,
) -> Result<LoadedDocument<'d>> {
    let JsonValue::String(url) = input else {
        return Ok(LoadedDocument {
            document: Cow::Borrowed(input),
            document_url: None,
            context_url: None,
        });
    };
    debug!(url = %url, "loading document");
    let remote = contexts.loader().load(url, &loader_options)?;
    let document_url = remote.document_url.clone().unwrap_or_else(|| url.clone());
    let context_url = remote.context_url.clone();
    Ok(LoadedDocument {
        document: Cow::Owned(remote.into_json()?),
        document_url: Some(document_url),
        context_url,
    })
}
