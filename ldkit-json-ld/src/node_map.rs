//! Node map generation
//!
//! Collects every node object of an expanded document into a map keyed by
//! graph name and subject identifier, merging repeated descriptions of the
//! same subject and giving every blank node a fresh, call-scoped label.
//! Repeated descriptions concatenate their property values; `@type` values
//! and the merged graph stay free of duplicates.

use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::value::as_slice;
use serde_json::{Map, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};

/// Node objects of one graph, keyed by subject identifier
pub type Graph = BTreeMap<String, Map<String, JsonValue>>;

/// graph name (`@default` for the default graph) -> subject -> node object
pub type NodeMap = BTreeMap<String, Graph>;

pub const DEFAULT_GRAPH: &str = "@default";
pub const MERGED_GRAPH: &str = "@merged";

/// Issues `_:b0`, `_:b1`, ... and remembers the relabelling of existing
/// blank node identifiers.
#[derive(Debug, Clone)]
pub struct BlankNodeIssuer {
    prefix: String,
    counter: usize,
    issued: HashMap<String, String>,
}

impl Default for BlankNodeIssuer {
    fn default() -> Self {
        Self::new("_:b")
    }
}

impl BlankNodeIssuer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
            issued: HashMap::new(),
        }
    }

    /// New identifier for `existing`, stable for repeated calls; a fresh
    /// identifier when `existing` is None.
    pub fn issue(&mut self, existing: Option<&str>) -> String {
        if let Some(existing) = existing {
            if let Some(issued) = self.issued.get(existing) {
                return issued.clone();
            }
        }
        let id = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        if let Some(existing) = existing {
            self.issued.insert(existing.to_string(), id.clone());
        }
        id
    }

    /// Relabel blank node identifiers, leave IRIs alone.
    pub fn relabel(&mut self, id: &str) -> String {
        if iri::is_blank_node(id) {
            self.issue(Some(id))
        } else {
            id.to_string()
        }
    }
}

/// Subject the current element hangs off
enum Subject {
    /// Forward property of a node in the map
    Node(String),
    /// Element is the value of a reverse property of this node
    Reverse(String),
}

/// Build the node map of an expanded document.
pub fn generate_node_map(expanded: &JsonValue, issuer: &mut BlankNodeIssuer) -> Result<NodeMap> {
    let mut node_map = NodeMap::new();
    node_map.insert(DEFAULT_GRAPH.to_string(), Graph::new());
    generate(expanded, &mut node_map, issuer, DEFAULT_GRAPH, None, None, None)?;
    Ok(node_map)
}

fn node_mut<'m>(node_map: &'m mut NodeMap, graph: &str, id: &str) -> &'m mut Map<String, JsonValue> {
    node_map
        .entry(graph.to_string())
        .or_default()
        .entry(id.to_string())
        .or_insert_with(|| new_node(id))
}

fn new_node(id: &str) -> Map<String, JsonValue> {
    let mut node = Map::new();
    node.insert("@id".to_string(), JsonValue::String(id.to_string()));
    node
}

/// Append `value` to the array at `key` unless an equal value is present.
pub fn add_unique(node: &mut Map<String, JsonValue>, key: &str, value: JsonValue) {
    let entry = node
        .entry(key.to_string())
        .or_insert_with(|| JsonValue::Array(Vec::new()));
    match entry {
        JsonValue::Array(items) => {
            if !items.contains(&value) {
                items.push(value);
            }
        }
        other => {
            if *other != value {
                let previous = other.take();
                *other = JsonValue::Array(vec![previous, value]);
            }
        }
    }
}

/// Append `value` to the array at `key`, duplicates allowed.
fn add_always(node: &mut Map<String, JsonValue>, key: &str, value: JsonValue) {
    match node
        .entry(key.to_string())
        .or_insert_with(|| JsonValue::Array(Vec::new()))
    {
        JsonValue::Array(items) => items.push(value),
        other => {
            let previous = other.take();
            *other = JsonValue::Array(vec![previous, value]);
        }
    }
}

fn generate(
    element: &JsonValue,
    node_map: &mut NodeMap,
    issuer: &mut BlankNodeIssuer,
    graph: &str,
    subject: Option<&Subject>,
    property: Option<&str>,
    mut list: Option<&mut Vec<JsonValue>>,
) -> Result<()> {
    let map = match element {
        JsonValue::Array(items) => {
            for item in items {
                generate(item, node_map, issuer, graph, subject, property, list.as_deref_mut())?;
            }
            return Ok(());
        }
        JsonValue::Object(map) => map,
        _ => return Ok(()),
    };

    let mut element = map.clone();
    if let Some(types) = element.get_mut("@type") {
        if let JsonValue::Array(items) = types {
            for item in items.iter_mut() {
                if let JsonValue::String(t) = item {
                    *t = issuer.relabel(t);
                }
            }
        } else if let JsonValue::String(t) = types {
            *t = issuer.relabel(t);
        }
    }

    if element.contains_key("@value") {
        let value = JsonValue::Object(element);
        match list {
            Some(list) => list.push(value),
            None => {
                if let (Some(Subject::Node(id)), Some(property)) = (subject, property) {
                    add_always(node_mut(node_map, graph, id), property, value);
                }
            }
        }
        return Ok(());
    }

    if element.contains_key("@list") {
        let mut items = Vec::new();
        if let Some(list_value) = element.get("@list") {
            generate(list_value, node_map, issuer, graph, subject, property, Some(&mut items))?;
        }
        let mut result = Map::new();
        result.insert("@list".to_string(), JsonValue::Array(items));
        if let Some(index) = element.get("@index") {
            result.insert("@index".to_string(), index.clone());
        }
        let result = JsonValue::Object(result);
        match list {
            Some(list) => list.push(result),
            None => {
                if let (Some(Subject::Node(id)), Some(property)) = (subject, property) {
                    add_always(node_mut(node_map, graph, id), property, result);
                }
            }
        }
        return Ok(());
    }

    // Node object
    let id = match element.remove("@id") {
        Some(JsonValue::String(id)) => issuer.relabel(&id),
        _ => issuer.issue(None),
    };
    node_mut(node_map, graph, &id);

    match subject {
        Some(Subject::Reverse(referencing)) => {
            if let Some(property) = property {
                let mut reference = Map::new();
                reference.insert("@id".to_string(), JsonValue::String(referencing.clone()));
                add_always(node_mut(node_map, graph, &id), property, JsonValue::Object(reference));
            }
        }
        Some(Subject::Node(subject_id)) => {
            if let Some(property) = property {
                let reference = JsonValue::Object(new_node(&id));
                match list.as_deref_mut() {
                    Some(list) => list.push(reference),
                    None => add_always(node_mut(node_map, graph, subject_id), property, reference),
                }
            }
        }
        None => {}
    }

    if let Some(types) = element.remove("@type") {
        let node = node_mut(node_map, graph, &id);
        for t in as_slice(&types) {
            add_unique(node, "@type", t.clone());
        }
    }

    if let Some(index) = element.remove("@index") {
        let node = node_mut(node_map, graph, &id);
        if let Some(existing) = node.get("@index") {
            if *existing != index {
                return Err(JsonLdError::new(
                    ErrorCode::ConflictingIndexes,
                    format!("node '{}' has conflicting @index values", id),
                ));
            }
        }
        node.insert("@index".to_string(), index);
    }

    if let Some(JsonValue::Object(reverse)) = element.remove("@reverse") {
        let referenced = Subject::Reverse(id.clone());
        for (reverse_property, values) in reverse {
            for value in as_slice(&values) {
                generate(value, node_map, issuer, graph, Some(&referenced), Some(&reverse_property), None)?;
            }
        }
    }

    if let Some(graph_value) = element.remove("@graph") {
        node_map.entry(id.clone()).or_default();
        generate(&graph_value, node_map, issuer, &id, None, None, None)?;
    }

    if let Some(included) = element.remove("@included") {
        generate(&included, node_map, issuer, graph, None, None, None)?;
    }

    let mut properties: Vec<(String, JsonValue)> = element.into_iter().collect();
    properties.sort_by(|a, b| a.0.cmp(&b.0));
    let node_subject = Subject::Node(id.clone());
    for (property, value) in properties {
        let property = issuer.relabel(&property);
        let node = node_mut(node_map, graph, &id);
        if !node.contains_key(&property) {
            node.insert(property.clone(), JsonValue::Array(Vec::new()));
        }
        generate(&value, node_map, issuer, graph, Some(&node_subject), Some(&property), None)?;
    }

    Ok(())
}

/// Union of all graphs of a node map, as used when framing the merged
/// graph.
pub fn merge_node_maps(node_map: &NodeMap) -> Graph {
    let mut merged = Graph::new();
    for graph in node_map.values() {
        for (id, node) in graph {
            let merged_node = merged.entry(id.clone()).or_insert_with(|| new_node(id));
            for (property, values) in node {
                if property != "@type" && ldkit_vocab::keyword::is_keyword(property) {
                    merged_node.insert(property.clone(), values.clone());
                } else {
                    for value in as_slice(values) {
                        add_unique(merged_node, property, value.clone());
                    }
                }
            }
        }
    }
    merged
}
