//! JSON-LD framing
//!
//! Matches the subjects of a node map against an expanded frame and builds
//! a tree of embedded node objects from them. The post-processing passes at
//! the bottom of this module run on the framed results before and after
//! compaction.

use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::node_map::{Graph, NodeMap, DEFAULT_GRAPH, MERGED_GRAPH};
use crate::options::{Embed, JsonLdOptions};
use crate::value::{
    add_value, as_array, as_slice, is_empty_object, is_list_object, is_node_reference, is_value_object,
};
use ldkit_vocab::keyword::is_keyword;
use serde_json::{json, Map, Value as JsonValue};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Embedding and matching switches in effect for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameFlags {
    pub embed: Embed,
    pub explicit: bool,
    pub require_all: bool,
    pub omit_default: bool,
}

impl FrameFlags {
    pub fn from_options(options: &JsonLdOptions) -> Self {
        Self {
            embed: options.embed,
            explicit: options.explicit,
            require_all: options.require_all,
            omit_default: options.omit_default,
        }
    }

    /// Frame used for properties the frame says nothing about
    fn implicit_frame(&self) -> JsonValue {
        json!([{
            "@embed": [self.embed.as_str()],
            "@explicit": [self.explicit],
            "@requireAll": [self.require_all]
        }])
    }
}

/// Where framed output is attached
enum Parent<'p> {
    List(&'p mut Vec<JsonValue>),
    Property(&'p mut Map<String, JsonValue>, &'p str),
}

impl Parent<'_> {
    fn push(&mut self, output: JsonValue) {
        match self {
            Parent::List(items) => items.push(output),
            Parent::Property(map, property) => add_value(map, property, output, true),
        }
    }
}

/// (graph name, subject identifier)
type SubjectKey = (String, String);

/// Per-call framing state.
pub struct Framer<'g> {
    graph_map: &'g NodeMap,
    graph: String,
    defaults: FrameFlags,
    /// Subjects currently being embedded, for cycle detection
    stack: Vec<SubjectKey>,
    /// Subjects already embedded in the current top-level result
    embedded: HashSet<SubjectKey>,
    /// Finished output per subject, reused by `@link`
    links: HashMap<SubjectKey, JsonValue>,
}

impl<'g> Framer<'g> {
    /// Frame the subjects of `graph` (normally `@default` or `@merged`).
    pub fn new(graph_map: &'g NodeMap, graph: impl Into<String>, defaults: FrameFlags) -> Self {
        Self {
            graph_map,
            graph: graph.into(),
            defaults,
            stack: Vec::new(),
            embedded: HashSet::new(),
            links: HashMap::new(),
        }
    }

    /// Run the framing algorithm with an expanded frame; returns the framed
    /// node objects in subject order.
    pub fn frame(&mut self, frame: &JsonValue) -> Result<Vec<JsonValue>> {
        let graph_map = self.graph_map;
        let subjects: Vec<String> = graph_map
            .get(&self.graph)
            .map(|graph| graph.keys().cloned().collect())
            .unwrap_or_default();
        let mut results = Vec::new();
        self.process_frame(&subjects, frame, &mut Parent::List(&mut results), None, false)?;
        Ok(results)
    }

    fn flags_of(&self, frame: &Map<String, JsonValue>) -> Result<FrameFlags> {
        let embed = match frame.get("@embed") {
            Some(value) => parse_embed(value)?,
            None => self.defaults.embed,
        };
        Ok(FrameFlags {
            embed,
            explicit: bool_flag(frame, "@explicit").unwrap_or(self.defaults.explicit),
            require_all: bool_flag(frame, "@requireAll").unwrap_or(self.defaults.require_all),
            omit_default: bool_flag(frame, "@omitDefault").unwrap_or(self.defaults.omit_default),
        })
    }

    fn process_frame(
        &mut self,
        subjects: &[String],
        frame: &JsonValue,
        parent: &mut Parent<'_>,
        active_property: Option<&str>,
        embedded: bool,
    ) -> Result<()> {
        let empty = Map::new();
        let frame = single_frame(frame)?.unwrap_or(&empty);
        validate_frame(frame)?;
        let flags = self.flags_of(frame)?;

        let graph_map = self.graph_map;
        let graph_name = self.graph.clone();
        let Some(graph) = graph_map.get(&graph_name) else {
            return Ok(());
        };

        for id in subjects {
            let Some(subject) = graph.get(id) else {
                continue;
            };
            if !filter_subject(graph, subject, frame, flags.require_all)? {
                continue;
            }
            debug!(subject = %id, graph = %graph_name, "frame matched");

            if active_property.is_none() {
                self.embedded.clear();
            }

            let key: SubjectKey = (graph_name.clone(), id.clone());
            if flags.embed == Embed::Link {
                if let Some(linked) = self.links.get(&key) {
                    parent.push(linked.clone());
                    continue;
                }
            }
            if embedded {
                let already_embedded =
                    matches!(flags.embed, Embed::Once | Embed::Last) && self.embedded.contains(&key);
                if flags.embed == Embed::Never || self.stack.contains(&key) || already_embedded {
                    parent.push(json!({ "@id": id }));
                    continue;
                }
            }

            self.embedded.insert(key.clone());
            self.stack.push(key.clone());
            let output = self.frame_subject(graph, subject, id, frame, flags);
            self.stack.pop();
            let output = JsonValue::Object(output?);

            if flags.embed == Embed::Link {
                self.links.insert(key, output.clone());
            }
            parent.push(output);
        }
        Ok(())
    }

    fn frame_subject(
        &mut self,
        graph: &'g Graph,
        subject: &'g Map<String, JsonValue>,
        id: &str,
        frame: &Map<String, JsonValue>,
        flags: FrameFlags,
    ) -> Result<Map<String, JsonValue>> {
        let mut output = Map::new();
        output.insert("@id".to_string(), JsonValue::String(id.to_string()));

        let graph_map = self.graph_map;
        if let Some(named) = graph_map.get(id) {
            let (recurse, subframe) = match frame.get("@graph") {
                None => (self.graph != MERGED_GRAPH, JsonValue::Object(Map::new())),
                Some(graph_frame) => (
                    id != MERGED_GRAPH && id != DEFAULT_GRAPH,
                    as_slice(graph_frame)
                        .first()
                        .filter(|f| f.is_object())
                        .cloned()
                        .unwrap_or_else(|| JsonValue::Object(Map::new())),
                ),
            };
            if recurse {
                let named_subjects: Vec<String> = named.keys().cloned().collect();
                let previous = std::mem::replace(&mut self.graph, id.to_string());
                let framed = self.process_frame(
                    &named_subjects,
                    &subframe,
                    &mut Parent::Property(&mut output, "@graph"),
                    Some("@graph"),
                    false,
                );
                self.graph = previous;
                framed?;
            }
        }

        if let Some(included) = frame.get("@included") {
            let subjects: Vec<String> = graph.keys().cloned().collect();
            self.process_frame(
                &subjects,
                included,
                &mut Parent::Property(&mut output, "@included"),
                Some("@included"),
                false,
            )?;
        }

        let mut properties: Vec<(&String, &JsonValue)> = subject.iter().collect();
        properties.sort_by(|a, b| a.0.cmp(b.0));
        for (property, values) in properties {
            if is_keyword(property) {
                output.insert(property.clone(), values.clone());
                continue;
            }
            if flags.explicit && !frame.contains_key(property) {
                continue;
            }

            let property_frame = match frame.get(property) {
                Some(f) => f.clone(),
                None => flags.implicit_frame(),
            };
            for item in as_slice(values) {
                if is_list_object(item) {
                    let list_frame = frame
                        .get(property)
                        .and_then(|f| as_slice(f).first())
                        .and_then(|f| f.get("@list"))
                        .cloned()
                        .unwrap_or_else(|| flags.implicit_frame());
                    let mut list = Vec::new();
                    for list_item in as_slice(&item["@list"]) {
                        match list_item.get("@id").and_then(JsonValue::as_str) {
                            Some(list_id) if is_node_reference(list_item) => {
                                self.process_frame(
                                    &[list_id.to_string()],
                                    &list_frame,
                                    &mut Parent::List(&mut list),
                                    Some("@list"),
                                    true,
                                )?;
                            }
                            _ => list.push(list_item.clone()),
                        }
                    }
                    add_value(&mut output, property, json!({ "@list": list }), true);
                } else if let Some(object_id) = item
                    .get("@id")
                    .and_then(JsonValue::as_str)
                    .filter(|_| is_node_reference(item))
                {
                    self.process_frame(
                        &[object_id.to_string()],
                        &property_frame,
                        &mut Parent::Property(&mut output, property),
                        Some(property),
                        true,
                    )?;
                } else if value_match(as_slice(&property_frame).first(), item) {
                    add_value(&mut output, property, item.clone(), true);
                }
            }
        }

        if let Some(reverse_frame) = frame.get("@reverse").and_then(JsonValue::as_object) {
            let mut reverse_output = Map::new();
            let mut reverse_properties: Vec<(&String, &JsonValue)> = reverse_frame.iter().collect();
            reverse_properties.sort_by(|a, b| a.0.cmp(b.0));
            for (reverse_property, subframe) in reverse_properties {
                for (subject_id, node) in graph {
                    let references_us = node
                        .get(reverse_property)
                        .map(as_slice)
                        .unwrap_or_default()
                        .iter()
                        .any(|v| v.get("@id").and_then(JsonValue::as_str) == Some(id));
                    if references_us {
                        self.process_frame(
                            &[subject_id.clone()],
                            subframe,
                            &mut Parent::Property(&mut reverse_output, reverse_property),
                            Some(reverse_property),
                            true,
                        )?;
                    }
                }
            }
            if !reverse_output.is_empty() {
                output.insert("@reverse".to_string(), JsonValue::Object(reverse_output));
            }
        }

        let mut frame_properties: Vec<(&String, &JsonValue)> = frame.iter().collect();
        frame_properties.sort_by(|a, b| a.0.cmp(b.0));
        for (property, property_frame) in frame_properties {
            let next = as_slice(property_frame).first().and_then(JsonValue::as_object);
            if property == "@type" {
                if !next.is_some_and(|n| n.contains_key("@default")) {
                    continue;
                }
            } else if is_keyword(property) {
                continue;
            }
            let omit_default = next
                .and_then(|n| bool_flag(n, "@omitDefault"))
                .unwrap_or(self.defaults.omit_default);
            if omit_default || output.contains_key(property) {
                continue;
            }
            let preserve = match next.and_then(|n| n.get("@default")) {
                Some(default) => JsonValue::Array(as_array(default.clone())),
                None => json!(["@null"]),
            };
            output.insert(property.clone(), json!([{ "@preserve": preserve }]));
        }

        Ok(output)
    }
}

/// The frame object of an expanded frame: a map, or an array holding at
/// most one map.
fn single_frame(frame: &JsonValue) -> Result<Option<&Map<String, JsonValue>>> {
    match frame {
        JsonValue::Object(map) => Ok(Some(map)),
        JsonValue::Array(items) if items.is_empty() => Ok(None),
        JsonValue::Array(items) if items.len() == 1 => match &items[0] {
            JsonValue::Object(map) => Ok(Some(map)),
            other => Err(JsonLdError::new(
                ErrorCode::InvalidFrame,
                format!("a frame must be an object, found {}", other),
            )),
        },
        other => Err(JsonLdError::new(
            ErrorCode::InvalidFrame,
            format!("a frame must be a single object, found {}", other),
        )),
    }
}

/// `@id` and `@type` in a frame must be wildcards or IRIs.
fn validate_frame(frame: &Map<String, JsonValue>) -> Result<()> {
    let ok = |value: &JsonValue, allow_json: bool| match value {
        JsonValue::Object(_) => true,
        JsonValue::String(s) => {
            !iri::is_blank_node(s) && (iri::is_absolute(s) || (allow_json && s == "@json"))
        }
        _ => false,
    };
    if let Some(ids) = frame.get("@id") {
        if let Some(bad) = as_slice(ids).iter().find(|id| !ok(id, false)) {
            return Err(JsonLdError::new(
                ErrorCode::InvalidFrame,
                format!("invalid @id in frame: {}", bad),
            ));
        }
    }
    if let Some(types) = frame.get("@type") {
        if let Some(bad) = as_slice(types).iter().find(|t| !ok(t, true)) {
            return Err(JsonLdError::new(
                ErrorCode::InvalidFrame,
                format!("invalid @type in frame: {}", bad),
            ));
        }
    }
    Ok(())
}

/// A frame flag value, given raw or as a value object.
fn flag_value(value: &JsonValue) -> Option<&JsonValue> {
    let first = as_slice(value).first()?;
    Some(first.get("@value").unwrap_or(first))
}

fn bool_flag(frame: &Map<String, JsonValue>, key: &str) -> Option<bool> {
    frame.get(key).and_then(flag_value).and_then(JsonValue::as_bool)
}

fn parse_embed(value: &JsonValue) -> Result<Embed> {
    let embed = match flag_value(value) {
        Some(JsonValue::Bool(true)) => Some(Embed::Once),
        Some(JsonValue::Bool(false)) => Some(Embed::Never),
        Some(JsonValue::String(s)) => Embed::parse(s),
        _ => None,
    };
    embed.ok_or_else(|| {
        JsonLdError::new(
            ErrorCode::InvalidEmbedValue,
            format!("invalid @embed value {}", value),
        )
    })
}

/// Does `subject` satisfy `frame`?
fn filter_subject(
    graph: &Graph,
    subject: &Map<String, JsonValue>,
    frame: &Map<String, JsonValue>,
    require_all: bool,
) -> Result<bool> {
    let mut wildcard = true;
    let mut matches_some = false;

    for (key, frame_value) in frame {
        let node_values = subject.get(key).map(as_slice).unwrap_or_default();
        let frame_values = as_slice(frame_value);

        let matched = if key == "@id" {
            let matched = match frame_values.first() {
                None => true,
                Some(first) if is_empty_object(first) => true,
                Some(_) => node_values.first().is_some_and(|id| frame_values.contains(id)),
            };
            if !require_all {
                return Ok(matched);
            }
            matched
        } else if key == "@type" {
            wildcard = false;
            if frame_values.is_empty() {
                if !node_values.is_empty() {
                    return Ok(false);
                }
                true
            } else if frame_values.len() == 1 && is_empty_object(&frame_values[0]) {
                !node_values.is_empty()
            } else {
                let matched = frame_values.iter().any(|t| {
                    t.get("@default").is_some() || node_values.contains(t)
                });
                if !require_all {
                    return Ok(matched);
                }
                matched
            }
        } else if is_keyword(key) {
            continue;
        } else {
            let property_frame = frame_values.first();
            let mut has_default = false;
            if let Some(pattern) = property_frame.and_then(JsonValue::as_object) {
                validate_frame(pattern)?;
                has_default = pattern.contains_key("@default");
            }
            wildcard = false;

            if node_values.is_empty() && has_default {
                continue;
            }
            match property_frame {
                None => {
                    if !node_values.is_empty() {
                        return Ok(false);
                    }
                    true
                }
                Some(pattern) if is_list_object(pattern) => {
                    let list_pattern = as_slice(&pattern["@list"]).first();
                    match (list_pattern, node_values.first()) {
                        (Some(list_pattern), Some(node_list)) if is_list_object(node_list) => {
                            let items = as_slice(&node_list["@list"]);
                            if is_value_object(list_pattern) {
                                items.iter().any(|item| value_match(Some(list_pattern), item))
                            } else if list_pattern.is_object() {
                                any_node_match(graph, list_pattern, items, require_all)?
                            } else {
                                false
                            }
                        }
                        _ => false,
                    }
                }
                Some(pattern) if is_value_object(pattern) => {
                    node_values.iter().any(|value| value_match(Some(pattern), value))
                }
                Some(pattern) if is_node_reference(pattern) => {
                    any_node_match(graph, pattern, node_values, require_all)?
                }
                Some(pattern) if pattern.is_object() => !node_values.is_empty(),
                Some(_) => false,
            }
        };

        if !matched && require_all {
            return Ok(false);
        }
        matches_some = matches_some || matched;
    }

    Ok(wildcard || matches_some)
}

/// Does any of `values` reference a node matching `pattern`?
fn any_node_match(graph: &Graph, pattern: &JsonValue, values: &[JsonValue], require_all: bool) -> Result<bool> {
    let Some(pattern) = pattern.as_object() else {
        return Ok(false);
    };
    for value in values {
        let Some(node) = value
            .get("@id")
            .and_then(JsonValue::as_str)
            .and_then(|id| graph.get(id))
        else {
            continue;
        };
        if filter_subject(graph, node, pattern, require_all)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Does a value object satisfy a value pattern? `{}` in the pattern is a
/// wildcard; a pattern without `@value`, `@type` and `@language` matches
/// anything.
fn value_match(pattern: Option<&JsonValue>, value: &JsonValue) -> bool {
    let Some(pattern) = pattern.and_then(JsonValue::as_object) else {
        return false;
    };
    let values = pattern.get("@value").map(as_slice).unwrap_or_default();
    let types = pattern.get("@type").map(as_slice).unwrap_or_default();
    let languages = pattern.get("@language").map(as_slice).unwrap_or_default();
    if values.is_empty() && types.is_empty() && languages.is_empty() {
        return true;
    }

    let wildcard = |patterns: &[JsonValue]| patterns.first().is_some_and(is_empty_object);

    let value_ok = value.get("@value").is_some_and(|v| values.contains(v)) || wildcard(values);
    if !value_ok {
        return false;
    }

    let datatype = value.get("@type");
    let type_ok = match datatype {
        None => types.is_empty(),
        Some(t) => types.contains(t) || wildcard(types),
    };
    if !type_ok {
        return false;
    }

    let language = value
        .get("@language")
        .and_then(JsonValue::as_str)
        .map(str::to_lowercase);
    match language {
        None => languages.is_empty(),
        Some(language) => {
            wildcard(languages)
                || languages
                    .iter()
                    .filter_map(JsonValue::as_str)
                    .any(|l| l.to_lowercase() == language)
        }
    }
}

/// Remove `@id` from node objects whose blank node identifier is not used
/// anywhere else in the results.
pub fn prune_blank_nodes(results: &mut JsonValue) {
    let mut counts = HashMap::new();
    count_blank_nodes(results, &mut counts);
    remove_unreferenced_ids(results, &counts);
}

fn count_blank_nodes(value: &JsonValue, counts: &mut HashMap<String, usize>) {
    match value {
        JsonValue::String(s) if iri::is_blank_node(s) => *counts.entry(s.clone()).or_default() += 1,
        JsonValue::Array(items) => items.iter().for_each(|item| count_blank_nodes(item, counts)),
        JsonValue::Object(map) => {
            for (key, value) in map {
                if key != "@value" {
                    count_blank_nodes(value, counts);
                }
            }
        }
        _ => {}
    }
}

fn remove_unreferenced_ids(value: &mut JsonValue, counts: &HashMap<String, usize>) {
    match value {
        JsonValue::Array(items) => items
            .iter_mut()
            .for_each(|item| remove_unreferenced_ids(item, counts)),
        JsonValue::Object(map) => {
            let unreferenced = map
                .get("@id")
                .and_then(JsonValue::as_str)
                .is_some_and(|id| iri::is_blank_node(id) && counts.get(id) == Some(&1));
            if unreferenced {
                map.remove("@id");
            }
            for (key, value) in map.iter_mut() {
                if key != "@value" {
                    remove_unreferenced_ids(value, counts);
                }
            }
        }
        _ => {}
    }
}

/// Replace every `{"@preserve": [v, ...]}` with `v`. Inside arrays an empty
/// `@preserve` drops the item.
pub fn replace_preserved(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(items) => {
            JsonValue::Array(items.into_iter().filter_map(preserved_value).collect())
        }
        other => preserved_value(other).unwrap_or(JsonValue::Null),
    }
}

fn preserved_value(value: JsonValue) -> Option<JsonValue> {
    match value {
        JsonValue::Object(mut map) => match map.remove("@preserve") {
            Some(preserve) => as_array(preserve).into_iter().next().map(replace_preserved),
            None => Some(JsonValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, replace_preserved(v)))
                    .collect(),
            )),
        },
        items @ JsonValue::Array(_) => Some(replace_preserved(items)),
        other => Some(other),
    }
}

/// Turn `"@null"` into `null`; arrays left holding only nulls become empty.
pub fn replace_nulls(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) if s == "@null" => JsonValue::Null,
        JsonValue::Array(items) => {
            let items: Vec<JsonValue> = items.into_iter().map(replace_nulls).collect();
            if items.iter().all(JsonValue::is_null) {
                JsonValue::Array(Vec::new())
            } else {
                JsonValue::Array(items)
            }
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| (k, replace_nulls(v)))
                .collect(),
        ),
        other => other,
    }
}
