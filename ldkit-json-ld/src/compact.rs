//! JSON-LD compaction
//!
//! Applies a context to an expanded document: IRIs are shortened to terms,
//! compact IRIs or relative references, values are collapsed where the
//! chosen term's definition makes them unambiguous, and container
//! definitions reshape arrays into maps.

use crate::context::inverse::TypeOrLanguage;
use crate::context::processor::{ContextFlags, ContextProcessor};
use crate::context::{ActiveContext, Container, TermDefinition};
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::value::{
    add_value, as_array, as_slice, entries, is_graph_object, is_list_object, is_simple_graph_object,
    is_value_object,
};
use serde_json::{json, Map, Value as JsonValue};
use std::borrow::Cow;

pub struct CompactProcessor<'a> {
    contexts: &'a ContextProcessor<'a>,
    compact_arrays: bool,
    ordered: bool,
}

fn scoped_context(def: &TermDefinition) -> Option<(&JsonValue, Option<&str>)> {
    def.context
        .as_ref()
        .map(|context| (context, def.base_url.as_deref()))
}

/// The map stored under `key`, created when missing.
fn map_entry<'m>(
    map: &'m mut Map<String, JsonValue>,
    key: &str,
    code: ErrorCode,
) -> Result<&'m mut Map<String, JsonValue>> {
    map.entry(key.to_string())
        .or_insert_with(|| JsonValue::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            JsonLdError::new(code, format!("'{}' is used both for a map and for a value", key))
        })
}

impl<'a> CompactProcessor<'a> {
    pub fn new(contexts: &'a ContextProcessor<'a>) -> Self {
        let options = contexts.options();
        Self {
            contexts,
            compact_arrays: options.compact_arrays,
            ordered: options.ordered,
        }
    }

    /// Override the compactArrays option (framing always uses its own value)
    pub fn with_compact_arrays(mut self, compact_arrays: bool) -> Self {
        self.compact_arrays = compact_arrays;
        self
    }

    fn json_ld_10(&self) -> bool {
        self.contexts.options().is_json_ld_10()
    }

    /// Compact an expanded element under `active_property`.
    pub fn compact_element(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &JsonValue,
    ) -> Result<JsonValue> {
        match element {
            JsonValue::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for item in items {
                    let compacted = self.compact_element(active, active_property, item)?;
                    if !compacted.is_null() {
                        result.push(compacted);
                    }
                }
                let container = active.container_of(active_property);
                let keep_array = result.len() != 1
                    || !self.compact_arrays
                    || matches!(active_property, Some("@graph") | Some("@set"))
                    || container.contains(Container::List)
                    || container.contains(Container::Set);
                if keep_array {
                    return Ok(JsonValue::Array(result));
                }
                Ok(result.into_iter().next().unwrap_or(JsonValue::Null))
            }
            JsonValue::Object(map) => self.compact_object(active, active_property, map),
            scalar => Ok(scalar.clone()),
        }
    }

    fn compact_object(
        &self,
        active_in: &ActiveContext,
        active_property: Option<&str>,
        element: &Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        let type_scoped = active_in;
        let previous = active_in.previous.clone();
        let mut active: Cow<'_, ActiveContext> = Cow::Borrowed(active_in);

        if let Some(ref previous) = previous {
            let node_reference = element.len() == 1 && element.contains_key("@id");
            if !element.contains_key("@value") && !node_reference {
                active = Cow::Borrowed(previous.as_ref());
            }
        }

        let property_scoped = active
            .term(active_property)
            .and_then(scoped_context)
            .map(|(context, base)| {
                self.contexts.process_with(
                    &active,
                    context,
                    base,
                    &[],
                    ContextFlags::property_scoped(),
                )
            })
            .transpose()?;
        if let Some(scoped) = property_scoped {
            active = Cow::Owned(scoped);
        }

        if element.contains_key("@value") || element.contains_key("@id") {
            if let Some(compacted) = self.compact_value(&active, active_property, element)? {
                return Ok(compacted);
            }
        }

        if let Some(list) = element.get("@list") {
            if active.container_of(active_property).contains(Container::List) {
                return self.compact_element(&active, active_property, list);
            }
        }

        let inside_reverse = active_property == Some("@reverse");
        let mut result = Map::new();

        if let Some(types) = element.get("@type") {
            let mut compacted_types = Vec::new();
            for t in as_slice(types).iter().filter_map(JsonValue::as_str) {
                compacted_types.push(self.compact_iri(&active, t, None, true, false)?);
            }
            compacted_types.sort();
            for term in compacted_types {
                if let Some((context, base)) = type_scoped.get(&term).and_then(scoped_context) {
                    active = Cow::Owned(self.contexts.process_with(
                        &active,
                        context,
                        base,
                        &[],
                        ContextFlags::type_scoped(),
                    )?);
                }
            }
        }

        for (expanded_property, expanded_value) in entries(element, self.ordered) {
            match expanded_property.as_str() {
                "@id" => {
                    let compacted = match expanded_value {
                        JsonValue::String(id) => {
                            JsonValue::String(self.compact_iri(&active, id, None, false, false)?)
                        }
                        other => other.clone(),
                    };
                    let alias = self.compact_iri(&active, "@id", None, true, false)?;
                    result.insert(alias, compacted);
                }
                "@type" => {
                    let mut compacted = Vec::new();
                    for t in as_slice(expanded_value) {
                        compacted.push(match t.as_str() {
                            Some(t) => JsonValue::String(self.compact_iri(type_scoped, t, None, true, false)?),
                            None => t.clone(),
                        });
                    }
                    let alias = self.compact_iri(&active, "@type", None, true, false)?;
                    let force_array = !self.compact_arrays
                        || (!self.json_ld_10()
                            && active.get(&alias).is_some_and(|d| d.has_container(Container::Set)));
                    let value = if expanded_value.is_array() {
                        JsonValue::Array(compacted)
                    } else {
                        compacted.into_iter().next().unwrap_or(JsonValue::Null)
                    };
                    add_value(&mut result, &alias, value, force_array);
                }
                "@reverse" => {
                    let compacted = self.compact_element(&active, Some("@reverse"), expanded_value)?;
                    if let JsonValue::Object(mut compacted) = compacted {
                        let reverse_terms: Vec<String> = compacted
                            .keys()
                            .filter(|p| active.get(p).is_some_and(|d| d.reverse))
                            .cloned()
                            .collect();
                        for property in reverse_terms {
                            if let Some(value) = compacted.remove(&property) {
                                let force_array = !self.compact_arrays
                                    || active.get(&property).is_some_and(|d| d.has_container(Container::Set));
                                add_value(&mut result, &property, value, force_array);
                            }
                        }
                        if !compacted.is_empty() {
                            let alias = self.compact_iri(&active, "@reverse", None, true, false)?;
                            result.insert(alias, JsonValue::Object(compacted));
                        }
                    }
                }
                "@preserve" => {
                    let compacted = self.compact_element(&active, active_property, expanded_value)?;
                    if compacted.as_array().map_or(true, |a| !a.is_empty()) {
                        result.insert("@preserve".to_string(), compacted);
                    }
                }
                "@index" if active.container_of(active_property).contains(Container::Index) => {}
                "@direction" | "@index" | "@language" | "@value" => {
                    let alias = self.compact_iri(&active, expanded_property, None, true, false)?;
                    result.insert(alias, expanded_value.clone());
                }
                _ => self.compact_property(
                    &active,
                    &mut result,
                    expanded_property,
                    expanded_value,
                    inside_reverse,
                )?,
            }
        }

        Ok(JsonValue::Object(result))
    }

    fn nest_target<'m>(
        &self,
        active: &ActiveContext,
        result: &'m mut Map<String, JsonValue>,
        item_active_property: &str,
    ) -> Result<&'m mut Map<String, JsonValue>> {
        let Some(nest_term) = active.get(item_active_property).and_then(|d| d.nest.as_deref()) else {
            return Ok(result);
        };
        if nest_term != "@nest" && active.expand_iri(nest_term, false, true).as_deref() != Some("@nest") {
            return Err(JsonLdError::new(
                ErrorCode::InvalidNestValue,
                format!("nest term '{}' does not expand to @nest", nest_term),
            ));
        }
        map_entry(result, nest_term, ErrorCode::InvalidNestValue)
    }

    fn compact_property(
        &self,
        active: &ActiveContext,
        result: &mut Map<String, JsonValue>,
        expanded_property: &str,
        expanded_value: &JsonValue,
        inside_reverse: bool,
    ) -> Result<()> {
        let items = as_slice(expanded_value);
        if items.is_empty() {
            let item_active_property =
                self.compact_iri(active, expanded_property, Some(expanded_value), true, inside_reverse)?;
            let target = self.nest_target(active, result, &item_active_property)?;
            add_value(target, &item_active_property, JsonValue::Array(Vec::new()), true);
            return Ok(());
        }

        for expanded_item in items {
            let item_active_property =
                self.compact_iri(active, expanded_property, Some(expanded_item), true, inside_reverse)?;
            let def = active.get(&item_active_property);
            let container = def.map(|d| d.container.clone()).unwrap_or_default();
            let force_array = container.contains(Container::Set)
                || item_active_property == "@graph"
                || item_active_property == "@list"
                || !self.compact_arrays;

            let inner = if is_list_object(expanded_item) {
                &expanded_item["@list"]
            } else if is_graph_object(expanded_item) {
                &expanded_item["@graph"]
            } else {
                expanded_item
            };
            let mut compacted_item = self.compact_element(active, Some(&item_active_property), inner)?;

            let target = self.nest_target(active, result, &item_active_property)?;

            if is_list_object(expanded_item) {
                let list = as_array(compacted_item);
                if container.contains(Container::List) {
                    target.insert(item_active_property, JsonValue::Array(list));
                } else {
                    let mut wrapped = Map::new();
                    wrapped.insert(
                        self.compact_iri(active, "@list", None, true, false)?,
                        JsonValue::Array(list),
                    );
                    if let Some(index) = expanded_item.get("@index") {
                        wrapped.insert(self.compact_iri(active, "@index", None, true, false)?, index.clone());
                    }
                    add_value(target, &item_active_property, JsonValue::Object(wrapped), force_array);
                }
                continue;
            }

            if is_graph_object(expanded_item) {
                if container.contains(Container::Graph) && container.contains(Container::Id) {
                    let map_key = match expanded_item.get("@id").and_then(JsonValue::as_str) {
                        Some(id) => self.compact_iri(active, id, None, false, false)?,
                        None => self.compact_iri(active, "@none", None, true, false)?,
                    };
                    let map_object = map_entry(target, &item_active_property, ErrorCode::InvalidContainerMapping)?;
                    add_value(map_object, &map_key, compacted_item, force_array);
                } else if container.contains(Container::Graph)
                    && container.contains(Container::Index)
                    && is_simple_graph_object(expanded_item)
                {
                    let map_key = match expanded_item.get("@index").and_then(JsonValue::as_str) {
                        Some(index) => index.to_string(),
                        None => self.compact_iri(active, "@none", None, true, false)?,
                    };
                    let map_object = map_entry(target, &item_active_property, ErrorCode::InvalidContainerMapping)?;
                    add_value(map_object, &map_key, compacted_item, force_array);
                } else if container.contains(Container::Graph) && is_simple_graph_object(expanded_item) {
                    if compacted_item.as_array().is_some_and(|a| a.len() > 1) {
                        let alias = self.compact_iri(active, "@included", None, true, false)?;
                        let mut included = Map::new();
                        included.insert(alias, compacted_item);
                        compacted_item = JsonValue::Object(included);
                    }
                    add_value(target, &item_active_property, compacted_item, force_array);
                } else {
                    let mut wrapped = Map::new();
                    wrapped.insert(
                        self.compact_iri(active, "@graph", None, true, false)?,
                        JsonValue::Array(as_array(compacted_item)),
                    );
                    if let Some(id) = expanded_item.get("@id").and_then(JsonValue::as_str) {
                        wrapped.insert(
                            self.compact_iri(active, "@id", None, true, false)?,
                            JsonValue::String(self.compact_iri(active, id, None, false, false)?),
                        );
                    }
                    if let Some(index) = expanded_item.get("@index") {
                        wrapped.insert(self.compact_iri(active, "@index", None, true, false)?, index.clone());
                    }
                    add_value(target, &item_active_property, JsonValue::Object(wrapped), force_array);
                }
                continue;
            }

            let map_container = [Container::Language, Container::Index, Container::Id, Container::Type]
                .into_iter()
                .find(|c| container.contains(*c));
            if let (Some(map_container), false) = (map_container, container.contains(Container::Graph)) {
                let mut container_key = self.compact_iri(active, map_container.as_str(), None, true, false)?;
                let index_key = def.and_then(|d| d.index.as_deref()).unwrap_or("@index");
                let mut map_key: Option<String> = None;

                match map_container {
                    Container::Language => {
                        if let Some(value) = expanded_item.get("@value") {
                            compacted_item = value.clone();
                            map_key = expanded_item
                                .get("@language")
                                .and_then(JsonValue::as_str)
                                .map(str::to_string);
                        }
                    }
                    Container::Index if index_key == "@index" => {
                        map_key = expanded_item
                            .get("@index")
                            .and_then(JsonValue::as_str)
                            .map(str::to_string);
                    }
                    Container::Index => {
                        container_key = self.compact_iri(active, index_key, None, true, false)?;
                        if let JsonValue::Object(ref mut obj) = compacted_item {
                            map_key = take_first_string(obj, &container_key);
                        }
                    }
                    Container::Id => {
                        if let JsonValue::Object(ref mut obj) = compacted_item {
                            map_key = obj
                                .remove(&container_key)
                                .and_then(|v| v.as_str().map(str::to_string));
                        }
                    }
                    _ => {
                        let mut only_id_left = false;
                        if let JsonValue::Object(ref mut obj) = compacted_item {
                            map_key = take_first_string(obj, &container_key);
                            only_id_left = obj.len() == 1;
                        }
                        if only_id_left {
                            if let Some(id) = expanded_item.get("@id") {
                                compacted_item = self.compact_element(
                                    active,
                                    Some(&item_active_property),
                                    &json!({ "@id": id }),
                                )?;
                            }
                        }
                    }
                }

                let map_key = match map_key {
                    Some(key) => key,
                    None => self.compact_iri(active, "@none", None, true, false)?,
                };
                let map_object = map_entry(target, &item_active_property, ErrorCode::InvalidContainerMapping)?;
                add_value(map_object, &map_key, compacted_item, force_array);
                continue;
            }

            add_value(target, &item_active_property, compacted_item, force_array);
        }
        Ok(())
    }

    /// Value compaction: the scalar (or JSON literal) a value object or node
    /// reference collapses to, if the term definition allows it.
    fn compact_value(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        value: &Map<String, JsonValue>,
    ) -> Result<Option<JsonValue>> {
        let def = active.term(active_property);
        let type_mapping = def.and_then(|d| d.type_mapping.as_deref());

        if !value.contains_key("@value") {
            if value.len() != 1 {
                return Ok(None);
            }
            let Some(id) = value.get("@id").and_then(JsonValue::as_str) else {
                return Ok(None);
            };
            return Ok(match type_mapping {
                Some("@id") => Some(JsonValue::String(self.compact_iri(active, id, None, false, false)?)),
                Some("@vocab") => Some(JsonValue::String(self.compact_iri(active, id, None, true, false)?)),
                _ => None,
            });
        }

        let container = active.container_of(active_property);
        let preserve_index = value.contains_key("@index") && !container.contains(Container::Index);
        if preserve_index || type_mapping == Some("@none") {
            return Ok(None);
        }

        let inner = &value["@value"];
        match value.get("@type") {
            Some(datatype) => {
                if datatype.as_str().is_some_and(|t| Some(t) == type_mapping) {
                    return Ok(Some(inner.clone()));
                }
                Ok(None)
            }
            None => {
                if type_mapping.is_some() && inner.is_string() {
                    return Ok(None);
                }
                if !inner.is_string() {
                    return Ok(Some(inner.clone()));
                }
                let language = match def.and_then(|d| d.language.clone()) {
                    Some(language) => language,
                    None => active.language.clone(),
                };
                let direction = match def.and_then(|d| d.direction) {
                    Some(direction) => direction,
                    None => active.direction,
                };
                let value_language = value
                    .get("@language")
                    .and_then(JsonValue::as_str)
                    .map(str::to_lowercase);
                let value_direction = value.get("@direction").and_then(JsonValue::as_str);
                if value_language == language.map(|l| l.to_lowercase())
                    && value_direction == direction.map(|d| d.as_str())
                {
                    return Ok(Some(inner.clone()));
                }
                Ok(None)
            }
        }
    }

    /// IRI compaction.
    ///
    /// `vocab` allows terms and @vocab-relative forms; otherwise the result
    /// may be a compact IRI or a reference relative to the base IRI.
    pub fn compact_iri(
        &self,
        active: &ActiveContext,
        var: &str,
        value: Option<&JsonValue>,
        vocab: bool,
        reverse: bool,
    ) -> Result<String> {
        if vocab && active.inverse().contains(var) {
            if let Some(term) = self.select_term(active, var, value, reverse) {
                return Ok(term);
            }
        }

        if vocab {
            if let Some(ref vocab_iri) = active.vocab {
                if let Some(suffix) = var.strip_prefix(vocab_iri.as_str()) {
                    if !suffix.is_empty() && !active.contains(suffix) {
                        return Ok(suffix.to_string());
                    }
                }
            }
        }

        let mut compact: Option<String> = None;
        for (term, def) in &active.terms {
            let Some(ref term_iri) = def.iri else {
                continue;
            };
            if !def.prefix || term_iri == var || !var.starts_with(term_iri.as_str()) {
                continue;
            }
            let candidate = format!("{}:{}", term, &var[term_iri.len()..]);
            let shorter = match compact {
                None => true,
                Some(ref best) => {
                    candidate.len() < best.len() || (candidate.len() == best.len() && candidate < *best)
                }
            };
            let usable = match active.get(&candidate) {
                None => true,
                Some(def) => def.iri.as_deref() == Some(var) && value.is_none(),
            };
            if shorter && usable {
                compact = Some(candidate);
            }
        }
        if let Some(compact) = compact {
            return Ok(compact);
        }

        if let Some((scheme, rest)) = iri::split_prefix(var) {
            if !rest.starts_with("//") && active.get(scheme).is_some_and(|d| d.prefix) {
                return Err(JsonLdError::new(
                    ErrorCode::IriConfusedWithPrefix,
                    format!("absolute IRI '{}' confused with prefix '{}'", var, scheme),
                ));
            }
        }

        if !vocab && self.contexts.options().compact_to_relative {
            if let Some(ref base) = active.base {
                if let Some(relative) = iri::relativize(base, var) {
                    return Ok(relative);
                }
            }
        }

        Ok(var.to_string())
    }

    /// Pick the best term for `var` given the shape of `value`.
    fn select_term(
        &self,
        active: &ActiveContext,
        var: &str,
        value: Option<&JsonValue>,
        reverse: bool,
    ) -> Option<String> {
        let default_language = match active.direction {
            Some(direction) => format!(
                "{}_{}",
                active.language.as_deref().unwrap_or("").to_lowercase(),
                direction
            ),
            None => active
                .language
                .as_ref()
                .map(|l| l.to_lowercase())
                .unwrap_or_else(|| "@none".to_string()),
        };

        let value = match value {
            Some(v) if v.get("@preserve").is_some() => as_slice(&v["@preserve"]).first(),
            other => other,
        };
        let obj = value.and_then(JsonValue::as_object);
        let has = |key: &str| obj.is_some_and(|m| m.contains_key(key));
        let is_graph = value.is_some_and(is_graph_object);

        let mut containers: Vec<&str> = Vec::new();
        let mut which = TypeOrLanguage::Language;
        let mut type_language_value = "@null".to_string();

        if has("@index") && !is_graph {
            containers.extend(["@index", "@index@set"]);
        }

        if reverse {
            which = TypeOrLanguage::Type;
            type_language_value = "@reverse".to_string();
            containers.push("@set");
        } else if value.is_some_and(is_list_object) {
            if !has("@index") {
                containers.push("@list");
            }
            let list = obj
                .and_then(|m| m.get("@list"))
                .map(as_slice)
                .unwrap_or_default();
            let mut common_language = list.is_empty().then(|| default_language.clone());
            let mut common_type: Option<String> = None;
            for item in list {
                let mut item_language = "@none".to_string();
                let mut item_type = "@none".to_string();
                if is_value_object(item) {
                    if let Some(direction) = item.get("@direction").and_then(JsonValue::as_str) {
                        let language = item.get("@language").and_then(JsonValue::as_str).unwrap_or("");
                        item_language = format!("{}_{}", language.to_lowercase(), direction);
                    } else if let Some(language) = item.get("@language").and_then(JsonValue::as_str) {
                        item_language = language.to_lowercase();
                    } else if let Some(datatype) = item.get("@type").and_then(JsonValue::as_str) {
                        item_type = datatype.to_string();
                    } else {
                        item_language = "@null".to_string();
                    }
                } else {
                    item_type = "@id".to_string();
                }

                match common_language {
                    None => common_language = Some(item_language),
                    Some(ref common) if *common != item_language && is_value_object(item) => {
                        common_language = Some("@none".to_string());
                    }
                    _ => {}
                }
                match common_type {
                    None => common_type = Some(item_type),
                    Some(ref common) if *common != item_type => common_type = Some("@none".to_string()),
                    _ => {}
                }
                if common_language.as_deref() == Some("@none") && common_type.as_deref() == Some("@none") {
                    break;
                }
            }
            let common_language = common_language.unwrap_or_else(|| "@none".to_string());
            let common_type = common_type.unwrap_or_else(|| "@none".to_string());
            if common_type != "@none" {
                which = TypeOrLanguage::Type;
                type_language_value = common_type;
            } else {
                type_language_value = common_language;
            }
        } else if is_graph {
            if has("@index") {
                containers.extend(["@graph@index", "@graph@index@set"]);
            }
            if has("@id") {
                containers.extend(["@graph@id", "@graph@id@set"]);
            }
            containers.extend(["@graph", "@graph@set", "@set"]);
            if !has("@index") {
                containers.extend(["@graph@index", "@graph@index@set"]);
            }
            if !has("@id") {
                containers.extend(["@graph@id", "@graph@id@set"]);
            }
            containers.extend(["@index", "@index@set"]);
            which = TypeOrLanguage::Type;
            type_language_value = "@id".to_string();
        } else {
            if let Some(item) = value.filter(|v| is_value_object(v)) {
                if let (Some(direction), false) =
                    (item.get("@direction").and_then(JsonValue::as_str), has("@index"))
                {
                    let language = item.get("@language").and_then(JsonValue::as_str).unwrap_or("");
                    type_language_value = format!("{}_{}", language.to_lowercase(), direction);
                    containers.extend(["@language", "@language@set"]);
                } else if let (Some(language), false) =
                    (item.get("@language").and_then(JsonValue::as_str), has("@index"))
                {
                    type_language_value = language.to_lowercase();
                    containers.extend(["@language", "@language@set"]);
                } else if let Some(datatype) = item.get("@type").and_then(JsonValue::as_str) {
                    which = TypeOrLanguage::Type;
                    type_language_value = datatype.to_string();
                }
            } else {
                which = TypeOrLanguage::Type;
                type_language_value = "@id".to_string();
                containers.extend(["@id", "@id@set", "@type", "@set@type"]);
            }
            containers.push("@set");
        }

        containers.push("@none");
        if !self.json_ld_10() {
            if !has("@index") {
                containers.extend(["@index", "@index@set"]);
            }
            if obj.is_some_and(|m| m.len() == 1 && m.contains_key("@value")) {
                containers.extend(["@language", "@language@set"]);
            }
        }

        let mut preferred: Vec<String> = Vec::new();
        if type_language_value == "@reverse" {
            preferred.push("@reverse".to_string());
        }
        let id = obj.and_then(|m| m.get("@id")).and_then(JsonValue::as_str);
        match id {
            Some(id) if type_language_value == "@id" || type_language_value == "@reverse" => {
                let compacted = self.compact_iri(active, id, None, true, false).ok();
                let maps_back = compacted
                    .and_then(|term| active.get(&term).and_then(|d| d.iri.clone()))
                    .is_some_and(|iri| iri == id);
                if maps_back {
                    preferred.extend(["@vocab", "@id", "@none"].map(String::from));
                } else {
                    preferred.extend(["@id", "@vocab", "@none"].map(String::from));
                }
            }
            _ => {
                preferred.push(type_language_value);
                preferred.push("@none".to_string());
                let empty_list = obj
                    .and_then(|m| m.get("@list"))
                    .and_then(JsonValue::as_array)
                    .is_some_and(Vec::is_empty);
                if empty_list {
                    which = TypeOrLanguage::Any;
                }
            }
        }
        preferred.push("@any".to_string());

        let direction_only: Vec<String> = preferred
            .iter()
            .filter_map(|p| p.find('_').map(|i| p[i..].to_string()))
            .collect();
        preferred.extend(direction_only);

        let containers: Vec<String> = containers.into_iter().map(String::from).collect();
        active
            .inverse()
            .select_term(var, &containers, which, &preferred)
            .map(str::to_string)
    }
}

/// Remove the first string value stored under `key`; any remaining values
/// stay in place.
fn take_first_string(obj: &mut Map<String, JsonValue>, key: &str) -> Option<String> {
    let first_is_string = obj
        .get(key)
        .map(as_slice)
        .and_then(|values| values.first())
        .is_some_and(JsonValue::is_string);
    if !first_is_string {
        return None;
    }
    let mut values = as_array(obj.remove(key).unwrap_or(JsonValue::Null)).into_iter();
    let first = values.next().and_then(|v| v.as_str().map(str::to_string));
    let rest: Vec<JsonValue> = values.collect();
    match rest.len() {
        0 => {}
        1 => {
            obj.insert(key.to_string(), rest.into_iter().next().unwrap_or(JsonValue::Null));
        }
        _ => {
            obj.insert(key.to_string(), JsonValue::Array(rest));
        }
    }
    first
}
