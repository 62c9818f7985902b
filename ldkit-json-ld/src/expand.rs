//! JSON-LD expansion
//!
//! Removes the context from a document: every property and type becomes an
//! absolute IRI (or keyword), every value an explicit value object, node
//! object, list or set, and container shorthands are unfolded.

use crate::context::processor::{ContextFlags, ContextProcessor};
use crate::context::{is_well_formed_language_tag, ActiveContext, Container, ContainerSet, TermDefinition};
use crate::diagnostics::WarningCode;
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::value::{
    add_value, as_array, as_slice, entries, is_graph_object, is_list_object, is_node_object,
    is_scalar, is_value_object, take_object,
};
use ldkit_vocab::keyword::looks_like_keyword;
use ldkit_vocab::Keyword;
use serde_json::{json, Map, Value as JsonValue};
use std::borrow::Cow;

/// Switches of one expansion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionFlags {
    /// Accept frame syntax (wildcards, match-none, framing keywords)
    pub frame_expansion: bool,
    /// Visit object entries in key order
    pub ordered: bool,
}

#[derive(Clone, Copy)]
pub struct ExpandProcessor<'a> {
    contexts: &'a ContextProcessor<'a>,
    flags: ExpansionFlags,
}

impl<'a> ExpandProcessor<'a> {
    pub fn new(contexts: &'a ContextProcessor<'a>, flags: ExpansionFlags) -> Self {
        Self { contexts, flags }
    }

    fn json_ld_10(&self) -> bool {
        self.contexts.options().is_json_ld_10()
    }

    fn language_tag(&self, language: &str) -> String {
        if !is_well_formed_language_tag(language) {
            self.contexts.diagnostics().warn(
                WarningCode::MalformedLanguageTag,
                format!("language tag '{}' is not well-formed", language),
            );
        }
        language.to_lowercase()
    }

    /// Expand `element` under `active_property`.
    ///
    /// Returns `Null` when the element vanishes (free-floating values, nodes
    /// with nothing but an `@id` at the top level, null values).
    pub fn expand_element(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &JsonValue,
        base_url: Option<&str>,
        from_map: bool,
    ) -> Result<JsonValue> {
        if active_property == Some("@default") && self.flags.frame_expansion {
            let plain = ExpandProcessor {
                flags: ExpansionFlags {
                    frame_expansion: false,
                    ..self.flags
                },
                ..*self
            };
            return plain.expand_element(active, active_property, element, base_url, from_map);
        }

        match element {
            JsonValue::Null => Ok(JsonValue::Null),
            JsonValue::Array(items) => {
                if active.container_of(active_property).contains(Container::List) {
                    return Ok(JsonValue::Array(self.expand_list_items(
                        active,
                        active_property,
                        items,
                        base_url,
                    )?));
                }
                let mut result = Vec::new();
                for item in items {
                    let expanded =
                        self.expand_element(active, active_property, item, base_url, from_map)?;
                    result.extend(as_array(expanded));
                }
                Ok(JsonValue::Array(result))
            }
            JsonValue::Object(map) => {
                self.expand_object(active, active_property, map, base_url, from_map)
            }
            scalar => {
                if active_property.is_none() || active_property == Some("@graph") {
                    return Ok(JsonValue::Null);
                }
                match active.term(active_property).and_then(scoped_context) {
                    Some((context, context_base)) => {
                        let scoped = self.contexts.process_with(
                            active,
                            context,
                            context_base,
                            &[],
                            ContextFlags::property_scoped(),
                        )?;
                        Ok(expand_value(&scoped, active_property, scalar))
                    }
                    None => Ok(expand_value(active, active_property, scalar)),
                }
            }
        }
    }

    /// Items of a list; nested arrays become nested lists.
    fn expand_list_items(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        items: &[JsonValue],
        base_url: Option<&str>,
    ) -> Result<Vec<JsonValue>> {
        let mut result = Vec::new();
        for item in items {
            if let JsonValue::Array(nested) = item {
                if self.json_ld_10() {
                    return Err(JsonLdError::new(
                        ErrorCode::ListOfLists,
                        "lists of lists are not supported in json-ld-1.0",
                    ));
                }
                let nested = self.expand_list_items(active, active_property, nested, base_url)?;
                result.push(json!({ "@list": nested }));
                continue;
            }
            let expanded = self.expand_element(active, active_property, item, base_url, false)?;
            if self.json_ld_10() && is_list_object(&expanded) {
                return Err(JsonLdError::new(
                    ErrorCode::ListOfLists,
                    "lists of lists are not supported in json-ld-1.0",
                ));
            }
            result.extend(as_array(expanded));
        }
        Ok(result)
    }

    fn expand_object(
        &self,
        active_in: &ActiveContext,
        active_property: Option<&str>,
        element: &Map<String, JsonValue>,
        base_url: Option<&str>,
        from_map: bool,
    ) -> Result<JsonValue> {
        let previous = active_in.previous.clone();
        let mut active: Cow<'_, ActiveContext> = Cow::Borrowed(active_in);

        // A non-propagated context does not reach into new node objects.
        if let Some(ref previous) = previous {
            if !from_map {
                let expanded_keys: Vec<Option<String>> = element
                    .keys()
                    .map(|k| active_in.expand_iri(k, false, true))
                    .collect();
                let has_value = expanded_keys.iter().any(|k| k.as_deref() == Some("@value"));
                let only_id = expanded_keys.len() == 1 && expanded_keys[0].as_deref() == Some("@id");
                if !has_value && !only_id {
                    active = Cow::Borrowed(previous.as_ref());
                }
            }
        }

        if let Some((context, context_base)) = active_in.term(active_property).and_then(scoped_context) {
            active = Cow::Owned(self.contexts.process_with(
                &active,
                context,
                context_base,
                &[],
                ContextFlags::property_scoped(),
            )?);
        }

        if let Some(context) = element.get("@context") {
            active = Cow::Owned(self.contexts.process(&active, context, base_url)?);
        }

        let type_scoped = active.clone();

        let mut type_keys: Vec<&String> = element
            .keys()
            .filter(|k| active.expand_iri(k, false, true).as_deref() == Some("@type"))
            .collect();
        type_keys.sort();

        for key in &type_keys {
            let mut terms: Vec<&str> = as_slice(&element[key.as_str()])
                .iter()
                .filter_map(JsonValue::as_str)
                .collect();
            terms.sort_unstable();
            for term in terms {
                if let Some((context, context_base)) = type_scoped.get(term).and_then(scoped_context) {
                    active = Cow::Owned(self.contexts.process_with(
                        &active,
                        context,
                        context_base,
                        &[],
                        ContextFlags::type_scoped(),
                    )?);
                }
            }
        }

        let input_type = type_keys
            .first()
            .and_then(|k| as_slice(&element[k.as_str()]).last())
            .and_then(JsonValue::as_str)
            .and_then(|t| active.expand_iri(t, false, true));

        let mut result = Map::new();
        self.expand_entries(
            &active,
            &type_scoped,
            active_property,
            element,
            base_url,
            input_type.as_deref(),
            &mut result,
        )?;

        self.finish_object(result, active_property)
    }

    /// Validation and shaping of an expanded map.
    fn finish_object(
        &self,
        mut result: Map<String, JsonValue>,
        active_property: Option<&str>,
    ) -> Result<JsonValue> {
        let frame = self.flags.frame_expansion;

        if result.contains_key("@value") {
            if !frame {
                let extra = result.keys().any(|k| {
                    !matches!(
                        k.as_str(),
                        "@direction" | "@index" | "@language" | "@type" | "@value"
                    )
                });
                let typed_with_language = result.contains_key("@type")
                    && (result.contains_key("@language") || result.contains_key("@direction"));
                if extra || typed_with_language {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidValueObject,
                        format!("invalid value object with keys {:?}", result.keys().collect::<Vec<_>>()),
                    ));
                }
            }

            let is_json = result.get("@type").and_then(JsonValue::as_str) == Some("@json");
            if !is_json {
                let value = &result["@value"];
                if value.is_null() || (!frame && value.as_array().is_some_and(Vec::is_empty)) {
                    return Ok(JsonValue::Null);
                }
                if !frame {
                    if !value.is_string() && result.contains_key("@language") {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidLanguageTaggedValue,
                            format!("language-tagged value must be a string, found {}", value),
                        ));
                    }
                    if let Some(datatype) = result.get("@type") {
                        if !datatype.as_str().is_some_and(iri::is_absolute) {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidTypedValue,
                                format!("value type must be an IRI, found {}", datatype),
                            ));
                        }
                    }
                }
            }
        } else {
            if let Some(types) = result.get_mut("@type") {
                if !types.is_array() {
                    *types = JsonValue::Array(vec![types.take()]);
                }
            }

            if result.contains_key("@set") || result.contains_key("@list") {
                let allowed = result.len() == 1 || (result.len() == 2 && result.contains_key("@index"));
                if !allowed {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidSetOrListObject,
                        "a set or list object may only contain @index besides its items",
                    ));
                }
                if let Some(set) = result.remove("@set") {
                    return Ok(set);
                }
            }
        }

        if result.len() == 1 && result.contains_key("@language") {
            return Ok(JsonValue::Null);
        }

        // Frames keep free-floating nodes: `{}` is a wildcard.
        if !frame && (active_property.is_none() || active_property == Some("@graph")) {
            let only_id = result.len() == 1 && result.contains_key("@id");
            if result.is_empty() || result.contains_key("@value") || result.contains_key("@list") || only_id {
                return Ok(JsonValue::Null);
            }
        }

        Ok(JsonValue::Object(result))
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_entries(
        &self,
        active: &ActiveContext,
        type_scoped: &ActiveContext,
        active_property: Option<&str>,
        element: &Map<String, JsonValue>,
        base_url: Option<&str>,
        input_type: Option<&str>,
        result: &mut Map<String, JsonValue>,
    ) -> Result<()> {
        let frame = self.flags.frame_expansion;
        let mut nests: Vec<&String> = Vec::new();

        for (key, value) in entries(element, self.flags.ordered) {
            if key == "@context" {
                continue;
            }
            let Some(expanded_property) = active.expand_iri(key, false, true) else {
                if looks_like_keyword(key) {
                    self.contexts.diagnostics().warn(
                        WarningCode::KeywordLikeValue,
                        format!("unrecognized keyword '{}' is ignored", key),
                    );
                }
                continue;
            };

            let Some(keyword) = Keyword::parse(&expanded_property) else {
                if expanded_property.contains(':') {
                    self.expand_property(active, key, &expanded_property, value, base_url, result)?;
                }
                continue;
            };

            if active_property == Some("@reverse") {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidReversePropertyMap,
                    format!("keyword '{}' used inside a reverse property map", expanded_property),
                ));
            }
            let repeatable = !self.json_ld_10() && matches!(keyword, Keyword::Included | Keyword::Type);
            if result.contains_key(&expanded_property) && !repeatable {
                return Err(JsonLdError::new(
                    ErrorCode::CollidingKeywords,
                    format!("'{}' appears more than once", expanded_property),
                ));
            }

            let expanded_value = match keyword {
                Keyword::Id => match value {
                    JsonValue::String(id) => match active.expand_iri(id, true, false) {
                        Some(id) if frame => json!([id]),
                        Some(id) => JsonValue::String(id),
                        None => continue,
                    },
                    JsonValue::Object(m) if frame && m.is_empty() => json!([{}]),
                    JsonValue::Array(items) if frame && items.iter().all(JsonValue::is_string) => {
                        JsonValue::Array(
                            items
                                .iter()
                                .filter_map(JsonValue::as_str)
                                .filter_map(|id| active.expand_iri(id, true, false))
                                .map(JsonValue::String)
                                .collect(),
                        )
                    }
                    other => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidIdValue,
                            format!("@id must be a string, found {}", other),
                        ))
                    }
                },

                Keyword::Type => {
                    let expanded = match value {
                        JsonValue::String(t) => match type_scoped.expand_iri(t, true, true) {
                            Some(t) => JsonValue::String(t),
                            None => continue,
                        },
                        JsonValue::Array(items) if items.iter().all(JsonValue::is_string) => {
                            JsonValue::Array(
                                items
                                    .iter()
                                    .filter_map(JsonValue::as_str)
                                    .filter_map(|t| type_scoped.expand_iri(t, true, true))
                                    .map(JsonValue::String)
                                    .collect(),
                            )
                        }
                        JsonValue::Object(m) if frame && m.is_empty() => value.clone(),
                        JsonValue::Object(m)
                            if frame && m.len() == 1 && m.get("@default").is_some_and(JsonValue::is_string) =>
                        {
                            let default = m["@default"].as_str().unwrap_or_default();
                            match type_scoped.expand_iri(default, true, true) {
                                Some(t) => json!({ "@default": t }),
                                None => continue,
                            }
                        }
                        other => {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidTypeValue,
                                format!("@type must be a string or array of strings, found {}", other),
                            ))
                        }
                    };
                    match result.remove("@type") {
                        Some(existing) => {
                            let mut types = as_array(existing);
                            types.extend(as_array(expanded));
                            JsonValue::Array(types)
                        }
                        None => expanded,
                    }
                }

                Keyword::Graph => JsonValue::Array(as_array(self.expand_element(
                    active,
                    Some("@graph"),
                    value,
                    base_url,
                    false,
                )?)),

                Keyword::Included => {
                    if self.json_ld_10() {
                        continue;
                    }
                    let included = as_array(self.expand_element(active, None, value, base_url, false)?);
                    if !included.iter().all(is_node_object) {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidIncludedValue,
                            "@included values must be node objects",
                        ));
                    }
                    let mut all = result.remove("@included").map(as_array).unwrap_or_default();
                    all.extend(included);
                    JsonValue::Array(all)
                }

                Keyword::Value => {
                    if input_type == Some("@json") {
                        if self.json_ld_10() {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidValueObjectValue,
                                "JSON literals are not supported in json-ld-1.0",
                            ));
                        }
                        value.clone()
                    } else if frame {
                        match value {
                            JsonValue::Object(m) if m.is_empty() => json!([{}]),
                            JsonValue::Array(items) if items.iter().all(is_scalar) => value.clone(),
                            v if is_scalar(v) => json!([v]),
                            JsonValue::Null => JsonValue::Null,
                            other => {
                                return Err(JsonLdError::new(
                                    ErrorCode::InvalidValueObjectValue,
                                    format!("invalid @value pattern {}", other),
                                ))
                            }
                        }
                    } else if value.is_null() || is_scalar(value) {
                        value.clone()
                    } else {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidValueObjectValue,
                            format!("@value must be a scalar or null, found {}", value),
                        ));
                    }
                }

                Keyword::Language => match value {
                    JsonValue::String(language) => {
                        let language = self.language_tag(language);
                        if frame {
                            json!([language])
                        } else {
                            JsonValue::String(language)
                        }
                    }
                    JsonValue::Object(m) if frame && m.is_empty() => json!([{}]),
                    JsonValue::Array(items) if frame && items.iter().all(JsonValue::is_string) => {
                        JsonValue::Array(
                            items
                                .iter()
                                .filter_map(JsonValue::as_str)
                                .map(|l| JsonValue::String(self.language_tag(l)))
                                .collect(),
                        )
                    }
                    other => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidLanguageTaggedString,
                            format!("@language must be a string, found {}", other),
                        ))
                    }
                },

                Keyword::Direction => {
                    if self.json_ld_10() {
                        continue;
                    }
                    match value {
                        JsonValue::String(d) if d == "ltr" || d == "rtl" => {
                            if frame {
                                json!([d])
                            } else {
                                value.clone()
                            }
                        }
                        JsonValue::Object(m) if frame && m.is_empty() => json!([{}]),
                        other => {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidBaseDirection,
                                format!("@direction must be 'ltr' or 'rtl', found {}", other),
                            ))
                        }
                    }
                }

                Keyword::Index => match value {
                    JsonValue::String(_) => value.clone(),
                    other => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidIndexValue,
                            format!("@index must be a string, found {}", other),
                        ))
                    }
                },

                Keyword::List => {
                    if active_property.is_none() || active_property == Some("@graph") {
                        continue;
                    }
                    JsonValue::Array(self.expand_list_items(
                        active,
                        active_property,
                        as_slice(value),
                        base_url,
                    )?)
                }

                Keyword::Set => self.expand_element(active, active_property, value, base_url, false)?,

                Keyword::Reverse => {
                    if !value.is_object() {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidReverseValue,
                            format!("@reverse must be an object, found {}", value),
                        ));
                    }
                    let expanded = self.expand_element(active, Some("@reverse"), value, base_url, false)?;
                    if let JsonValue::Object(mut expanded) = expanded {
                        if let Some(JsonValue::Object(forward)) = expanded.remove("@reverse") {
                            for (property, items) in forward {
                                add_value(result, &property, items, true);
                            }
                        }
                        if !expanded.is_empty() {
                            let mut reverse_map = take_object(result, "@reverse");
                            for (property, items) in expanded {
                                for item in as_array(items) {
                                    if is_value_object(&item) || is_list_object(&item) {
                                        return Err(JsonLdError::new(
                                            ErrorCode::InvalidReversePropertyValue,
                                            format!("reverse property '{}' has a value or list object", property),
                                        ));
                                    }
                                    add_value(&mut reverse_map, &property, item, true);
                                }
                            }
                            result.insert("@reverse".to_string(), JsonValue::Object(reverse_map));
                        }
                    }
                    continue;
                }

                Keyword::Nest => {
                    if !nests.contains(&key) {
                        nests.push(key);
                    }
                    continue;
                }

                Keyword::Default if frame => {
                    JsonValue::Array(as_array(self.expand_element(
                        active,
                        Some("@default"),
                        value,
                        base_url,
                        false,
                    )?))
                }

                Keyword::Embed | Keyword::Explicit | Keyword::OmitDefault | Keyword::RequireAll
                    if frame =>
                {
                    JsonValue::Array(as_slice(value).to_vec())
                }

                _ => continue,
            };

            if expanded_value.is_null() && keyword != Keyword::Value {
                continue;
            }
            result.insert(expanded_property, expanded_value);
        }

        if self.flags.ordered {
            nests.sort();
        }
        for nesting_key in nests {
            for nested in as_slice(&element[nesting_key.as_str()]) {
                let JsonValue::Object(nested) = nested else {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidNestValue,
                        format!("value of '{}' must be an object", nesting_key),
                    ));
                };
                if nested
                    .keys()
                    .any(|k| active.expand_iri(k, false, true).as_deref() == Some("@value"))
                {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidNestValue,
                        format!("value of '{}' cannot be a value object", nesting_key),
                    ));
                }
                self.expand_entries(
                    active,
                    type_scoped,
                    Some(nesting_key.as_str()),
                    nested,
                    base_url,
                    input_type,
                    result,
                )?;
            }
        }

        Ok(())
    }

    /// Expand one non-keyword entry into `result`.
    fn expand_property(
        &self,
        active: &ActiveContext,
        key: &str,
        expanded_property: &str,
        value: &JsonValue,
        base_url: Option<&str>,
        result: &mut Map<String, JsonValue>,
    ) -> Result<()> {
        let def = active.get(key);
        let container = def.map(|d| d.container.clone()).unwrap_or_default();

        let mut expanded_value = if def.is_some_and(|d| d.type_mapping_is("@json")) {
            json!({ "@value": value, "@type": "@json" })
        } else if let (true, JsonValue::Object(map)) = (container.contains(Container::Language), value) {
            self.expand_language_map(active, def, map)?
        } else if let (true, JsonValue::Object(map)) = (
            container.contains(Container::Index)
                || container.contains(Container::Type)
                || container.contains(Container::Id),
            value,
        ) {
            self.expand_index_map(active, key, def, &container, map, base_url)?
        } else {
            self.expand_element(active, Some(key), value, base_url, false)?
        };

        if expanded_value.is_null() {
            return Ok(());
        }

        if container.contains(Container::List) && !is_list_object(&expanded_value) {
            expanded_value = json!({ "@list": as_array(expanded_value) });
        }

        if container.contains(Container::Graph)
            && !container.contains(Container::Id)
            && !container.contains(Container::Index)
        {
            expanded_value = JsonValue::Array(
                as_array(expanded_value)
                    .into_iter()
                    .map(|ev| json!({ "@graph": as_array(ev) }))
                    .collect(),
            );
        }

        if def.is_some_and(|d| d.reverse) {
            let mut reverse_map = take_object(result, "@reverse");
            for item in as_array(expanded_value) {
                if is_value_object(&item) || is_list_object(&item) {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidReversePropertyValue,
                        format!("reverse property '{}' has a value or list object", key),
                    ));
                }
                add_value(&mut reverse_map, expanded_property, item, true);
            }
            result.insert("@reverse".to_string(), JsonValue::Object(reverse_map));
        } else {
            add_value(result, expanded_property, expanded_value, true);
        }
        Ok(())
    }

    fn expand_language_map(
        &self,
        active: &ActiveContext,
        def: Option<&TermDefinition>,
        map: &Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        let direction = match def.and_then(|d| d.direction) {
            Some(direction) => direction,
            None => active.direction,
        };

        let mut expanded = Vec::new();
        for (language, language_value) in entries(map, self.flags.ordered) {
            let is_none = active.expand_iri(language, false, true).as_deref() == Some("@none");
            for item in as_slice(language_value) {
                match item {
                    JsonValue::Null => {}
                    JsonValue::String(s) => {
                        let mut v = Map::new();
                        v.insert("@value".to_string(), JsonValue::String(s.clone()));
                        if !is_none {
                            v.insert(
                                "@language".to_string(),
                                JsonValue::String(self.language_tag(language)),
                            );
                        }
                        if let Some(direction) = direction {
                            v.insert(
                                "@direction".to_string(),
                                JsonValue::String(direction.to_string()),
                            );
                        }
                        expanded.push(JsonValue::Object(v));
                    }
                    other => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidLanguageMapValue,
                            format!("language map values must be strings, found {}", other),
                        ))
                    }
                }
            }
        }
        Ok(JsonValue::Array(expanded))
    }

    fn expand_index_map(
        &self,
        active: &ActiveContext,
        key: &str,
        def: Option<&TermDefinition>,
        container: &ContainerSet,
        map: &Map<String, JsonValue>,
        base_url: Option<&str>,
    ) -> Result<JsonValue> {
        let index_key = def.and_then(|d| d.index.as_deref()).unwrap_or("@index");
        let type_map = container.contains(Container::Type);
        let map_base: &ActiveContext = if type_map {
            active.previous.as_deref().unwrap_or(active)
        } else {
            active
        };

        let mut expanded = Vec::new();
        for (index, index_value) in entries(map, self.flags.ordered) {
            let mut map_context = Cow::Borrowed(map_base);
            if type_map {
                if let Some((context, context_base)) = map_base.get(index).and_then(scoped_context) {
                    map_context = Cow::Owned(self.contexts.process_with(
                        map_base,
                        context,
                        context_base,
                        &[],
                        ContextFlags::type_scoped(),
                    )?);
                }
            }

            let expanded_index = if type_map {
                active.expand_iri(index, true, true)
            } else {
                active.expand_iri(index, false, true)
            };
            let is_none = expanded_index.as_deref() == Some("@none");

            let items = as_array(self.expand_element(&map_context, Some(key), index_value, base_url, true)?);
            for mut item in items {
                if container.contains(Container::Graph) && !is_graph_object(&item) {
                    item = json!({ "@graph": as_array(item) });
                }
                let is_value = is_value_object(&item);
                if let JsonValue::Object(ref mut obj) = item {
                    if container.contains(Container::Index) && index_key != "@index" && !is_none {
                        if is_value {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidValueObject,
                                format!("value objects cannot be indexed by property '{}'", index_key),
                            ));
                        }
                        let re_expanded =
                            expand_value(active, Some(index_key), &JsonValue::String(index.clone()));
                        if let Some(index_property) = active.expand_iri(index_key, false, true) {
                            let mut values = vec![re_expanded];
                            if let Some(existing) = obj.remove(&index_property) {
                                values.extend(as_array(existing));
                            }
                            obj.insert(index_property, JsonValue::Array(values));
                        }
                    } else if container.contains(Container::Index) && !obj.contains_key("@index") && !is_none {
                        obj.insert("@index".to_string(), JsonValue::String(index.clone()));
                    } else if container.contains(Container::Id) && !obj.contains_key("@id") && !is_none {
                        if let Some(id) = active.expand_iri(index, true, false) {
                            obj.insert("@id".to_string(), JsonValue::String(id));
                        }
                    } else if type_map && !is_none {
                        if let Some(ref expanded_index) = expanded_index {
                            let mut types = vec![JsonValue::String(expanded_index.clone())];
                            if let Some(existing) = obj.remove("@type") {
                                types.extend(as_array(existing));
                            }
                            obj.insert("@type".to_string(), JsonValue::Array(types));
                        }
                    }
                }
                expanded.push(item);
            }
        }
        Ok(JsonValue::Array(expanded))
    }
}

/// Scoped context and its base URL carried by a term definition
fn scoped_context(def: &TermDefinition) -> Option<(&JsonValue, Option<&str>)> {
    def.context
        .as_ref()
        .map(|context| (context, def.base_url.as_deref()))
}

/// Value expansion: coerce a scalar according to the term definition of
/// `active_property`.
pub fn expand_value(active: &ActiveContext, active_property: Option<&str>, value: &JsonValue) -> JsonValue {
    let def = active.term(active_property);
    let type_mapping = def.and_then(|d| d.type_mapping.as_deref());

    if let JsonValue::String(s) = value {
        let coerced = match type_mapping {
            Some("@id") => Some(active.expand_iri(s, true, false)),
            Some("@vocab") => Some(active.expand_iri(s, true, true)),
            _ => None,
        };
        if let Some(id) = coerced {
            return match id {
                Some(id) => json!({ "@id": id }),
                None => JsonValue::Null,
            };
        }
    }

    let mut result = Map::new();
    result.insert("@value".to_string(), value.clone());
    match type_mapping {
        Some(datatype) if !matches!(datatype, "@id" | "@vocab" | "@none") => {
            result.insert("@type".to_string(), JsonValue::String(datatype.to_string()));
        }
        _ if value.is_string() => {
            let language = match def.and_then(|d| d.language.clone()) {
                Some(language) => language,
                None => active.language.clone(),
            };
            let direction = match def.and_then(|d| d.direction) {
                Some(direction) => direction,
                None => active.direction,
            };
            if let Some(language) = language {
                result.insert("@language".to_string(), JsonValue::String(language));
            }
            if let Some(direction) = direction {
                result.insert(
                    "@direction".to_string(),
                    JsonValue::String(direction.to_string()),
                );
            }
        }
        _ => {}
    }
    JsonValue::Object(result)
}
