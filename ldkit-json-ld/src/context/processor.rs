//! Context processing and term definition creation
//!
//! Turns local contexts (inline objects, arrays, remote references or null)
//! into a new [`ActiveContext`]. Remote contexts are loaded through the
//! configured [`DocumentLoader`] and cached for the lifetime of the
//! processor, which is one API call.

use super::{
    is_well_formed_language_tag, ActiveContext, Container, ContainerSet, Direction,
    TermDefinition,
};
use crate::diagnostics::{Diagnostics, WarningCode};
use crate::error::{ErrorCode, JsonLdError, Result};
use crate::iri;
use crate::loader::{DocumentLoader, LoaderOptions, NoDocumentLoader};
use crate::options::JsonLdOptions;
use ldkit_vocab::keyword::{is_keyword, looks_like_keyword};
use serde_json::{Map, Value as JsonValue};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// Maximum nesting of remote context references
pub const MAX_REMOTE_CONTEXTS: usize = 32;

/// Switches of one context processing call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextFlags {
    /// Allow protected terms to be redefined (property-scoped contexts)
    pub override_protected: bool,
    /// Whether the context survives into nested node objects
    pub propagate: bool,
    /// Fully process scoped contexts found in term definitions
    pub validate_scoped: bool,
}

impl Default for ContextFlags {
    fn default() -> Self {
        Self {
            override_protected: false,
            propagate: true,
            validate_scoped: true,
        }
    }
}

impl ContextFlags {
    /// Flags for a property-scoped context
    pub fn property_scoped() -> Self {
        Self {
            override_protected: true,
            ..Default::default()
        }
    }

    /// Flags for a type-scoped context
    pub fn type_scoped() -> Self {
        Self {
            propagate: false,
            ..Default::default()
        }
    }
}

/// Arguments shared by the term definitions of one local context object
struct TermScope<'s> {
    base_url: Option<&'s str>,
    protected: bool,
    override_protected: bool,
    remote_contexts: &'s [String],
    validate_scoped: bool,
}

/// Entries allowed in an expanded term definition
const TERM_DEFINITION_KEYS: &[&str] = &[
    "@container",
    "@context",
    "@direction",
    "@id",
    "@index",
    "@language",
    "@nest",
    "@prefix",
    "@protected",
    "@reverse",
    "@type",
];

pub struct ContextProcessor<'a> {
    options: &'a JsonLdOptions,
    loader: &'a dyn DocumentLoader,
    diagnostics: &'a Diagnostics,
    /// Dereferenced remote contexts: url -> (@context value, document url)
    cache: RefCell<HashMap<String, (JsonValue, Option<String>)>>,
}

impl<'a> ContextProcessor<'a> {
    pub fn new(options: &'a JsonLdOptions, diagnostics: &'a Diagnostics) -> Self {
        let loader: &'a dyn DocumentLoader = match options.document_loader {
            Some(ref loader) => loader.as_ref(),
            None => &NoDocumentLoader,
        };
        Self {
            options,
            loader,
            diagnostics,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &JsonLdOptions {
        self.options
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.diagnostics
    }

    pub fn loader(&self) -> &dyn DocumentLoader {
        self.loader
    }

    /// Process `local` on top of `active` with default flags.
    pub fn process(
        &self,
        active: &ActiveContext,
        local: &JsonValue,
        base_url: Option<&str>,
    ) -> Result<ActiveContext> {
        self.process_with(active, local, base_url, &[], ContextFlags::default())
    }

    /// Context processing with explicit remote context stack and flags.
    pub fn process_with(
        &self,
        active: &ActiveContext,
        local: &JsonValue,
        base_url: Option<&str>,
        remote_contexts: &[String],
        flags: ContextFlags,
    ) -> Result<ActiveContext> {
        let mut result = active.clone();
        let mut propagate = flags.propagate;

        if let JsonValue::Object(map) = local {
            if let Some(value) = map.get("@propagate") {
                propagate = value.as_bool().ok_or_else(|| {
                    JsonLdError::new(
                        ErrorCode::InvalidPropagateValue,
                        format!("@propagate must be a boolean, found {}", value),
                    )
                })?;
            }
        }

        if !propagate && result.previous.is_none() {
            result.previous = Some(Arc::new(active.clone()));
        }

        let contexts: Vec<&JsonValue> = match local {
            JsonValue::Array(items) => items.iter().collect(),
            other => vec![other],
        };

        let mut remote_contexts = remote_contexts.to_vec();
        for context in contexts {
            match context {
                JsonValue::Null => {
                    if !flags.override_protected && result.has_protected_terms() {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidContextNullification,
                            "cannot nullify a context containing protected terms",
                        ));
                    }
                    let previous = (!propagate).then(|| Arc::new(result.clone()));
                    result = ActiveContext::with_base(active.original_base.clone());
                    result.previous = previous;
                }
                JsonValue::String(reference) => {
                    let url = iri::resolve(base_url, reference);
                    if !flags.validate_scoped && remote_contexts.contains(&url) {
                        continue;
                    }
                    if remote_contexts.len() >= MAX_REMOTE_CONTEXTS {
                        return Err(JsonLdError::new(
                            ErrorCode::ContextOverflow,
                            format!("too many nested remote contexts loading <{}>", url),
                        ));
                    }
                    remote_contexts.push(url.clone());

                    let (loaded, document_url) = self.load_remote_context(&url)?;
                    result = self.process_with(
                        &result,
                        &loaded,
                        document_url.as_deref().or(Some(url.as_str())),
                        &remote_contexts,
                        ContextFlags {
                            validate_scoped: flags.validate_scoped,
                            ..Default::default()
                        },
                    )?;
                }
                JsonValue::Object(map) => {
                    self.process_object(&mut result, map, base_url, &remote_contexts, flags)?;
                }
                other => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidLocalContext,
                        format!("context must be an object, string or null, found {}", other),
                    ));
                }
            }
        }

        Ok(result)
    }

    fn process_object(
        &self,
        result: &mut ActiveContext,
        map: &Map<String, JsonValue>,
        base_url: Option<&str>,
        remote_contexts: &[String],
        flags: ContextFlags,
    ) -> Result<()> {
        let json_ld_10 = self.options.is_json_ld_10();

        if let Some(version) = map.get("@version") {
            if version.as_f64() != Some(1.1) {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidVersionValue,
                    format!("@version must be 1.1, found {}", version),
                ));
            }
            if json_ld_10 {
                return Err(JsonLdError::new(
                    ErrorCode::ProcessingModeConflict,
                    "@version 1.1 used in json-ld-1.0 processing mode",
                ));
            }
        }

        let imported;
        let map = match map.get("@import") {
            Some(import) => {
                imported = self.import_context(map, import, base_url)?;
                &imported
            }
            None => map,
        };

        if let Some(value) = map.get("@base") {
            if remote_contexts.is_empty() {
                result.base = match value {
                    JsonValue::Null => None,
                    JsonValue::String(base) if iri::is_absolute(base) => Some(base.clone()),
                    JsonValue::String(base) => match result.base {
                        Some(ref current) => Some(iri::resolve(Some(current), base)),
                        None => {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidBaseIri,
                                format!("relative @base '{}' without a base IRI", base),
                            ))
                        }
                    },
                    other => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidBaseIri,
                            format!("@base must be a string or null, found {}", other),
                        ))
                    }
                };
            }
        }

        if let Some(value) = map.get("@vocab") {
            result.vocab = match value {
                JsonValue::Null => None,
                JsonValue::String(vocab) => {
                    if iri::is_blank_node(vocab) {
                        self.diagnostics.warn(
                            WarningCode::BlankNodeVocab,
                            format!("@vocab set to blank node identifier '{}'", vocab),
                        );
                    }
                    if json_ld_10 && !iri::is_absolute(vocab) {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidVocabMapping,
                            format!("@vocab must be an absolute IRI, found '{}'", vocab),
                        ));
                    }
                    match result.expand_iri(vocab, true, true) {
                        Some(expanded) if !is_keyword(&expanded) => Some(expanded),
                        _ => {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidVocabMapping,
                                format!("invalid @vocab '{}'", vocab),
                            ))
                        }
                    }
                }
                other => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidVocabMapping,
                        format!("@vocab must be a string or null, found {}", other),
                    ))
                }
            };
        }

        if let Some(value) = map.get("@language") {
            result.language = match value {
                JsonValue::Null => None,
                JsonValue::String(language) => Some(self.language_tag(language)),
                other => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidDefaultLanguage,
                        format!("@language must be a string or null, found {}", other),
                    ))
                }
            };
        }

        if let Some(value) = map.get("@direction") {
            if json_ld_10 {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidContextEntry,
                    "@direction is not supported in json-ld-1.0",
                ));
            }
            result.direction = match value {
                JsonValue::Null => None,
                JsonValue::String(s) => Some(Direction::parse(s).ok_or_else(|| {
                    JsonLdError::new(
                        ErrorCode::InvalidBaseDirection,
                        format!("@direction must be 'ltr' or 'rtl', found '{}'", s),
                    )
                })?),
                other => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidBaseDirection,
                        format!("@direction must be a string or null, found {}", other),
                    ))
                }
            };
        }

        if map.contains_key("@propagate") && json_ld_10 {
            return Err(JsonLdError::new(
                ErrorCode::InvalidContextEntry,
                "@propagate is not supported in json-ld-1.0",
            ));
        }

        let protected = match map.get("@protected") {
            None => false,
            Some(JsonValue::Bool(b)) => *b,
            Some(other) => {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidProtectedValue,
                    format!("@protected must be a boolean, found {}", other),
                ))
            }
        };

        let scope = TermScope {
            base_url,
            protected,
            override_protected: flags.override_protected,
            remote_contexts,
            validate_scoped: flags.validate_scoped,
        };
        let mut defined: HashMap<String, bool> = HashMap::new();
        for key in map.keys() {
            if matches!(
                key.as_str(),
                "@base"
                    | "@direction"
                    | "@import"
                    | "@language"
                    | "@propagate"
                    | "@protected"
                    | "@version"
                    | "@vocab"
            ) {
                continue;
            }
            self.create_term_definition(result, map, key, &mut defined, &scope)?;
        }

        Ok(())
    }

    /// Merge the context referenced by `@import` under the local context.
    fn import_context(
        &self,
        map: &Map<String, JsonValue>,
        import: &JsonValue,
        base_url: Option<&str>,
    ) -> Result<Map<String, JsonValue>> {
        if self.options.is_json_ld_10() {
            return Err(JsonLdError::new(
                ErrorCode::InvalidContextEntry,
                "@import is not supported in json-ld-1.0",
            ));
        }
        let JsonValue::String(reference) = import else {
            return Err(JsonLdError::new(
                ErrorCode::InvalidImportValue,
                format!("@import must be a string, found {}", import),
            ));
        };
        let url = iri::resolve(base_url, reference);
        let (loaded, _) = self.load_remote_context(&url)?;
        let JsonValue::Object(mut merged) = loaded else {
            return Err(JsonLdError::new(
                ErrorCode::InvalidRemoteContext,
                format!("imported context <{}> is not an object", url),
            ));
        };
        if merged.contains_key("@import") {
            return Err(JsonLdError::new(
                ErrorCode::InvalidContextEntry,
                format!("imported context <{}> contains @import", url),
            ));
        }
        for (key, value) in map {
            if key != "@import" {
                merged.insert(key.clone(), value.clone());
            }
        }
        Ok(merged)
    }

    /// Dereference a remote context, returning its `@context` value.
    fn load_remote_context(&self, url: &str) -> Result<(JsonValue, Option<String>)> {
        if let Some(cached) = self.cache.borrow().get(url) {
            return Ok(cached.clone());
        }

        tracing::debug!(url = %url, "loading remote context");
        let remote = self
            .loader
            .load(url, &LoaderOptions::for_context())
            .map_err(|e| {
                JsonLdError::loading(ErrorCode::LoadingRemoteContextFailed, url, e.to_string())
            })?;
        let document_url = remote.document_url.clone();
        let document = remote.into_json().map_err(|e| {
            JsonLdError::loading(ErrorCode::LoadingRemoteContextFailed, url, e.to_string())
        })?;

        let context = match document {
            JsonValue::Object(mut map) if map.contains_key("@context") => {
                map.remove("@context").unwrap_or(JsonValue::Null)
            }
            _ => {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidRemoteContext,
                    format!("remote context <{}> has no top-level @context", url),
                ))
            }
        };

        let entry = (context, document_url);
        self.cache
            .borrow_mut()
            .insert(url.to_string(), entry.clone());
        Ok(entry)
    }

    fn language_tag(&self, language: &str) -> String {
        if !is_well_formed_language_tag(language) {
            self.diagnostics.warn(
                WarningCode::MalformedLanguageTag,
                format!("language tag '{}' is not well-formed", language),
            );
        }
        language.to_lowercase()
    }

    fn create_term_definition(
        &self,
        active: &mut ActiveContext,
        local: &Map<String, JsonValue>,
        term: &str,
        defined: &mut HashMap<String, bool>,
        scope: &TermScope<'_>,
    ) -> Result<()> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(JsonLdError::new(
                    ErrorCode::CyclicIriMapping,
                    format!("term '{}' is defined in terms of itself", term),
                ))
            }
            None => {}
        }
        if term.is_empty() {
            return Err(JsonLdError::new(
                ErrorCode::InvalidTermDefinition,
                "the empty string is not a valid term",
            ));
        }
        defined.insert(term.to_string(), false);

        let json_ld_10 = self.options.is_json_ld_10();
        let raw = local.get(term).cloned().unwrap_or(JsonValue::Null);

        if term == "@type" {
            let allowed = !json_ld_10
                && match raw {
                    JsonValue::Object(ref m) => {
                        !m.is_empty()
                            && m.keys().all(|k| k == "@container" || k == "@protected")
                            && m.get("@container").map_or(true, |c| {
                                c == "@set" || *c == JsonValue::Array(vec!["@set".into()])
                            })
                    }
                    _ => false,
                };
            if !allowed {
                return Err(JsonLdError::new(
                    ErrorCode::KeywordRedefinition,
                    "@type may only be given @container: @set and @protected",
                ));
            }
        } else if is_keyword(term) {
            return Err(JsonLdError::new(
                ErrorCode::KeywordRedefinition,
                format!("keyword '{}' cannot be redefined", term),
            ));
        } else if looks_like_keyword(term) {
            self.diagnostics.warn(
                WarningCode::KeywordLikeValue,
                format!("term '{}' has the form of a keyword and is ignored", term),
            );
            defined.insert(term.to_string(), true);
            return Ok(());
        }

        let previous_definition = active.terms.remove(term);

        let mut simple_term = false;
        let value: Map<String, JsonValue> = match raw {
            JsonValue::Null => {
                let mut m = Map::new();
                m.insert("@id".to_string(), JsonValue::Null);
                m
            }
            JsonValue::String(s) => {
                simple_term = true;
                let mut m = Map::new();
                m.insert("@id".to_string(), JsonValue::String(s));
                m
            }
            JsonValue::Object(m) => m,
            other => {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    format!("term '{}' must map to a string, object or null, found {}", term, other),
                ))
            }
        };

        let mut definition = TermDefinition {
            protected: scope.protected,
            ..Default::default()
        };

        if let Some(protected) = value.get("@protected") {
            if json_ld_10 {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    "@protected is not supported in json-ld-1.0",
                ));
            }
            definition.protected = protected.as_bool().ok_or_else(|| {
                JsonLdError::new(
                    ErrorCode::InvalidProtectedValue,
                    format!("@protected must be a boolean, found {}", protected),
                )
            })?;
        }

        if let Some(type_value) = value.get("@type") {
            let JsonValue::String(type_str) = type_value else {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTypeMapping,
                    format!("@type of term '{}' must be a string", term),
                ));
            };
            let expanded = self
                .expand_iri_creating(active, type_str, false, true, local, defined, scope)?
                .ok_or_else(|| {
                    JsonLdError::new(
                        ErrorCode::InvalidTypeMapping,
                        format!("@type '{}' of term '{}' does not expand", type_str, term),
                    )
                })?;
            let keyword_type = matches!(expanded.as_str(), "@id" | "@json" | "@none" | "@vocab");
            if (json_ld_10 && matches!(expanded.as_str(), "@json" | "@none"))
                || (!keyword_type && (!iri::is_absolute(&expanded) || iri::is_blank_node(&expanded)))
            {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTypeMapping,
                    format!("invalid @type '{}' for term '{}'", expanded, term),
                ));
            }
            definition.type_mapping = Some(expanded);
        }

        if let Some(reverse) = value.get("@reverse") {
            if value.contains_key("@id") || value.contains_key("@nest") {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidReverseProperty,
                    format!("reverse term '{}' cannot have @id or @nest", term),
                ));
            }
            let JsonValue::String(reverse) = reverse else {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidIriMapping,
                    format!("@reverse of term '{}' must be a string", term),
                ));
            };
            if looks_like_keyword(reverse) {
                self.diagnostics.warn(
                    WarningCode::KeywordLikeValue,
                    format!("@reverse '{}' has the form of a keyword", reverse),
                );
                defined.insert(term.to_string(), true);
                return Ok(());
            }
            let expanded = self
                .expand_iri_creating(active, reverse, false, true, local, defined, scope)?
                .filter(|iri| iri.contains(':') && !is_keyword(iri))
                .ok_or_else(|| {
                    JsonLdError::new(
                        ErrorCode::InvalidIriMapping,
                        format!("@reverse '{}' of term '{}' is not an IRI", reverse, term),
                    )
                })?;
            if iri::is_blank_node(&expanded) {
                self.diagnostics.warn(
                    WarningCode::BlankNodeTerm,
                    format!("term '{}' is a reverse blank node property", term),
                );
            }
            definition.iri = Some(expanded);

            if let Some(container) = value.get("@container") {
                match container {
                    JsonValue::Null => {}
                    JsonValue::String(c) if c == "@set" || c == "@index" => {
                        definition.container = self.parse_container(container, term)?;
                    }
                    _ => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidReverseProperty,
                            format!("reverse term '{}' container must be @set or @index", term),
                        ))
                    }
                }
            }
            definition.reverse = true;
            return self.finish_definition(active, term, definition, previous_definition, defined, scope);
        }

        let id_entry = value.get("@id");
        if let Some(id) = id_entry.filter(|id| id.as_str() != Some(term)) {
            match id {
                JsonValue::Null => {}
                JsonValue::String(id) => {
                    if !is_keyword(id) && looks_like_keyword(id) {
                        self.diagnostics.warn(
                            WarningCode::KeywordLikeValue,
                            format!("@id '{}' of term '{}' has the form of a keyword", id, term),
                        );
                        defined.insert(term.to_string(), true);
                        return Ok(());
                    }
                    let expanded = self
                        .expand_iri_creating(active, id, false, true, local, defined, scope)?
                        .filter(|iri| is_keyword(iri) || iri.contains(':'))
                        .ok_or_else(|| {
                            JsonLdError::new(
                                ErrorCode::InvalidIriMapping,
                                format!("@id '{}' of term '{}' is not an IRI", id, term),
                            )
                        })?;
                    if expanded == "@context" {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidKeywordAlias,
                            "@context cannot be aliased",
                        ));
                    }

                    let inner_colon = term
                        .char_indices()
                        .any(|(i, c)| c == ':' && i > 0 && i + 1 < term.len());
                    if inner_colon || term.contains('/') {
                        defined.insert(term.to_string(), true);
                        let term_iri =
                            self.expand_iri_creating(active, term, false, true, local, defined, scope)?;
                        if term_iri.as_deref() != Some(expanded.as_str()) {
                            return Err(JsonLdError::new(
                                ErrorCode::InvalidIriMapping,
                                format!(
                                    "term '{}' looks like an IRI but maps to a different IRI '{}'",
                                    term, expanded
                                ),
                            ));
                        }
                    }

                    if !term.contains(':')
                        && !term.contains('/')
                        && simple_term
                        && (iri::ends_with_gen_delim(&expanded) || iri::is_blank_node(&expanded))
                    {
                        definition.prefix = true;
                    }
                    if iri::is_blank_node(&expanded) {
                        self.diagnostics.warn(
                            WarningCode::BlankNodeTerm,
                            format!("term '{}' maps to blank node '{}'", term, expanded),
                        );
                    }
                    definition.iri = Some(expanded);
                }
                other => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidIriMapping,
                        format!("@id of term '{}' must be a string or null, found {}", term, other),
                    ))
                }
            }
        } else if let Some((prefix, suffix)) = iri::split_prefix(term) {
            if local.contains_key(prefix) {
                self.create_term_definition(active, local, prefix, defined, scope)?;
            }
            definition.iri = match active.terms.get(prefix).and_then(|def| def.iri.as_ref()) {
                Some(prefix_iri) => Some(format!("{}{}", prefix_iri, suffix)),
                None => Some(term.to_string()),
            };
        } else if term.contains('/') {
            let expanded = self
                .expand_iri_creating(active, term, false, true, local, defined, scope)?
                .filter(|iri| iri.contains(':'))
                .ok_or_else(|| {
                    JsonLdError::new(
                        ErrorCode::InvalidIriMapping,
                        format!("relative term '{}' does not expand to an IRI", term),
                    )
                })?;
            definition.iri = Some(expanded);
        } else if term == "@type" {
            definition.iri = Some("@type".to_string());
        } else if let Some(ref vocab) = active.vocab {
            definition.iri = Some(format!("{}{}", vocab, term));
        } else {
            return Err(JsonLdError::new(
                ErrorCode::InvalidIriMapping,
                format!("term '{}' has no IRI mapping and no @vocab is set", term),
            ));
        }

        if let Some(container) = value.get("@container") {
            definition.container = self.parse_container(container, term)?;
            if definition.container.contains(Container::Type) {
                match definition.type_mapping.as_deref() {
                    None => definition.type_mapping = Some("@id".to_string()),
                    Some("@id") | Some("@vocab") => {}
                    Some(other) => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidTypeMapping,
                            format!("@type container requires @id or @vocab type, found '{}'", other),
                        ))
                    }
                }
            }
        }

        if let Some(index) = value.get("@index") {
            if json_ld_10 || !definition.container.contains(Container::Index) {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    format!("@index on term '{}' requires an @index container", term),
                ));
            }
            let valid = index.as_str().filter(|i| {
                !is_keyword(i)
                    && active
                        .expand_iri(i, false, true)
                        .is_some_and(|e| iri::is_absolute(&e))
            });
            let Some(index) = valid else {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    format!("invalid @index {} on term '{}'", index, term),
                ));
            };
            definition.index = Some(index.to_string());
        }

        if let Some(context) = value.get("@context") {
            if json_ld_10 {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    "scoped contexts are not supported in json-ld-1.0",
                ));
            }
            // Nested scoped contexts are checked when they are applied.
            if scope.validate_scoped {
                self.process_with(
                    active,
                    context,
                    scope.base_url,
                    scope.remote_contexts,
                    ContextFlags {
                        override_protected: true,
                        propagate: true,
                        validate_scoped: false,
                    },
                )
                .map_err(|e| {
                    JsonLdError::new(
                        ErrorCode::InvalidScopedContext,
                        format!("scoped context of term '{}': {}", term, e),
                    )
                })?;
            }
            definition.context = Some(context.clone());
            definition.base_url = scope.base_url.map(str::to_string);
        }

        if !value.contains_key("@type") {
            if let Some(language) = value.get("@language") {
                definition.language = Some(match language {
                    JsonValue::Null => None,
                    JsonValue::String(l) => Some(self.language_tag(l)),
                    other => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidLanguageMapping,
                            format!("@language of term '{}' must be a string or null, found {}", term, other),
                        ))
                    }
                });
            }
            if let Some(direction) = value.get("@direction") {
                definition.direction = Some(match direction {
                    JsonValue::Null => None,
                    JsonValue::String(d) => Some(Direction::parse(d).ok_or_else(|| {
                        JsonLdError::new(
                            ErrorCode::InvalidBaseDirection,
                            format!("@direction of term '{}' must be 'ltr' or 'rtl'", term),
                        )
                    })?),
                    other => {
                        return Err(JsonLdError::new(
                            ErrorCode::InvalidBaseDirection,
                            format!("@direction of term '{}' must be a string or null, found {}", term, other),
                        ))
                    }
                });
            }
        }

        if let Some(nest) = value.get("@nest") {
            if json_ld_10 {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    "@nest is not supported in json-ld-1.0",
                ));
            }
            match nest {
                JsonValue::String(n) if n == "@nest" || !is_keyword(n) => {
                    definition.nest = Some(n.clone());
                }
                other => {
                    return Err(JsonLdError::new(
                        ErrorCode::InvalidNestValue,
                        format!("invalid @nest value {} on term '{}'", other, term),
                    ))
                }
            }
        }

        if let Some(prefix) = value.get("@prefix") {
            if json_ld_10 || term.contains(':') || term.contains('/') {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    format!("@prefix is not allowed on term '{}'", term),
                ));
            }
            definition.prefix = prefix.as_bool().ok_or_else(|| {
                JsonLdError::new(
                    ErrorCode::InvalidPrefixValue,
                    format!("@prefix must be a boolean, found {}", prefix),
                )
            })?;
            if definition.prefix && definition.iri.as_deref().is_some_and(is_keyword) {
                return Err(JsonLdError::new(
                    ErrorCode::InvalidTermDefinition,
                    format!("keyword alias '{}' cannot be a prefix", term),
                ));
            }
        }

        if let Some(unknown) = value
            .keys()
            .find(|k| !TERM_DEFINITION_KEYS.contains(&k.as_str()))
        {
            return Err(JsonLdError::new(
                ErrorCode::InvalidTermDefinition,
                format!("term '{}' has unknown entry '{}'", term, unknown),
            ));
        }

        self.finish_definition(active, term, definition, previous_definition, defined, scope)
    }

    fn finish_definition(
        &self,
        active: &mut ActiveContext,
        term: &str,
        definition: TermDefinition,
        previous_definition: Option<TermDefinition>,
        defined: &mut HashMap<String, bool>,
        scope: &TermScope<'_>,
    ) -> Result<()> {
        let definition = match previous_definition {
            Some(previous) if !scope.override_protected && previous.protected => {
                if !definition.same_as(&previous) {
                    return Err(JsonLdError::new(
                        ErrorCode::ProtectedTermRedefinition,
                        format!("protected term '{}' cannot be redefined", term),
                    ));
                }
                previous
            }
            _ => definition,
        };
        active.terms.insert(term.to_string(), definition);
        defined.insert(term.to_string(), true);
        Ok(())
    }

    fn parse_container(&self, container: &JsonValue, term: &str) -> Result<ContainerSet> {
        let invalid = || {
            JsonLdError::new(
                ErrorCode::InvalidContainerMapping,
                format!("invalid @container {} on term '{}'", container, term),
            )
        };

        let values: Vec<&JsonValue> = match container {
            JsonValue::Array(items) if !self.options.is_json_ld_10() => items.iter().collect(),
            JsonValue::String(_) => vec![container],
            _ => return Err(invalid()),
        };
        let mut set = ContainerSet::new();
        for value in values {
            let parsed = value.as_str().and_then(Container::parse).ok_or_else(invalid)?;
            set.insert(parsed);
        }

        if self.options.is_json_ld_10()
            && set.iter().any(|c| matches!(c, Container::Graph | Container::Id | Container::Type))
        {
            return Err(invalid());
        }

        let valid = match set.len() {
            0 => false,
            1 => true,
            _ => {
                let others: Vec<Container> = set.iter().filter(|c| *c != Container::Set).collect();
                if set.contains(Container::List) {
                    false
                } else if set.contains(Container::Graph)
                    && (set.contains(Container::Id) || set.contains(Container::Index))
                {
                    others.len() == 2
                } else {
                    set.contains(Container::Set) && others.len() <= 1
                }
            }
        };
        if !valid {
            return Err(invalid());
        }
        Ok(set)
    }

    /// IRI expansion while a local context is being processed: terms that
    /// the value depends on are created first.
    #[allow(clippy::too_many_arguments)]
    fn expand_iri_creating(
        &self,
        active: &mut ActiveContext,
        value: &str,
        document_relative: bool,
        vocab: bool,
        local: &Map<String, JsonValue>,
        defined: &mut HashMap<String, bool>,
        scope: &TermScope<'_>,
    ) -> Result<Option<String>> {
        if is_keyword(value) {
            return Ok(Some(value.to_string()));
        }
        if looks_like_keyword(value) {
            self.diagnostics.warn(
                WarningCode::KeywordLikeValue,
                format!("'{}' has the form of a keyword and expands to null", value),
            );
            return Ok(None);
        }

        if local.contains_key(value) && defined.get(value) != Some(&true) {
            self.create_term_definition(active, local, value, defined, scope)?;
        }

        if let Some((prefix, suffix)) = iri::split_prefix(value) {
            if prefix != "_"
                && !suffix.starts_with("//")
                && local.contains_key(prefix)
                && defined.get(prefix) != Some(&true)
            {
                self.create_term_definition(active, local, prefix, defined, scope)?;
            }
        }

        Ok(active.expand_iri(value, document_relative, vocab))
    }
}
