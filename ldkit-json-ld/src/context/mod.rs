//! Active context model
//!
//! An [`ActiveContext`] is the resolved set of term definitions and defaults
//! in force at one point of a document. Contexts are built by the
//! [`ContextProcessor`](processor::ContextProcessor) and never mutated once
//! handed out; every context change produces a new value.

pub mod inverse;
pub mod processor;

use crate::iri;
use inverse::InverseContext;
use ldkit_vocab::keyword::{is_keyword, looks_like_keyword};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Container types for JSON-LD @container values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Container {
    Graph,
    Id,
    Index,
    Language,
    List,
    Set,
    Type,
}

impl Container {
    pub fn parse(s: &str) -> Option<Container> {
        match s {
            "@graph" => Some(Container::Graph),
            "@id" => Some(Container::Id),
            "@index" => Some(Container::Index),
            "@language" => Some(Container::Language),
            "@list" => Some(Container::List),
            "@set" => Some(Container::Set),
            "@type" => Some(Container::Type),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Container::Graph => "@graph",
            Container::Id => "@id",
            Container::Index => "@index",
            Container::Language => "@language",
            Container::List => "@list",
            Container::Set => "@set",
            Container::Type => "@type",
        }
    }
}

/// A container mapping: zero or more container keywords.
///
/// Kept sorted (the enum order is the lexicographic order of the keyword
/// strings), which makes [`ContainerSet::key`] the inverse context key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ContainerSet(Vec<Container>);

impl ContainerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, container: Container) {
        if let Err(pos) = self.0.binary_search(&container) {
            self.0.insert(pos, container);
        }
    }

    pub fn contains(&self, container: Container) -> bool {
        self.0.binary_search(&container).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Container> + '_ {
        self.0.iter().copied()
    }

    /// Concatenated keyword form used by the inverse context (`@none` when empty).
    pub fn key(&self) -> String {
        if self.0.is_empty() {
            return "@none".to_string();
        }
        self.0.iter().map(|c| c.as_str()).collect()
    }

    /// JSON form for serialising a term definition.
    pub fn to_json(&self) -> JsonValue {
        match self.0.as_slice() {
            [single] => JsonValue::String(single.as_str().to_string()),
            many => JsonValue::Array(
                many.iter()
                    .map(|c| JsonValue::String(c.as_str().to_string()))
                    .collect(),
            ),
        }
    }
}

impl FromIterator<Container> for ContainerSet {
    fn from_iter<I: IntoIterator<Item = Container>>(iter: I) -> Self {
        let mut set = ContainerSet::new();
        for c in iter {
            set.insert(c);
        }
        set
    }
}

/// Base direction of a string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn parse(s: &str) -> Option<Direction> {
        match s {
            "ltr" => Some(Direction::Ltr),
            "rtl" => Some(Direction::Rtl),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single term definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermDefinition {
    /// IRI mapping; a keyword for aliases, None when the term maps to null
    pub iri: Option<String>,
    /// Whether the term may be used as a compact IRI prefix
    pub prefix: bool,
    pub protected: bool,
    /// Reverse property (@reverse)
    pub reverse: bool,
    /// Base URL for resolving the scoped context
    pub base_url: Option<String>,
    /// Property-scoped or type-scoped local context (@context)
    pub context: Option<JsonValue>,
    pub container: ContainerSet,
    /// Some(None) means explicitly cleared
    pub direction: Option<Option<Direction>>,
    /// Property used for property-valued index maps (@index)
    pub index: Option<String>,
    /// Some(None) means explicitly cleared
    pub language: Option<Option<String>>,
    pub nest: Option<String>,
    /// `@id`, `@vocab`, `@json`, `@none`, or a datatype IRI
    pub type_mapping: Option<String>,
}

impl TermDefinition {
    /// Definitions are the same apart from the protected flag.
    pub fn same_as(&self, other: &TermDefinition) -> bool {
        let mut lhs = self.clone();
        lhs.protected = other.protected;
        lhs == *other
    }

    pub fn has_container(&self, container: Container) -> bool {
        self.container.contains(container)
    }

    pub fn type_mapping_is(&self, value: &str) -> bool {
        self.type_mapping.as_deref() == Some(value)
    }
}

/// The active context
pub struct ActiveContext {
    /// Term definitions keyed by term
    pub terms: HashMap<String, TermDefinition>,
    /// Base IRI (@base), None when explicitly nulled or unknown
    pub base: Option<String>,
    /// Base IRI of the document the context was created for
    pub original_base: Option<String>,
    /// Default vocabulary (@vocab)
    pub vocab: Option<String>,
    /// Default language (@language), lower case
    pub language: Option<String>,
    /// Default base direction (@direction)
    pub direction: Option<Direction>,
    /// Context to restore when leaving a node with a non-propagated context
    pub previous: Option<Arc<ActiveContext>>,
    inverse: OnceLock<Arc<InverseContext>>,
}

impl Default for ActiveContext {
    fn default() -> Self {
        Self {
            terms: HashMap::new(),
            base: None,
            original_base: None,
            vocab: None,
            language: None,
            direction: None,
            previous: None,
            inverse: OnceLock::new(),
        }
    }
}

impl Clone for ActiveContext {
    // The inverse context cache is not carried over: a clone is about to
    // become a different context.
    fn clone(&self) -> Self {
        Self {
            terms: self.terms.clone(),
            base: self.base.clone(),
            original_base: self.original_base.clone(),
            vocab: self.vocab.clone(),
            language: self.language.clone(),
            direction: self.direction,
            previous: self.previous.clone(),
            inverse: OnceLock::new(),
        }
    }
}

impl fmt::Debug for ActiveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveContext")
            .field("terms", &self.terms)
            .field("base", &self.base)
            .field("vocab", &self.vocab)
            .field("language", &self.language)
            .field("direction", &self.direction)
            .field("previous", &self.previous.is_some())
            .finish()
    }
}

impl ActiveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh context whose base IRI is the document location.
    pub fn with_base(base: Option<String>) -> Self {
        Self {
            base: base.clone(),
            original_base: base,
            ..Default::default()
        }
    }

    /// Get a term definition by term
    pub fn get(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// Check if context contains a term
    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    /// Term definition of an (optional) active property.
    pub fn term(&self, active_property: Option<&str>) -> Option<&TermDefinition> {
        active_property.and_then(|p| self.terms.get(p))
    }

    /// Container mapping of an (optional) active property, empty if none.
    pub fn container_of(&self, active_property: Option<&str>) -> ContainerSet {
        self.term(active_property)
            .map(|def| def.container.clone())
            .unwrap_or_default()
    }

    pub fn has_protected_terms(&self) -> bool {
        self.terms.values().any(|def| def.protected)
    }

    /// Inverse context for compaction, built on first use.
    pub fn inverse(&self) -> &InverseContext {
        self.inverse
            .get_or_init(|| Arc::new(InverseContext::build(self)))
            .as_ref()
    }

    /// IRI expansion against a finished context.
    ///
    /// `vocab` expands relative to @vocab (property and type positions),
    /// `document_relative` resolves remaining relative references against the
    /// base IRI (@id positions). Returns None when the value maps to null or
    /// has the form of an unknown keyword.
    pub fn expand_iri(&self, value: &str, document_relative: bool, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if looks_like_keyword(value) {
            return None;
        }

        if let Some(def) = self.terms.get(value) {
            if let Some(ref mapped) = def.iri {
                if is_keyword(mapped) {
                    return Some(mapped.clone());
                }
            }
            if vocab {
                return def.iri.clone();
            }
        }

        if let Some((prefix, suffix)) = iri::split_prefix(value) {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(def) = self.terms.get(prefix) {
                if def.prefix {
                    if let Some(ref prefix_iri) = def.iri {
                        return Some(format!("{}{}", prefix_iri, suffix));
                    }
                }
            }
            if iri::is_absolute(value) {
                return Some(value.to_string());
            }
        }

        if vocab {
            if let Some(ref v) = self.vocab {
                return Some(format!("{}{}", v, value));
            }
        }

        if document_relative {
            return Some(iri::resolve(self.base.as_deref(), value));
        }

        Some(value.to_string())
    }

    /// Serialize the term definitions back to a JSON-LD @context value.
    ///
    /// Useful for diagnostics and for publishing the context a result was
    /// compacted with. Returns `JsonValue::Null` for empty contexts.
    pub fn to_json(&self) -> JsonValue {
        if self.terms.is_empty()
            && self.vocab.is_none()
            && self.base.is_none()
            && self.language.is_none()
            && self.direction.is_none()
        {
            return JsonValue::Null;
        }

        let mut ctx = serde_json::Map::new();
        if let Some(ref base) = self.base {
            ctx.insert("@base".to_string(), JsonValue::String(base.clone()));
        }
        if let Some(ref vocab) = self.vocab {
            ctx.insert("@vocab".to_string(), JsonValue::String(vocab.clone()));
        }
        if let Some(ref lang) = self.language {
            ctx.insert("@language".to_string(), JsonValue::String(lang.clone()));
        }
        if let Some(dir) = self.direction {
            ctx.insert("@direction".to_string(), JsonValue::String(dir.to_string()));
        }

        let mut terms: Vec<_> = self.terms.iter().collect();
        terms.sort_by(|a, b| a.0.cmp(b.0));
        for (term, def) in terms {
            ctx.insert(term.clone(), term_to_json(def));
        }

        JsonValue::Object(ctx)
    }
}

/// Expanded term definition form of a definition
fn term_to_json(def: &TermDefinition) -> JsonValue {
    let mut obj = serde_json::Map::new();
    let key = if def.reverse { "@reverse" } else { "@id" };
    obj.insert(
        key.to_string(),
        def.iri.clone().map(JsonValue::String).unwrap_or(JsonValue::Null),
    );
    if let Some(ref t) = def.type_mapping {
        obj.insert("@type".to_string(), JsonValue::String(t.clone()));
    }
    if !def.container.is_empty() {
        obj.insert("@container".to_string(), def.container.to_json());
    }
    if let Some(ref lang) = def.language {
        obj.insert(
            "@language".to_string(),
            lang.clone().map(JsonValue::String).unwrap_or(JsonValue::Null),
        );
    }
    if let Some(ref dir) = def.direction {
        obj.insert(
            "@direction".to_string(),
            dir.map(|d| JsonValue::String(d.to_string()))
                .unwrap_or(JsonValue::Null),
        );
    }
    if let Some(ref index) = def.index {
        obj.insert("@index".to_string(), JsonValue::String(index.clone()));
    }
    if let Some(ref nest) = def.nest {
        obj.insert("@nest".to_string(), JsonValue::String(nest.clone()));
    }
    if let Some(ref ctx) = def.context {
        obj.insert("@context".to_string(), ctx.clone());
    }
    if def.protected {
        obj.insert("@protected".to_string(), JsonValue::Bool(true));
    }
    JsonValue::Object(obj)
}

/// Loose BCP47 well-formedness check: alphanumeric subtags of 1-8
/// characters separated by hyphens, the first purely alphabetic.
pub fn is_well_formed_language_tag(tag: &str) -> bool {
    let mut subtags = tag.split('-');
    let Some(first) = subtags.next() else {
        return false;
    };
    if first.is_empty() || first.len() > 8 || !first.bytes().all(|b| b.is_ascii_alphabetic()) {
        return false;
    }
    subtags.all(|s| !s.is_empty() && s.len() <= 8 && s.bytes().all(|b| b.is_ascii_alphanumeric()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(iri: &str) -> TermDefinition {
        TermDefinition {
            iri: Some(iri.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_container_set_key() {
        let set: ContainerSet = [Container::Set, Container::Graph, Container::Id]
            .into_iter()
            .collect();
        assert_eq!(set.key(), "@graph@id@set");
        assert_eq!(ContainerSet::new().key(), "@none");
        assert!(set.contains(Container::Id));
        assert!(!set.contains(Container::List));
    }

    #[test]
    fn test_expand_iri_terms_and_prefixes() {
        let mut ctx = ActiveContext::with_base(Some("http://example.org/base/".to_string()));
        let mut ex = term("http://example.org/ns#");
        ex.prefix = true;
        ctx.terms.insert("ex".to_string(), ex);
        ctx.terms.insert("name".to_string(), term("http://schema.org/name"));
        ctx.terms.insert("id".to_string(), term("@id"));
        ctx.vocab = Some("http://vocab.org/".to_string());

        assert_eq!(ctx.expand_iri("name", false, true).as_deref(), Some("http://schema.org/name"));
        assert_eq!(ctx.expand_iri("id", false, false).as_deref(), Some("@id"));
        assert_eq!(ctx.expand_iri("ex:foo", false, true).as_deref(), Some("http://example.org/ns#foo"));
        assert_eq!(ctx.expand_iri("other", false, true).as_deref(), Some("http://vocab.org/other"));
        assert_eq!(ctx.expand_iri("doc", true, false).as_deref(), Some("http://example.org/base/doc"));
        assert_eq!(ctx.expand_iri("_:b0", true, false).as_deref(), Some("_:b0"));
        assert_eq!(ctx.expand_iri("@ignoreMe", false, true), None);
    }

    #[test]
    fn test_null_mapped_term() {
        let mut ctx = ActiveContext::new();
        ctx.vocab = Some("http://vocab.org/".to_string());
        ctx.terms.insert("hidden".to_string(), TermDefinition::default());
        assert_eq!(ctx.expand_iri("hidden", false, true), None);
    }

    #[test]
    fn test_clone_drops_inverse_cache() {
        let mut ctx = ActiveContext::new();
        ctx.terms.insert("a".to_string(), term("http://example.org/a"));
        assert!(ctx.inverse().contains("http://example.org/a"));

        let mut other = ctx.clone();
        other.terms.insert("b".to_string(), term("http://example.org/b"));
        assert!(other.inverse().contains("http://example.org/b"));
        assert!(!ctx.inverse().contains("http://example.org/b"));
    }

    #[test]
    fn test_same_as_ignores_protected() {
        let a = term("http://example.org/a");
        let mut b = a.clone();
        b.protected = true;
        assert!(a.same_as(&b));
        b.type_mapping = Some("@id".to_string());
        assert!(!a.same_as(&b));
    }

    #[test]
    fn test_language_tags() {
        assert!(is_well_formed_language_tag("en"));
        assert!(is_well_formed_language_tag("en-US"));
        assert!(is_well_formed_language_tag("zh-Hant-TW"));
        assert!(!is_well_formed_language_tag("en_US"));
        assert!(!is_well_formed_language_tag(""));
    }

    #[test]
    fn test_to_json_empty_context() {
        assert_eq!(ActiveContext::new().to_json(), JsonValue::Null);
    }
}
