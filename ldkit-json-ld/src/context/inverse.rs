//! Inverse context and term selection
//!
//! The inverse context answers "which term should be used to compact this
//! IRI, given the container, type and language of the value?". It is derived
//! from an [`ActiveContext`] once and cached on it.

use super::ActiveContext;
use std::collections::HashMap;

/// Which of the three value maps of a container entry to consult.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOrLanguage {
    Language,
    Type,
    Any,
}

#[derive(Debug, Clone, Default)]
struct ValueMaps {
    language: HashMap<String, String>,
    type_: HashMap<String, String>,
    any: HashMap<String, String>,
}

impl ValueMaps {
    fn get(&self, which: TypeOrLanguage) -> &HashMap<String, String> {
        match which {
            TypeOrLanguage::Language => &self.language,
            TypeOrLanguage::Type => &self.type_,
            TypeOrLanguage::Any => &self.any,
        }
    }
}

/// IRI -> container key -> value maps
#[derive(Debug, Clone, Default)]
pub struct InverseContext {
    entries: HashMap<String, HashMap<String, ValueMaps>>,
}

fn claim(map: &mut HashMap<String, String>, key: impl Into<String>, term: &str) {
    map.entry(key.into()).or_insert_with(|| term.to_string());
}

impl InverseContext {
    pub fn build(active: &ActiveContext) -> Self {
        let default_language = active
            .language
            .as_ref()
            .map(|l| l.to_lowercase())
            .unwrap_or_else(|| "@none".to_string());

        // Shortest term first, ties broken lexicographically; the first
        // term to claim a slot keeps it.
        let mut terms: Vec<&String> = active.terms.keys().collect();
        terms.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut entries: HashMap<String, HashMap<String, ValueMaps>> = HashMap::new();
        for term in terms {
            let def = &active.terms[term];
            let Some(ref iri) = def.iri else {
                continue;
            };

            let maps = entries
                .entry(iri.clone())
                .or_default()
                .entry(def.container.key())
                .or_insert_with(|| {
                    let mut maps = ValueMaps::default();
                    maps.any.insert("@none".to_string(), term.clone());
                    maps
                });

            if def.reverse {
                claim(&mut maps.type_, "@reverse", term);
            } else if def.type_mapping_is("@none") {
                claim(&mut maps.language, "@any", term);
                claim(&mut maps.type_, "@any", term);
            } else if let Some(ref type_mapping) = def.type_mapping {
                claim(&mut maps.type_, type_mapping.clone(), term);
            } else if let (Some(language), Some(direction)) = (&def.language, &def.direction) {
                let key = match (language, direction) {
                    (Some(l), Some(d)) => format!("{}_{}", l.to_lowercase(), d),
                    (Some(l), None) => l.to_lowercase(),
                    (None, Some(d)) => format!("_{}", d),
                    (None, None) => "@null".to_string(),
                };
                claim(&mut maps.language, key, term);
            } else if let Some(ref language) = def.language {
                let key = language
                    .as_ref()
                    .map(|l| l.to_lowercase())
                    .unwrap_or_else(|| "@null".to_string());
                claim(&mut maps.language, key, term);
            } else if let Some(ref direction) = def.direction {
                let key = direction
                    .map(|d| format!("_{}", d))
                    .unwrap_or_else(|| "@none".to_string());
                claim(&mut maps.language, key, term);
            } else if let Some(direction) = active.direction {
                let lang = active
                    .language
                    .as_ref()
                    .map(|l| l.to_lowercase())
                    .unwrap_or_default();
                claim(&mut maps.language, format!("{}_{}", lang, direction), term);
                claim(&mut maps.language, "@none", term);
                claim(&mut maps.type_, "@none", term);
            } else {
                claim(&mut maps.language, default_language.clone(), term);
                claim(&mut maps.language, "@none", term);
                claim(&mut maps.type_, "@none", term);
            }
        }

        InverseContext { entries }
    }

    /// True if some term maps to `iri`.
    pub fn contains(&self, iri: &str) -> bool {
        self.entries.contains_key(iri)
    }

    /// Term selection: the first term found for the containers (in order)
    /// and preferred values (in order).
    pub fn select_term(
        &self,
        iri: &str,
        containers: &[String],
        which: TypeOrLanguage,
        preferred: &[String],
    ) -> Option<&str> {
        let container_map = self.entries.get(iri)?;
        for container in containers {
            let Some(maps) = container_map.get(container) else {
                continue;
            };
            let value_map = maps.get(which);
            for item in preferred {
                if let Some(term) = value_map.get(item) {
                    return Some(term.as_str());
                }
            }
        }
        None
    }
}
