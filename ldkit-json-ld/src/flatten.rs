//! Flattening: one flat array of node objects per document
//!
//! Every node appears exactly once at the top level, embedded nodes are
//! replaced by references, and named graphs become `@graph` entries on the
//! node that names them.

use crate::error::Result;
use crate::node_map::{generate_node_map, BlankNodeIssuer, Graph, DEFAULT_GRAPH};
use serde_json::{Map, Value as JsonValue};

fn is_subject_only(node: &Map<String, JsonValue>) -> bool {
    node.len() == 1 && node.contains_key("@id")
}

fn sorted(node: Map<String, JsonValue>, ordered: bool) -> JsonValue {
    if !ordered {
        return JsonValue::Object(node);
    }
    let mut entries: Vec<(String, JsonValue)> = node.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    JsonValue::Object(entries.into_iter().collect())
}

/// Nodes of a graph with more than an `@id`, in identifier order.
fn graph_nodes(graph: Graph, ordered: bool) -> Vec<JsonValue> {
    graph
        .into_values()
        .filter(|node| !is_subject_only(node))
        .map(|node| sorted(node, ordered))
        .collect()
}

/// Flatten an expanded document.
pub fn flatten_element(expanded: &JsonValue, ordered: bool) -> Result<JsonValue> {
    let mut issuer = BlankNodeIssuer::default();
    let mut node_map = generate_node_map(expanded, &mut issuer)?;
    let mut default_graph = node_map.remove(DEFAULT_GRAPH).unwrap_or_default();

    for (graph_name, graph) in node_map {
        let entry = default_graph
            .entry(graph_name.clone())
            .or_insert_with(|| {
                let mut node = Map::new();
                node.insert("@id".to_string(), JsonValue::String(graph_name.clone()));
                node
            });
        entry.insert(
            "@graph".to_string(),
            JsonValue::Array(graph_nodes(graph, ordered)),
        );
    }

    Ok(JsonValue::Array(graph_nodes(default_graph, ordered)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_flatten_embedded_node() {
        let expanded = json!([{
            "@id": "http://example.org/a",
            "http://example.org/knows": [{
                "@id": "http://example.org/b",
                "http://example.org/name": [{"@value": "B"}]
            }]
        }]);
        let flattened = flatten_element(&expanded, true).unwrap();
        assert_eq!(
            flattened,
            json!([
                {"@id": "http://example.org/a", "http://example.org/knows": [{"@id": "http://example.org/b"}]},
                {"@id": "http://example.org/b", "http://example.org/name": [{"@value": "B"}]}
            ])
        );
    }

    #[test]
    fn test_flatten_named_graph() {
        let expanded = json!([{
            "@id": "http://example.org/g",
            "@graph": [{"@id": "http://example.org/x", "http://example.org/p": [{"@value": 1}]}]
        }]);
        let flattened = flatten_element(&expanded, true).unwrap();
        assert_eq!(
            flattened,
            json!([{
                "@id": "http://example.org/g",
                "@graph": [{"@id": "http://example.org/x", "http://example.org/p": [{"@value": 1}]}]
            }])
        );
    }

    #[test]
    fn test_flatten_drops_bare_references() {
        let expanded = json!([{"@id": "http://example.org/a", "http://example.org/p": [{"@id": "http://example.org/b"}]}]);
        let flattened = flatten_element(&expanded, false).unwrap();
        assert_eq!(
            flattened,
            json!([{"@id": "http://example.org/a", "http://example.org/p": [{"@id": "http://example.org/b"}]}])
        );
    }
}
