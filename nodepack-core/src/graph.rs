//! Host-side inputs: the serialized graph and the registry of known node types
//!
//! Both are read-only snapshots handed to the resolver per call.

use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};

use crate::error::{ManagerError, Result};

/// A serialized graph, reduced to what resolution needs
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GraphNode {
    #[serde(rename = "type", default)]
    pub node_type: Option<String>,
}

impl GraphSnapshot {
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| ManagerError::Parse {
            what: "graph",
            source,
        })
    }

    /// Build a graph holding one node per type
    pub fn from_node_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: types
                .into_iter()
                .map(|t| GraphNode {
                    node_type: Some(t.into()),
                })
                .collect(),
        }
    }

    /// Distinct node types referenced by the graph
    ///
    /// Nodes without a type (or with an empty one) are ignored.
    pub fn node_types(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .filter_map(|n| n.node_type.as_deref())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Node types the host can currently instantiate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedNodeRegistry {
    types: HashSet<String>,
}

impl ResolvedNodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the host's `object_info` response, whose keys are node types
    pub fn from_object_info(content: &str) -> Result<Self> {
        let info: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)
            .map_err(|source| ManagerError::Parse {
                what: "object info",
                source,
            })?;
        Ok(info.into_iter().map(|(k, _)| k).collect())
    }

    /// Build from a JSON array of node type names
    pub fn from_json_list(content: &str) -> Result<Self> {
        let types: Vec<String> =
            serde_json::from_str(content).map_err(|source| ManagerError::Parse {
                what: "node type list",
                source,
            })?;
        Ok(types.into_iter().collect())
    }

    pub fn contains(&self, node_type: &str) -> bool {
        self.types.contains(node_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ResolvedNodeRegistry {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_node_types() {
        let json = r#"{
            "last_node_id": 3,
            "nodes": [
                {"id": 1, "type": "KSampler", "pos": [0, 0]},
                {"id": 2, "type": "DetailerForEach"},
                {"id": 3, "type": "KSampler"},
                {"id": 4},
                {"id": 5, "type": ""}
            ],
            "links": []
        }"#;

        let graph = GraphSnapshot::from_json(json).unwrap();
        let types: Vec<_> = graph.node_types().into_iter().collect();
        assert_eq!(types, vec!["DetailerForEach", "KSampler"]);
    }

    #[test]
    fn test_empty_graph() {
        let graph = GraphSnapshot::from_json("{}").unwrap();
        assert!(graph.node_types().is_empty());
    }

    #[test]
    fn test_registry_from_object_info() {
        let json = r#"{
            "KSampler": {"input": {}, "output": ["LATENT"]},
            "CheckpointLoaderSimple": {"input": {}}
        }"#;
        let registry = ResolvedNodeRegistry::from_object_info(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("KSampler"));
        assert!(!registry.contains("DetailerForEach"));
    }

    #[test]
    fn test_registry_from_list() {
        let registry = ResolvedNodeRegistry::from_json_list(r#"["A", "B"]"#).unwrap();
        assert!(registry.contains("A"));
        assert!(ResolvedNodeRegistry::from_json_list("{}").is_err());
    }
}
