//! Undirected word-neighbor graph built on petgraph.

use std::collections::BTreeMap;

use ahash::AHashMap;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::types::{GraphStats, NeighborEdge, NodeLinkEdge, NodeLinkGraph, NodeLinkNode};

/// Union of directed nearest-neighbor relations. Immutable once built.
#[derive(Debug, Clone)]
pub struct NeighborGraph {
    graph: UnGraph<String, f64>,
    node_map: AHashMap<String, NodeIndex>,
}

impl NeighborGraph {
    /// Build from a node list and directed neighbor edges. An undirected edge
    /// exists when either endpoint lists the other; reciprocal listings
    /// collapse into one edge. Nodes and edges are inserted in sorted order.
    pub fn from_edges(nodes: &[String], edges: impl IntoIterator<Item = NeighborEdge>) -> Self {
        let mut sorted_nodes: Vec<&String> = nodes.iter().collect();
        sorted_nodes.sort();
        sorted_nodes.dedup();

        let mut graph = UnGraph::with_capacity(sorted_nodes.len(), 0);
        let mut node_map = AHashMap::with_capacity(sorted_nodes.len());
        for node in sorted_nodes {
            let idx = graph.add_node(node.clone());
            node_map.insert(node.clone(), idx);
        }

        let mut undirected: BTreeMap<(String, String), f64> = BTreeMap::new();
        for edge in edges {
            if edge.source == edge.target {
                continue;
            }
            let key = if edge.source < edge.target {
                (edge.source, edge.target)
            } else {
                (edge.target, edge.source)
            };
            undirected.entry(key).or_insert(edge.weight.0);
        }

        let mut builder = Self { graph, node_map };
        for ((a, b), weight) in undirected {
            builder.add_edge(a, b, weight);
        }
        builder
    }

    fn add_edge(&mut self, source: String, target: String, weight: f64) {
        let source_idx = self.get_or_create_node(source);
        let target_idx = self.get_or_create_node(target);
        self.graph.add_edge(source_idx, target_idx, weight);
    }

    fn get_or_create_node(&mut self, id: String) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&id) {
            idx
        } else {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id, idx);
            idx
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_edge(&self, a: &str, b: &str) -> bool {
        match (self.node_map.get(a), self.node_map.get(b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    pub fn edge_weight(&self, a: &str, b: &str) -> Option<f64> {
        let ia = *self.node_map.get(a)?;
        let ib = *self.node_map.get(b)?;
        let edge = self.graph.find_edge(ia, ib)?;
        self.graph.edge_weight(edge).copied()
    }

    /// Adjacent words, sorted.
    pub fn neighbors(&self, word: &str) -> Vec<&str> {
        let Some(&idx) = self.node_map.get(word) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = self
            .graph
            .neighbors(idx)
            .map(|n| self.graph[n].as_str())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn stats(&self) -> GraphStats {
        let num_nodes = self.graph.node_count();
        let num_edges = self.graph.edge_count();
        let avg_degree = if num_nodes > 0 {
            (2 * num_edges) as f64 / num_nodes as f64
        } else {
            0.0
        };

        let density = if num_nodes > 1 {
            (2 * num_edges) as f64 / (num_nodes * (num_nodes - 1)) as f64
        } else {
            0.0
        };

        GraphStats {
            num_nodes,
            num_edges,
            avg_degree,
            density,
            num_components: connected_components(&self.graph),
        }
    }

    /// Node-link form: nodes sorted by id, links sorted by `(source, target)`
    /// with `source < target`.
    pub fn node_link(&self) -> NodeLinkGraph {
        let mut nodes: Vec<NodeLinkNode> = self
            .graph
            .node_indices()
            .map(|idx| NodeLinkNode {
                id: self.graph[idx].clone(),
            })
            .collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));

        let mut links: Vec<NodeLinkEdge> = self
            .graph
            .edge_references()
            .map(|edge| {
                let a = &self.graph[edge.source()];
                let b = &self.graph[edge.target()];
                let (source, target) = if a <= b { (a, b) } else { (b, a) };
                NodeLinkEdge {
                    source: source.clone(),
                    target: target.clone(),
                    weight: *edge.weight(),
                }
            })
            .collect();
        links.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));

        NodeLinkGraph {
            directed: false,
            multigraph: false,
            graph: serde_json::Map::new(),
            nodes,
            links,
        }
    }

    /// Export graph to JSON for visualization
    pub fn to_json(&self) -> String {
        serde_json::json!(self.node_link()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn edge(a: &str, b: &str, w: f64) -> NeighborEdge {
        NeighborEdge::new(a.to_string(), b.to_string(), w)
    }

    #[test]
    fn test_one_sided_listing_creates_edge() {
        let graph = NeighborGraph::from_edges(&names(&["a", "b", "c"]), vec![edge("a", "b", 0.9)]);
        assert!(graph.contains_edge("a", "b"));
        assert!(graph.contains_edge("b", "a"));
        assert!(!graph.contains_edge("a", "c"));
        assert_eq!(graph.neighbors("b"), vec!["a"]);
    }

    #[test]
    fn test_reciprocal_listing_collapses() {
        let graph = NeighborGraph::from_edges(
            &names(&["a", "b"]),
            vec![edge("a", "b", 0.5), edge("b", "a", 0.5)],
        );
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.edge_weight("b", "a"), Some(0.5));
    }

    #[test]
    fn test_stats() {
        let graph = NeighborGraph::from_edges(
            &names(&["a", "b", "c", "d", "e"]),
            vec![edge("a", "b", 0.9), edge("b", "c", 0.8), edge("d", "e", 0.7)],
        );
        let stats = graph.stats();
        assert_eq!(stats.num_nodes, 5);
        assert_eq!(stats.num_edges, 3);
        assert_eq!(stats.num_components, 2);
    }

    #[test]
    fn test_node_link_layout() {
        let graph = NeighborGraph::from_edges(
            &names(&["b", "a", "c"]),
            vec![edge("c", "a", 0.25), edge("b", "a", 0.5)],
        );
        let data = graph.node_link();
        let ids: Vec<_> = data.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(data.links[0].source, "a");
        assert_eq!(data.links[0].target, "b");
        assert_eq!(data.links[1].target, "c");

        let json: serde_json::Value = serde_json::from_str(&graph.to_json()).unwrap();
        assert_eq!(json["directed"], false);
        assert_eq!(json["links"][1]["weight"], 0.25);
        assert_eq!(json["nodes"].as_array().unwrap().len(), 3);
    }
}
