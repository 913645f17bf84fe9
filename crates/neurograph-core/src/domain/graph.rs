use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Value object: a node produced by the generation service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Primary key within a graph
    pub id: String,

    /// Free-form category label
    #[serde(rename = "type", default)]
    pub node_type: String,
}

impl Node {
    /// Create a new node
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
        }
    }
}

/// Value object: a directed, typed relation between two node ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id
    pub source: String,

    /// Target node id
    pub target: String,

    /// Relation label
    #[serde(rename = "type", default)]
    pub edge_type: String,
}

impl Edge {
    /// Create a new edge
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        edge_type: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type: edge_type.into(),
        }
    }

    /// Selection identity of this edge, see [`EdgeKey`]
    pub fn identity(&self) -> EdgeKey<'_> {
        EdgeKey {
            source: &self.source,
            target: &self.target,
            edge_type: &self.edge_type,
        }
    }

    /// Human readable label, e.g. `A → B (WORKS_AT)`
    pub fn label(&self) -> String {
        format!("{} → {} ({})", self.source, self.target, self.edge_type)
    }
}

/// The (source, target, type) triple edges are matched by when selecting.
///
/// Storage is not de-duplicated, so two stored edges may share a key; for
/// selection purposes they are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey<'a> {
    /// Source node id
    pub source: &'a str,
    /// Target node id
    pub target: &'a str,
    /// Relation label
    pub edge_type: &'a str,
}

/// Wire shape of a graph: `{ "nodes": [...], "edges": [...] }`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    /// Nodes in arrival order
    #[serde(default)]
    pub nodes: Vec<Node>,

    /// Edges in arrival order
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphData {
    /// Create graph data from parts
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }
}

/// Aggregate: a complete graph.
///
/// Node ids are unique (first seen wins) and every edge's endpoints exist
/// among the nodes. Both sequences keep arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GraphData", into = "GraphData")]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    duplicate_nodes_dropped: usize,
    dangling_edges_dropped: usize,
}

impl Graph {
    /// Build a graph, dropping duplicate node ids and dangling edges
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(nodes.len());
        let mut kept_nodes = Vec::with_capacity(nodes.len());
        let mut duplicate_nodes_dropped = 0;

        for node in nodes {
            if seen.insert(node.id.clone()) {
                kept_nodes.push(node);
            } else {
                duplicate_nodes_dropped += 1;
            }
        }

        let total_edges = edges.len();
        let kept_edges: Vec<Edge> = edges
            .into_iter()
            .filter(|edge| seen.contains(&edge.source) && seen.contains(&edge.target))
            .collect();
        let dangling_edges_dropped = total_edges - kept_edges.len();

        if duplicate_nodes_dropped > 0 || dangling_edges_dropped > 0 {
            debug!(
                duplicate_nodes_dropped,
                dangling_edges_dropped, "Sanitized incoming graph"
            );
        }

        Self {
            nodes: kept_nodes,
            edges: kept_edges,
            duplicate_nodes_dropped,
            dangling_edges_dropped,
        }
    }

    /// Nodes in arrival order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Edges in arrival order
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All node ids in graph order
    pub fn node_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.id.clone()).collect()
    }

    /// Whether a node with this id exists
    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|node| node.id == id)
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes dropped because their id was already taken
    pub fn duplicate_nodes_dropped(&self) -> usize {
        self.duplicate_nodes_dropped
    }

    /// Number of edges dropped because an endpoint was missing
    pub fn dangling_edges_dropped(&self) -> usize {
        self.dangling_edges_dropped
    }

    /// Wire representation
    pub fn to_data(&self) -> GraphData {
        GraphData::new(self.nodes.clone(), self.edges.clone())
    }
}

impl From<GraphData> for Graph {
    fn from(data: GraphData) -> Self {
        Graph::new(data.nodes, data.edges)
    }
}

impl From<Graph> for GraphData {
    fn from(graph: Graph) -> Self {
        GraphData::new(graph.nodes, graph.edges)
    }
}
