use std::collections::HashSet;
use std::sync::Arc;

use super::filter::{FilterEngine, FilterError, FilterMode};
use super::graph::{Edge, Graph, GraphData};

/// A graph together with its selection state.
///
/// The two are only ever replaced together, so a reader never sees a graph
/// paired with a stale selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphView {
    graph: Arc<Graph>,
    filters: FilterEngine,
}

impl GraphView {
    /// Wrap a freshly completed graph with both selections in `All` mode
    pub fn new(graph: Graph) -> Self {
        let filters = FilterEngine::for_graph(&graph);
        Self {
            graph: Arc::new(graph),
            filters,
        }
    }

    /// The sanitized graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Selection state over the graph
    pub fn filters(&self) -> &FilterEngine {
        &self.filters
    }

    /// Edges available for the committed node selection
    pub fn available_edges(&self) -> Vec<Edge> {
        self.filters.available_edges(&self.graph)
    }

    /// See [`FilterEngine::set_node_mode`]
    pub fn set_node_mode(&mut self, mode: FilterMode) -> Result<(), FilterError> {
        self.filters.set_node_mode(mode, &self.graph)
    }

    /// See [`FilterEngine::set_edge_mode`]
    pub fn set_edge_mode(&mut self, mode: FilterMode) -> Result<(), FilterError> {
        self.filters.set_edge_mode(mode, &self.graph)
    }

    /// See [`FilterEngine::propose_nodes`]
    pub fn propose_nodes(&mut self, nodes: Vec<String>) -> Result<(), FilterError> {
        self.filters.propose_nodes(nodes, &self.graph)
    }

    /// See [`FilterEngine::propose_edges`]
    pub fn propose_edges(&mut self, edges: Vec<Edge>) -> Result<(), FilterError> {
        self.filters.propose_edges(edges, &self.graph)
    }

    /// See [`FilterEngine::toggle_staged_node`]
    pub fn toggle_staged_node(&mut self, id: &str) -> Result<bool, FilterError> {
        self.filters.toggle_staged_node(id, &self.graph)
    }

    /// See [`FilterEngine::toggle_staged_edge`]
    pub fn toggle_staged_edge(&mut self, edge: &Edge) -> Result<bool, FilterError> {
        self.filters.toggle_staged_edge(edge, &self.graph)
    }

    /// Commit the staged edit
    pub fn commit(&mut self) -> Result<(), FilterError> {
        self.filters.commit(&self.graph)
    }

    /// Discard the staged edit
    pub fn cancel(&mut self) -> Result<(), FilterError> {
        self.filters.cancel()
    }

    /// Back to `All` for nodes and edges
    pub fn reset_filters(&mut self) {
        self.filters.reset(&self.graph);
    }

    /// The subgraph handed to renderers: selected nodes in graph order plus
    /// the committed edge selection.
    pub fn visible_graph(&self) -> GraphData {
        let selected: HashSet<&str> = self
            .filters
            .selected_nodes()
            .iter()
            .map(String::as_str)
            .collect();
        let nodes = self
            .graph
            .nodes()
            .iter()
            .filter(|node| selected.contains(node.id.as_str()))
            .cloned()
            .collect();
        GraphData::new(nodes, self.filters.selected_edges().to_vec())
    }
}
