//! Node/edge selection with a staged edit protocol.
//!
//! The committed selection always satisfies the availability invariant:
//! every selected edge has both endpoints among the selected nodes. Custom
//! selections are edited as a staged draft (`propose`/toggle, then `commit`
//! or `cancel`); `All` mode is applied immediately and tracks the graph.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::graph::{Edge, EdgeKey, Graph};

/// Errors raised by illegal filter operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    /// No graph to filter
    #[error("No graph has been generated yet")]
    NoGraph,

    /// A staged edit is already open
    #[error("A {0} selection edit is already in progress")]
    EditInProgress(SelectionTarget),

    /// Commit, cancel or toggle without a matching staged edit
    #[error("No selection edit is in progress")]
    NoStagedEdit,

    /// Node id not present in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Edge not available for the committed node selection
    #[error("Edge is not available for the current node selection: {0}")]
    EdgeUnavailable(String),
}

/// Selection mode for nodes or edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Derived automatically from the graph
    #[default]
    All,
    /// Explicitly chosen, frozen until reset or re-derived
    Custom,
}

/// Which selection a staged edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionTarget {
    /// The node selection
    Nodes,
    /// The edge selection
    Edges,
}

impl std::fmt::Display for SelectionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionTarget::Nodes => f.write_str("node"),
            SelectionTarget::Edges => f.write_str("edge"),
        }
    }
}

/// An uncommitted copy of a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StagedSelection {
    /// Draft node selection
    Nodes {
        /// Draft contents
        draft: Vec<String>,
        /// Mode to restore on cancel
        prior_mode: FilterMode,
    },
    /// Draft edge selection
    Edges {
        /// Draft contents
        draft: Vec<Edge>,
        /// Mode to restore on cancel
        prior_mode: FilterMode,
    },
}

impl StagedSelection {
    /// The selection this draft edits
    pub fn target(&self) -> SelectionTarget {
        match self {
            StagedSelection::Nodes { .. } => SelectionTarget::Nodes,
            StagedSelection::Edges { .. } => SelectionTarget::Edges,
        }
    }
}

/// Edges whose source and target are both in `selected_nodes`, in graph order.
pub fn available_edges(graph: &Graph, selected_nodes: &[String]) -> Vec<Edge> {
    let selected: HashSet<&str> = selected_nodes.iter().map(String::as_str).collect();
    graph
        .edges()
        .iter()
        .filter(|edge| selected.contains(edge.source.as_str()) && selected.contains(edge.target.as_str()))
        .cloned()
        .collect()
}

/// Selection identity of an edge
pub fn edge_identity(edge: &Edge) -> EdgeKey<'_> {
    edge.identity()
}

/// Toggle one occurrence of `edge` (by identity) in `edges`.
///
/// Removes the first match if there is one, otherwise appends a copy.
/// Returns `true` when the edge is present afterwards.
pub fn toggle_edge(edges: &mut Vec<Edge>, edge: &Edge) -> bool {
    let key = edge_identity(edge);
    match edges.iter().position(|e| edge_identity(e) == key) {
        Some(index) => {
            edges.remove(index);
            false
        }
        None => {
            edges.push(edge.clone());
            true
        }
    }
}

/// Committed node/edge selection plus an optional staged edit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterEngine {
    node_mode: FilterMode,
    edge_mode: FilterMode,
    selected_nodes: Vec<String>,
    selected_edges: Vec<Edge>,
    staged: Option<StagedSelection>,
}

impl FilterEngine {
    /// Both selections derived in `All` mode from `graph`
    pub fn for_graph(graph: &Graph) -> Self {
        let selected_nodes = graph.node_ids();
        let selected_edges = available_edges(graph, &selected_nodes);
        Self {
            node_mode: FilterMode::All,
            edge_mode: FilterMode::All,
            selected_nodes,
            selected_edges,
            staged: None,
        }
    }

    /// Current node selection mode
    pub fn node_mode(&self) -> FilterMode {
        self.node_mode
    }

    /// Current edge selection mode
    pub fn edge_mode(&self) -> FilterMode {
        self.edge_mode
    }

    /// Committed node ids
    pub fn selected_nodes(&self) -> &[String] {
        &self.selected_nodes
    }

    /// Committed edges
    pub fn selected_edges(&self) -> &[Edge] {
        &self.selected_edges
    }

    /// The open staged edit, if any
    pub fn staged(&self) -> Option<&StagedSelection> {
        self.staged.as_ref()
    }

    /// Whether either selection is custom
    pub fn is_filtered(&self) -> bool {
        self.node_mode == FilterMode::Custom || self.edge_mode == FilterMode::Custom
    }

    /// Edges available for the committed node selection
    pub fn available_edges(&self, graph: &Graph) -> Vec<Edge> {
        available_edges(graph, &self.selected_nodes)
    }

    /// Whether the committed selection satisfies the availability invariant
    pub fn is_consistent(&self) -> bool {
        let nodes: HashSet<&str> = self.selected_nodes.iter().map(String::as_str).collect();
        self.selected_edges
            .iter()
            .all(|edge| nodes.contains(edge.source.as_str()) && nodes.contains(edge.target.as_str()))
    }

    /// Switch the node selection mode.
    ///
    /// `All` selects every node at once. `Custom` opens a staged draft seeded
    /// with the committed selection and leaves the selection untouched.
    pub fn set_node_mode(&mut self, mode: FilterMode, graph: &Graph) -> Result<(), FilterError> {
        self.ensure_no_staged()?;
        match mode {
            FilterMode::All => {
                self.node_mode = FilterMode::All;
                self.selected_nodes = graph.node_ids();
                self.rederive_edges(graph);
            }
            FilterMode::Custom => {
                self.staged = Some(StagedSelection::Nodes {
                    draft: self.selected_nodes.clone(),
                    prior_mode: self.node_mode,
                });
                self.node_mode = FilterMode::Custom;
            }
        }
        Ok(())
    }

    /// Switch the edge selection mode.
    ///
    /// `All` selects every available edge. `Custom` opens a staged draft.
    pub fn set_edge_mode(&mut self, mode: FilterMode, graph: &Graph) -> Result<(), FilterError> {
        self.ensure_no_staged()?;
        match mode {
            FilterMode::All => {
                self.edge_mode = FilterMode::All;
                self.selected_edges = available_edges(graph, &self.selected_nodes);
            }
            FilterMode::Custom => {
                self.staged = Some(StagedSelection::Edges {
                    draft: self.selected_edges.clone(),
                    prior_mode: self.edge_mode,
                });
                self.edge_mode = FilterMode::Custom;
            }
        }
        Ok(())
    }

    /// Replace the staged node draft wholesale
    pub fn propose_nodes(&mut self, nodes: Vec<String>, graph: &Graph) -> Result<(), FilterError> {
        if let Some(unknown) = nodes.iter().find(|id| !graph.contains_node(id)) {
            return Err(FilterError::UnknownNode(unknown.clone()));
        }
        match self.staged.as_mut() {
            Some(StagedSelection::Nodes { draft, .. }) => {
                let mut seen = HashSet::new();
                *draft = nodes.into_iter().filter(|id| seen.insert(id.clone())).collect();
                Ok(())
            }
            _ => Err(FilterError::NoStagedEdit),
        }
    }

    /// Replace the staged edge draft wholesale
    pub fn propose_edges(&mut self, edges: Vec<Edge>, graph: &Graph) -> Result<(), FilterError> {
        let available = self.available_edges(graph);
        let available_keys: HashSet<EdgeKey<'_>> = available.iter().map(edge_identity).collect();
        if let Some(edge) = edges.iter().find(|e| !available_keys.contains(&edge_identity(e))) {
            return Err(FilterError::EdgeUnavailable(edge.label()));
        }
        match self.staged.as_mut() {
            Some(StagedSelection::Edges { draft, .. }) => {
                *draft = edges;
                Ok(())
            }
            _ => Err(FilterError::NoStagedEdit),
        }
    }

    /// Toggle a node in the staged draft; returns whether it is now selected
    pub fn toggle_staged_node(&mut self, id: &str, graph: &Graph) -> Result<bool, FilterError> {
        if !graph.contains_node(id) {
            return Err(FilterError::UnknownNode(id.to_string()));
        }
        match self.staged.as_mut() {
            Some(StagedSelection::Nodes { draft, .. }) => {
                match draft.iter().position(|n| n == id) {
                    Some(index) => {
                        draft.remove(index);
                        Ok(false)
                    }
                    None => {
                        draft.push(id.to_string());
                        Ok(true)
                    }
                }
            }
            _ => Err(FilterError::NoStagedEdit),
        }
    }

    /// Toggle an edge (by identity) in the staged draft; returns whether it is now selected
    pub fn toggle_staged_edge(&mut self, edge: &Edge, graph: &Graph) -> Result<bool, FilterError> {
        let key = edge_identity(edge);
        if !self.available_edges(graph).iter().any(|e| edge_identity(e) == key) {
            return Err(FilterError::EdgeUnavailable(edge.label()));
        }
        match self.staged.as_mut() {
            Some(StagedSelection::Edges { draft, .. }) => Ok(toggle_edge(draft, edge)),
            _ => Err(FilterError::NoStagedEdit),
        }
    }

    /// Commit the staged draft
    pub fn commit(&mut self, graph: &Graph) -> Result<(), FilterError> {
        match self.staged.take() {
            Some(StagedSelection::Nodes { draft, .. }) => {
                self.apply_node_selection(draft, graph);
                Ok(())
            }
            Some(StagedSelection::Edges { draft, .. }) => {
                self.apply_edge_selection(draft);
                Ok(())
            }
            None => Err(FilterError::NoStagedEdit),
        }
    }

    /// Discard the staged draft and restore the mode active before the edit
    pub fn cancel(&mut self) -> Result<(), FilterError> {
        match self.staged.take() {
            Some(StagedSelection::Nodes { prior_mode, .. }) => {
                self.node_mode = prior_mode;
                Ok(())
            }
            Some(StagedSelection::Edges { prior_mode, .. }) => {
                self.edge_mode = prior_mode;
                Ok(())
            }
            None => Err(FilterError::NoStagedEdit),
        }
    }

    /// Commit a node selection and re-filter the edge selection against it.
    ///
    /// This is the single enforcement point of the availability invariant
    /// after the node set changes.
    pub fn apply_node_selection(&mut self, staged_nodes: Vec<String>, graph: &Graph) {
        self.node_mode = FilterMode::Custom;
        self.selected_nodes = staged_nodes;
        self.rederive_edges(graph);
        debug!(
            nodes = self.selected_nodes.len(),
            edges = self.selected_edges.len(),
            "Applied node selection"
        );
    }

    /// Commit an edge selection verbatim.
    ///
    /// Staged edge sets are built from the available edges, so they satisfy
    /// the invariant by construction.
    pub fn apply_edge_selection(&mut self, staged_edges: Vec<Edge>) {
        self.edge_mode = FilterMode::Custom;
        self.selected_edges = staged_edges;
        debug_assert!(self.is_consistent());
    }

    /// Re-derive both selections to `All` and drop any staged edit
    pub fn reset(&mut self, graph: &Graph) {
        *self = Self::for_graph(graph);
    }

    fn rederive_edges(&mut self, graph: &Graph) {
        match self.edge_mode {
            FilterMode::All => {
                self.selected_edges = available_edges(graph, &self.selected_nodes);
            }
            FilterMode::Custom => {
                let nodes: HashSet<&str> = self.selected_nodes.iter().map(String::as_str).collect();
                self.selected_edges
                    .retain(|edge| nodes.contains(edge.source.as_str()) && nodes.contains(edge.target.as_str()));
            }
        }
    }

    fn ensure_no_staged(&self) -> Result<(), FilterError> {
        match &self.staged {
            Some(staged) => Err(FilterError::EditInProgress(staged.target())),
            None => Ok(()),
        }
    }
}
