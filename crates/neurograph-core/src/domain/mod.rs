/// Graph model: nodes, edges and the sanitized graph aggregate
pub mod graph;

/// Node/edge selection and the availability invariant
pub mod filter;

/// Graph plus selection, updated as one unit
pub mod view;

/// Generation progress reported by the service
pub mod progress;
