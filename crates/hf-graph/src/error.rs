//! Graph-specific error types.

use hf_core::{EdgeId, SiteId};
use thiserror::Error;

/// Graph construction and validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    /// An edge or lookup refers to a site that doesn't exist.
    #[error("Site {site} does not exist (graph has {len} sites)")]
    UnknownSite { site: SiteId, len: usize },

    /// An edge would connect a site to itself.
    #[error("Site {site} cannot be its own neighbour")]
    SelfLoop { site: SiteId },

    /// Two edges join the same pair of sites.
    #[error("Sites {a} and {b} are joined by more than one edge")]
    DuplicateEdge { a: SiteId, b: SiteId },

    /// A coordinate, energy or coupling is NaN or infinite.
    #[error("Non-finite {what} on {owner}: {value}")]
    NonFinite {
        what: &'static str,
        owner: String,
        value: f64,
    },

    /// A site's adjacency list disagrees with the edge table.
    #[error("Edge {edge} in site {site}'s adjacency list doesn't touch that site")]
    InconsistentAdjacency { site: SiteId, edge: EdgeId },

    /// Per-site data has the wrong length.
    #[error("Expected {expected} per-site values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// Lattice with a zero count or a non-positive spacing along some axis.
    #[error("Invalid lattice: {what}")]
    InvalidLattice { what: String },
}
