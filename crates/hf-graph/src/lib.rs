//! hf-graph: site/neighbour model for hopflow.
//!
//! Provides:
//! - Core data structures (Site, Edge, Neighbour, SiteGraph)
//! - Incremental builder with symmetric, idempotent edge insertion
//! - Regular lattice generator
//!
//! Sites live in one arena and edges refer to them by index, so the
//! neighbour graph can be cyclic without any shared ownership.
//!
//! # Example
//!
//! ```
//! use hf_graph::{GraphBuilder, Position};
//!
//! let mut builder = GraphBuilder::new();
//! let a = builder.add_site(Position::new(0.0, 0.0, 0.0), 0.0);
//! let b = builder.add_site(Position::new(0.0, 0.0, 1.0), 0.05);
//! builder.add_neighbour(a, b, 0.01).unwrap();
//! builder.add_neighbour(b, a, 0.01).unwrap(); // no-op
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.len(), 2);
//! assert_eq!(graph.edges().len(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub mod lattice;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use error::GraphError;
pub use graph::{Edge, Neighbour, Position, Site, SiteGraph};
pub use lattice::{LatticeSpec, build_lattice, build_lattice_with};
