//! Incremental graph builder.

use hf_core::{EdgeId, Real, SiteId};

use crate::error::GraphError;
use crate::graph::{Edge, Neighbour, Position, Site, SiteGraph};
use crate::validate;

/// Builder for constructing a site graph incrementally.
///
/// Use `add_site` and `add_neighbour` to build up the graph,
/// then call `build()` to validate and freeze it into a `SiteGraph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    sites: Vec<Site>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<Neighbour>>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder with room for `sites` sites.
    pub fn with_capacity(sites: usize) -> Self {
        Self {
            sites: Vec::with_capacity(sites),
            edges: Vec::new(),
            adjacency: Vec::with_capacity(sites),
        }
    }

    /// Number of sites added so far.
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Number of undirected edges added so far.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Add a site and return its ID.
    pub fn add_site(&mut self, position: Position, energy: Real) -> SiteId {
        let id = SiteId::from_index(self.sites.len() as u32);
        self.sites.push(Site {
            id,
            position,
            energy,
            occupation: None,
        });
        self.adjacency.push(Vec::new());
        id
    }

    /// Declare `a` and `b` as interacting neighbours with coupling `j`.
    ///
    /// Symmetric: both adjacency lists gain an entry referencing the same edge.
    /// Idempotent: if the pair is already joined (in either order) the existing
    /// edge is returned unchanged and `j` is ignored.
    pub fn add_neighbour(&mut self, a: SiteId, b: SiteId, j: Real) -> Result<EdgeId, GraphError> {
        self.check_site(a)?;
        self.check_site(b)?;
        if a == b {
            return Err(GraphError::SelfLoop { site: a });
        }

        if let Some(existing) = self.has_neighbour(a, b) {
            return Ok(existing.id);
        }

        let id = EdgeId::from_index(self.edges.len() as u32);
        self.edges.push(Edge {
            id,
            sites: [a, b],
            coupling: j,
        });

        // Each side only gains the entry it is missing.
        if !self.adjacency[a.idx()].iter().any(|n| n.site == b) {
            self.adjacency[a.idx()].push(Neighbour { site: b, edge: id });
        }
        if !self.adjacency[b.idx()].iter().any(|n| n.site == a) {
            self.adjacency[b.idx()].push(Neighbour { site: a, edge: id });
        }

        Ok(id)
    }

    /// The edge joining `a` and `b`, if declared (looked up from either side).
    pub fn has_neighbour(&self, a: SiteId, b: SiteId) -> Option<&Edge> {
        let from = |s: SiteId, t: SiteId| {
            self.adjacency
                .get(s.idx())?
                .iter()
                .find(|n| n.site == t)
                .and_then(|n| self.edges.get(n.edge.idx()))
        };
        from(a, b).or_else(|| from(b, a))
    }

    /// Build and validate the graph, returning an immutable-topology `SiteGraph`.
    pub fn build(self) -> Result<SiteGraph, GraphError> {
        validate::validate_structure(&self.sites, &self.edges)?;

        let mut offsets = Vec::with_capacity(self.sites.len() + 1);
        let mut neighbours = Vec::with_capacity(2 * self.edges.len());
        offsets.push(0);
        for list in &self.adjacency {
            neighbours.extend_from_slice(list);
            offsets.push(neighbours.len());
        }

        validate::validate_adjacency(&self.sites, &self.edges, &offsets, &neighbours)?;

        Ok(SiteGraph {
            sites: self.sites,
            edges: self.edges,
            offsets,
            neighbours,
        })
    }

    fn check_site(&self, id: SiteId) -> Result<(), GraphError> {
        if id.idx() < self.sites.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownSite {
                site: id,
                len: self.sites.len(),
            })
        }
    }
}
