//! Core graph data structures.

use hf_core::{EdgeId, Real, SiteId};

use crate::error::GraphError;

/// Cartesian position of a site (Angstrom).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: Real,
    pub y: Real,
    pub z: Real,
}

impl Position {
    pub fn new(x: Real, y: Real, z: Real) -> Self {
        Self { x, y, z }
    }
}

/// A hopping site: position, energy level and (after solving) occupation probability.
#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub id: SiteId,
    pub position: Position,
    /// Site energy (eV).
    pub energy: Real,
    /// Occupation probability, `None` until a solution has been assigned.
    pub occupation: Option<Real>,
}

/// An undirected interaction between two sites.
///
/// The coupling `J` is shared by both directions. Transfer rates are not:
/// they depend on the direction of the energetic driving force, so callers
/// that memoize rates key them by (edge, direction) using [`Edge::slot`].
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    /// Endpoints in declaration order.
    pub sites: [SiteId; 2],
    /// Transfer integral magnitude (eV).
    pub coupling: Real,
}

impl Edge {
    /// The endpoint opposite `site`, if `site` is an endpoint.
    pub fn other(&self, site: SiteId) -> Option<SiteId> {
        if self.sites[0] == site {
            Some(self.sites[1])
        } else if self.sites[1] == site {
            Some(self.sites[0])
        } else {
            None
        }
    }

    /// Direction slot for a hop starting at `origin`: 0 along declaration order, 1 against it.
    pub fn slot(&self, origin: SiteId) -> Option<usize> {
        self.sites.iter().position(|&s| s == origin)
    }
}

/// One entry of a site's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbour {
    pub site: SiteId,
    pub edge: EdgeId,
}

/// A validated collection of sites and edges with compact adjacency.
///
/// Topology is frozen; only occupation probabilities can change after build.
#[derive(Debug, Clone)]
pub struct SiteGraph {
    pub(crate) sites: Vec<Site>,
    pub(crate) edges: Vec<Edge>,

    /// Site i's neighbours are in neighbours[offsets[i]..offsets[i+1]].
    pub(crate) offsets: Vec<usize>,

    /// Flat neighbour list, in insertion order per site.
    pub(crate) neighbours: Vec<Neighbour>,
}

impl SiteGraph {
    /// Return all sites.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// Return all edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    /// Get a site by ID (returns None if ID out of bounds).
    pub fn site(&self, id: SiteId) -> Option<&Site> {
        self.sites.get(id.idx())
    }

    /// Get an edge by ID (returns None if ID out of bounds).
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.idx())
    }

    /// Adjacency list of a site (empty for unknown IDs).
    pub fn neighbours(&self, id: SiteId) -> &[Neighbour] {
        let idx = id.idx();
        if idx >= self.sites.len() {
            return &[];
        }
        &self.neighbours[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// The edge joining `a` and `b`, if any. O(degree of `a`).
    pub fn has_neighbour(&self, a: SiteId, b: SiteId) -> Option<&Edge> {
        self.neighbours(a)
            .iter()
            .find(|n| n.site == b)
            .and_then(|n| self.edge(n.edge))
    }

    /// Set every site's occupation probability from a per-site vector.
    pub fn assign_occupations(&mut self, values: &[Real]) -> Result<(), GraphError> {
        if values.len() != self.sites.len() {
            return Err(GraphError::LengthMismatch {
                expected: self.sites.len(),
                actual: values.len(),
            });
        }
        for (site, &p) in self.sites.iter_mut().zip(values) {
            site.occupation = Some(p);
        }
        Ok(())
    }

    /// Reset every occupation probability to unset.
    pub fn clear_occupations(&mut self) {
        for site in &mut self.sites {
            site.occupation = None;
        }
    }
}
