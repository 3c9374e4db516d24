//! Graph validation logic.

use std::collections::HashSet;

use crate::error::GraphError;
use crate::graph::{Edge, Neighbour, Site};

/// Validate sites and edges: finite values, valid references, no duplicates.
pub(crate) fn validate_structure(sites: &[Site], edges: &[Edge]) -> Result<(), GraphError> {
    for site in sites {
        let p = site.position;
        for (what, value) in [("x", p.x), ("y", p.y), ("z", p.z), ("energy", site.energy)] {
            if !value.is_finite() {
                return Err(GraphError::NonFinite {
                    what,
                    owner: format!("site {}", site.id),
                    value,
                });
            }
        }
    }

    let mut seen = HashSet::with_capacity(edges.len());
    for edge in edges {
        let [a, b] = edge.sites;
        for s in [a, b] {
            if s.idx() >= sites.len() {
                return Err(GraphError::UnknownSite {
                    site: s,
                    len: sites.len(),
                });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop { site: a });
        }
        if !edge.coupling.is_finite() {
            return Err(GraphError::NonFinite {
                what: "coupling",
                owner: format!("edge {}", edge.id),
                value: edge.coupling,
            });
        }
        let key = if a < b { (a, b) } else { (b, a) };
        if !seen.insert(key) {
            return Err(GraphError::DuplicateEdge { a, b });
        }
    }

    Ok(())
}

/// Validate the compacted adjacency against the edge table.
///
/// Every edge must appear exactly once in each endpoint's list, and every list
/// entry must point at an edge touching that site.
pub(crate) fn validate_adjacency(
    sites: &[Site],
    edges: &[Edge],
    offsets: &[usize],
    neighbours: &[Neighbour],
) -> Result<(), GraphError> {
    if offsets.len() != sites.len() + 1 || neighbours.len() != 2 * edges.len() {
        return Err(GraphError::LengthMismatch {
            expected: 2 * edges.len(),
            actual: neighbours.len(),
        });
    }

    for site in sites {
        let idx = site.id.idx();
        for n in &neighbours[offsets[idx]..offsets[idx + 1]] {
            let edge = edges
                .get(n.edge.idx())
                .ok_or(GraphError::InconsistentAdjacency {
                    site: site.id,
                    edge: n.edge,
                })?;
            if edge.other(site.id) != Some(n.site) {
                return Err(GraphError::InconsistentAdjacency {
                    site: site.id,
                    edge: n.edge,
                });
            }
        }
    }

    Ok(())
}
