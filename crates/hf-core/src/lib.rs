//! hf-core: stable foundation for hopflow.
//!
//! Contains:
//! - units (uom SI types, constructors, physical constants in eV-based units)
//! - numeric (Real + float helpers)
//! - ids (stable compact IDs for sites and edges)

pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use ids::*;
pub use numeric::*;
pub use units::*;
