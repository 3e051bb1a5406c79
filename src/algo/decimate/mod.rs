//! Mesh decimation by greedy edge contraction.
//!
//! Edges are contracted cheapest first, where the cost of an edge is
//! measured by the error quadrics of its endpoints. Contractions that
//! would pinch the surface, flip triangles or cross a non-manifold region
//! are skipped. The process stops when the cheapest remaining legal edge
//! exceeds the tolerance, or when the mesh reaches a target triangle
//! count.
//!
//! # Example
//!
//! ```
//! use whittle::algo::decimate::{qem_decimate, DecimateOptions};
//! use whittle::mesh::build_from_triangles;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]];
//! let mut mesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! let options = DecimateOptions::new().with_max_triangles(2);
//! let stats = qem_decimate(&mut mesh, options).unwrap();
//! assert_eq!(mesh.active_triangles(), 2);
//! assert_eq!(stats.contracted, 2);
//! ```

mod engine;
mod quadric;

use std::collections::HashMap;

use crate::error::{Error, Result};

pub use engine::{qem_decimate, Decimater, QuadricSnapshot};
pub use quadric::{optimal_placement, Keep, Placement, Quadric};

/// Options controlling decimation.
///
/// At least one stopping rule must be set: a `size` tolerance, a
/// `max_triangles` target, or both.
#[derive(Debug, Clone)]
pub struct DecimateOptions {
    /// Error tolerance: contraction stops once the cheapest legal edge
    /// would deviate by more than this length.
    pub size: Option<f64>,
    /// Placement of the merged vertex.
    pub placement: Placement,
    /// Stop when the mesh has at most this many triangles; `0` disables
    /// the target and leaves the tolerance as the only stopping rule.
    pub max_triangles: usize,
    /// Weight of the virtual planes reinforcing boundary and non-manifold
    /// edges.
    pub boundary_weight: f64,
    /// Run a quality swap pass around each contracted vertex.
    pub swap: bool,
    /// Minimal dihedral cosine between two triangles for their common
    /// edge to be swappable.
    pub swap_min_cos: f64,
}

impl Default for DecimateOptions {
    fn default() -> Self {
        Self {
            size: None,
            placement: Placement::Edge,
            max_triangles: 0,
            boundary_weight: 100.0,
            swap: false,
            swap_min_cos: 0.95,
        }
    }
}

impl DecimateOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the error tolerance.
    pub fn with_size(mut self, size: f64) -> Self {
        self.size = Some(size);
        self
    }

    /// Set the placement strategy.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Set the triangle count target.
    pub fn with_max_triangles(mut self, max_triangles: usize) -> Self {
        self.max_triangles = max_triangles;
        self
    }

    /// Enable the post-contraction swap pass.
    pub fn with_swap(mut self, swap: bool) -> Self {
        self.swap = swap;
        self
    }

    /// Build options from a string-keyed map.
    ///
    /// Recognized keys are `size`, `placement` and `maxtriangles`; any
    /// other key is an error.
    pub fn from_options(map: &HashMap<String, String>) -> Result<Self> {
        let mut options = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "size" => {
                    let size: f64 = value
                        .parse()
                        .map_err(|_| Error::invalid_param("size", value, "not a number"))?;
                    options.size = Some(size);
                }
                "placement" => {
                    options.placement = Placement::parse(value).ok_or_else(|| {
                        Error::invalid_param("placement", value, "unknown strategy")
                    })?;
                }
                "maxtriangles" => {
                    options.max_triangles = value.parse().map_err(|_| {
                        Error::invalid_param("maxtriangles", value, "not an integer")
                    })?;
                }
                _ => {
                    return Err(Error::UnknownOption { key: key.clone() });
                }
            }
        }
        options.validate()?;
        Ok(options)
    }

    /// Check that the options describe a runnable decimation.
    pub fn validate(&self) -> Result<()> {
        if self.size.is_none() && self.max_triangles == 0 {
            return Err(Error::NoStoppingRule);
        }
        if let Some(size) = self.size {
            if !size.is_finite() || size < 0.0 {
                return Err(Error::invalid_param("size", size, "must be non-negative"));
            }
        }
        if !self.boundary_weight.is_finite() || self.boundary_weight < 0.0 {
            return Err(Error::invalid_param(
                "boundary_weight",
                self.boundary_weight,
                "must be non-negative",
            ));
        }
        if !(-1.0..=1.0).contains(&self.swap_min_cos) {
            return Err(Error::invalid_param(
                "swap_min_cos",
                self.swap_min_cos,
                "must be a cosine",
            ));
        }
        Ok(())
    }
}

/// Counters reported by a decimation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecimateStats {
    /// Edges contracted.
    pub contracted: usize,
    /// Candidate edges skipped because contraction was illegal.
    pub rejected: usize,
    /// Edges flipped by the swap pass.
    pub swapped: usize,
    /// Edges left in the queue whose cost was still below the tolerance.
    pub below_tolerance_remaining: usize,
}
