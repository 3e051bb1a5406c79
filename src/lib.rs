//! # Whittle
//!
//! A surface mesh decimation library built on a half-edge data structure.
//!
//! Whittle reduces triangle meshes by greedy edge contraction driven by
//! error quadrics, in the manner of Garland and Heckbert. The half-edge
//! structure keeps adjacency queries O(1), tracks boundary and
//! non-manifold edges explicitly, and closes every boundary with a
//! sentinel shell so that the contraction machinery never needs a special
//! case for the rim of the surface.
//!
//! ## Features
//!
//! - **Half-edge data structure**: O(1) adjacency queries with type-safe indices
//! - **Non-manifold support**: edges shared by more than two triangles are
//!   linked in rings and survive decimation
//! - **Quadric error metric**: area-weighted quadrics with boundary
//!   reinforcement planes
//! - **Four placement strategies**: endpoint, midpoint, on-edge minimizer,
//!   and unconstrained optimal
//!
//! ## Quick Start
//!
//! ```
//! use whittle::prelude::*;
//! use nalgebra::Point3;
//!
//! // A flat fan of four triangles.
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
//! // Contract every edge deviating less than the tolerance.
//! let options = DecimateOptions::new().with_size(0.01);
//! let stats = qem_decimate(&mut mesh, options).unwrap();
//! assert!(stats.contracted > 0);
//!
//! // Extract the decimated mesh as face-vertex arrays.
//! let (vertices, faces) = to_face_vertex(&mesh);
//! assert_eq!(faces.len(), mesh.active_triangles());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod mesh;
pub mod tree;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use whittle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::decimate::{
        qem_decimate, DecimateOptions, DecimateStats, Placement,
    };
    pub use crate::error::{Error, Result};
    pub use crate::mesh::{
        build_from_triangles, build_with_tags, to_face_vertex, EdgeAttributes, HalfEdgeId,
        HalfEdgeMesh, TriangleId, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
