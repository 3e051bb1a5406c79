//! Index types for mesh elements.
//!
//! This module provides type-safe index wrappers for vertices, triangles and
//! half-edges. A [`HalfEdgeId`] is not an index into a separate half-edge
//! array: it packs a `(triangle, local edge 0..2)` pair as `triangle * 3 +
//! local`, so half-edge navigation is plain index arithmetic into the
//! triangle array and freed triangle slots take their three half-edges with
//! them.

use std::fmt::{self, Debug};

macro_rules! impl_index_type {
    ($name:ident, $display:literal) => {
        impl $name {
            /// Create a new index from a raw value.
            #[inline]
            pub fn new(index: usize) -> Self {
                debug_assert!(index < u32::MAX as usize);
                Self(index as u32)
            }

            /// Create an invalid/null index.
            #[inline]
            pub fn invalid() -> Self {
                Self(u32::MAX)
            }

            /// Get the raw index value.
            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            /// Check if this is a valid (non-null) index.
            #[inline]
            pub fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }
        }

        impl Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", $display, self.index())
                } else {
                    write!(f, "{}(INVALID)", $display)
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }
    };
}

/// A type-safe vertex index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct VertexId(u32);

/// A type-safe triangle index.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct TriangleId(u32);

/// A type-safe half-edge index, packing `(triangle, local edge)`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct HalfEdgeId(u32);

impl_index_type!(VertexId, "V");
impl_index_type!(TriangleId, "T");
impl_index_type!(HalfEdgeId, "HE");

impl HalfEdgeId {
    /// Create a half-edge id from its triangle and local edge number.
    #[inline]
    pub fn from_parts(triangle: TriangleId, local: usize) -> Self {
        debug_assert!(local < 3);
        Self::new(triangle.index() * 3 + local)
    }

    /// The triangle owning this half-edge.
    #[inline]
    pub fn triangle(self) -> TriangleId {
        TriangleId::new(self.index() / 3)
    }

    /// The local edge number (0..2) within the owning triangle.
    ///
    /// By convention, local edge `i` is the edge opposite vertex `i`.
    #[inline]
    pub fn local(self) -> usize {
        self.index() % 3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let v = VertexId::new(42);
        assert_eq!(v.index(), 42);
        assert!(v.is_valid());

        let invalid = VertexId::invalid();
        assert!(!invalid.is_valid());
    }

    #[test]
    fn test_halfedge_packing() {
        let t = TriangleId::new(7);
        for local in 0..3 {
            let he = HalfEdgeId::from_parts(t, local);
            assert_eq!(he.triangle(), t);
            assert_eq!(he.local(), local);
        }
    }

    #[test]
    fn test_debug_format() {
        let v = VertexId::new(42);
        assert_eq!(format!("{:?}", v), "V(42)");

        let invalid = VertexId::invalid();
        assert_eq!(format!("{:?}", invalid), "V(INVALID)");
    }
}
