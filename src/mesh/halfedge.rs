//! Half-edge mesh data structure.
//!
//! This module provides a half-edge representation for triangle meshes in
//! which half-edges are not stored as separate records: each triangle owns
//! three implicit half-edges, and a [`HalfEdgeId`] packs the owning triangle
//! together with a local edge number. Local edge `i` is the edge opposite
//! vertex `i`, so its origin is `v[(i + 1) % 3]`, its destination is
//! `v[(i + 2) % 3]` and its apex is `v[i]`. `next` and `prev` are index
//! arithmetic; only the `sym` link across an edge is stored.
//!
//! # Boundary handling
//!
//! The mesh carries a sentinel outer shell: every boundary edge is backed by
//! an outer triangle whose apex is a reserved outer vertex, and outer
//! triangles are glued to each other along boundary loops. Every half-edge
//! therefore has a symmetric counterpart and fan traversal around a vertex
//! needs no boundary special cases. Outer triangles are excluded from
//! geometry queries and from the active triangle count.
//!
//! # Non-manifold edges
//!
//! An edge shared by more than two triangles links its half-edges into a
//! cyclic ring instead of a symmetric pair; `sym` steps to the next ring
//! member.

use nalgebra::{Point3, Vector3};

use super::index::{HalfEdgeId, TriangleId, VertexId};

/// Attribute flags carried by each half-edge.
///
/// Attributes describe the undirected edge, so the builder and the mesh
/// operators keep them mirrored on both halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EdgeAttributes(u8);

impl EdgeAttributes {
    /// Edge on the surface boundary.
    pub const BOUNDARY: EdgeAttributes = EdgeAttributes(1 << 0);
    /// Edge of a sentinel outer triangle.
    pub const OUTER: EdgeAttributes = EdgeAttributes(1 << 1);
    /// Edge produced by a diagonal swap.
    pub const SWAPPED: EdgeAttributes = EdgeAttributes(1 << 2);
    /// Edge currently tracked by an algorithm.
    pub const MARKED: EdgeAttributes = EdgeAttributes(1 << 3);
    /// Edge splitting a quadrilateral.
    pub const QUAD: EdgeAttributes = EdgeAttributes(1 << 4);
    /// Edge shared by more than two triangles.
    pub const NONMANIFOLD: EdgeAttributes = EdgeAttributes(1 << 5);

    /// No attributes set.
    #[inline]
    pub fn empty() -> Self {
        EdgeAttributes(0)
    }

    /// Check whether any of the given flags is set.
    #[inline]
    pub fn has(self, flags: EdgeAttributes) -> bool {
        self.0 & flags.0 != 0
    }

    /// Set the given flags.
    #[inline]
    pub fn set(&mut self, flags: EdgeAttributes) {
        self.0 |= flags.0;
    }

    /// Clear the given flags.
    #[inline]
    pub fn clear(&mut self, flags: EdgeAttributes) {
        self.0 &= !flags.0;
    }
}

impl std::ops::BitOr for EdgeAttributes {
    type Output = EdgeAttributes;

    #[inline]
    fn bitor(self, rhs: EdgeAttributes) -> EdgeAttributes {
        EdgeAttributes(self.0 | rhs.0)
    }
}

/// The link from a half-edge to the other half-edges of the same
/// undirected edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Adjacency {
    /// Manifold edge: exactly one opposite half-edge.
    Sym(HalfEdgeId),
    /// Non-manifold edge: the full cyclic ring of half-edges sharing the
    /// edge, this half included. `sym` steps to the next ring member.
    Ring(Vec<HalfEdgeId>),
}

impl Default for Adjacency {
    fn default() -> Self {
        Adjacency::Sym(HalfEdgeId::invalid())
    }
}

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Tag carried over from an external geometric constraint; `0` means
    /// unconstrained. Tagged vertices keep their identity and position
    /// through contractions.
    pub ref_tag: i32,

    /// One half-edge originating at this vertex.
    pub link: HalfEdgeId,

    /// Whether algorithms may read geometry through this vertex.
    /// The reserved outer vertex is not readable.
    pub readable: bool,

    /// Whether algorithms may move this vertex.
    pub writable: bool,
}

impl Vertex {
    /// Create a new unconstrained vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            ref_tag: 0,
            link: HalfEdgeId::invalid(),
            readable: true,
            writable: true,
        }
    }
}

/// A triangle in the half-edge mesh.
///
/// The triangle owns its three half-edges: vertex array, per-edge adjacency
/// and per-edge attributes are indexed by the local edge number.
#[derive(Debug, Clone)]
pub struct Triangle {
    /// The three vertices, counter-clockwise.
    pub vertices: [VertexId; 3],

    /// Adjacency of the three local edges.
    pub adjacency: [Adjacency; 3],

    /// Attributes of the three local edges.
    pub attributes: [EdgeAttributes; 3],

    /// Whether this is a sentinel outer triangle.
    pub outer: bool,

    /// Whether algorithms may modify this triangle.
    pub writable: bool,
}

impl Triangle {
    /// Create a new triangle over the given vertices, with no adjacency.
    pub fn new(vertices: [VertexId; 3]) -> Self {
        Self {
            vertices,
            adjacency: Default::default(),
            attributes: Default::default(),
            outer: false,
            writable: true,
        }
    }
}

/// A half-edge mesh for triangle surfaces.
///
/// Vertices and triangles live in tombstoned arenas so that local operators
/// can free slots without invalidating other ids.
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) vertex_alive: Vec<bool>,
    pub(crate) triangles: Vec<Triangle>,
    pub(crate) triangle_alive: Vec<bool>,

    /// The reserved apex of all outer triangles. Invalid on a closed mesh.
    pub(crate) outer_vertex: VertexId,

    /// Number of live non-outer triangles, maintained by the operators.
    pub(crate) active_triangles: usize,
}

impl HalfEdgeMesh {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    // ==================== Accessors ====================

    /// Number of live vertices, the outer sentinel excluded.
    pub fn num_vertices(&self) -> usize {
        self.vertex_alive
            .iter()
            .enumerate()
            .filter(|&(i, &alive)| alive && VertexId::new(i) != self.outer_vertex)
            .count()
    }

    /// Number of live non-outer triangles.
    #[inline]
    pub fn active_triangles(&self) -> usize {
        self.active_triangles
    }

    /// Get a vertex by id.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get a mutable vertex by id.
    #[inline]
    pub fn vertex_mut(&mut self, id: VertexId) -> &mut Vertex {
        &mut self.vertices[id.index()]
    }

    /// Get a triangle by id.
    #[inline]
    pub fn triangle(&self, id: TriangleId) -> &Triangle {
        &self.triangles[id.index()]
    }

    /// Get a mutable triangle by id.
    #[inline]
    pub fn triangle_mut(&mut self, id: TriangleId) -> &mut Triangle {
        &mut self.triangles[id.index()]
    }

    /// Whether a vertex slot is live.
    #[inline]
    pub fn is_vertex_alive(&self, id: VertexId) -> bool {
        self.vertex_alive[id.index()]
    }

    /// Whether a triangle slot is live.
    #[inline]
    pub fn is_triangle_alive(&self, id: TriangleId) -> bool {
        self.triangle_alive[id.index()]
    }

    /// Whether a triangle is a sentinel outer triangle.
    #[inline]
    pub fn is_outer(&self, id: TriangleId) -> bool {
        self.triangle(id).outer
    }

    /// The reserved outer vertex, invalid on a closed mesh.
    #[inline]
    pub fn outer_vertex(&self) -> VertexId {
        self.outer_vertex
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    // ==================== Half-edge queries ====================

    /// The origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, e: HalfEdgeId) -> VertexId {
        self.triangle(e.triangle()).vertices[(e.local() + 1) % 3]
    }

    /// The destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, e: HalfEdgeId) -> VertexId {
        self.triangle(e.triangle()).vertices[(e.local() + 2) % 3]
    }

    /// The apex vertex of a half-edge (the triangle vertex it is opposite).
    #[inline]
    pub fn apex(&self, e: HalfEdgeId) -> VertexId {
        self.triangle(e.triangle()).vertices[e.local()]
    }

    /// The next half-edge counter-clockwise in the same triangle.
    #[inline]
    pub fn next(&self, e: HalfEdgeId) -> HalfEdgeId {
        HalfEdgeId::from_parts(e.triangle(), (e.local() + 1) % 3)
    }

    /// The previous half-edge in the same triangle.
    #[inline]
    pub fn prev(&self, e: HalfEdgeId) -> HalfEdgeId {
        HalfEdgeId::from_parts(e.triangle(), (e.local() + 2) % 3)
    }

    /// The symmetric half-edge across the edge.
    ///
    /// On a manifold edge this is the single opposite half-edge; on a
    /// non-manifold edge it is the next member of the edge ring.
    pub fn sym(&self, e: HalfEdgeId) -> HalfEdgeId {
        match &self.triangle(e.triangle()).adjacency[e.local()] {
            Adjacency::Sym(s) => *s,
            Adjacency::Ring(ring) => {
                let pos = ring
                    .iter()
                    .position(|&h| h == e)
                    .expect("half-edge missing from its own edge ring");
                ring[(pos + 1) % ring.len()]
            }
        }
    }

    /// The next half-edge with the same origin, counter-clockwise.
    ///
    /// With the outer shell in place this traversal crosses boundaries
    /// transparently, so repeated application cycles through the full fan.
    #[inline]
    pub fn next_origin(&self, e: HalfEdgeId) -> HalfEdgeId {
        self.sym(self.prev(e))
    }

    /// The attributes of a half-edge.
    #[inline]
    pub fn attributes(&self, e: HalfEdgeId) -> EdgeAttributes {
        self.triangle(e.triangle()).attributes[e.local()]
    }

    /// Check whether a half-edge has any of the given attribute flags.
    #[inline]
    pub fn has_attributes(&self, e: HalfEdgeId, flags: EdgeAttributes) -> bool {
        self.attributes(e).has(flags)
    }

    /// Set attribute flags on a half-edge.
    #[inline]
    pub fn set_attributes(&mut self, e: HalfEdgeId, flags: EdgeAttributes) {
        self.triangle_mut(e.triangle()).attributes[e.local()].set(flags);
    }

    /// Clear attribute flags on a half-edge.
    #[inline]
    pub fn clear_attributes(&mut self, e: HalfEdgeId, flags: EdgeAttributes) {
        self.triangle_mut(e.triangle()).attributes[e.local()].clear(flags);
    }

    /// Link two half-edges as a symmetric manifold pair.
    pub(crate) fn glue(&mut self, a: HalfEdgeId, b: HalfEdgeId) {
        self.triangle_mut(a.triangle()).adjacency[a.local()] = Adjacency::Sym(b);
        self.triangle_mut(b.triangle()).adjacency[b.local()] = Adjacency::Sym(a);
    }

    /// The canonical half-edge of an undirected edge, used as a stable key.
    ///
    /// Prefers a half-edge owned by a non-outer triangle, then the smallest
    /// id; for non-manifold edges, the smallest ring member.
    pub fn canonical(&self, e: HalfEdgeId) -> HalfEdgeId {
        match &self.triangle(e.triangle()).adjacency[e.local()] {
            Adjacency::Ring(ring) => *ring.iter().min().expect("empty edge ring"),
            Adjacency::Sym(s) => {
                let s = *s;
                let e_outer = self.is_outer(e.triangle());
                let s_outer = self.is_outer(s.triangle());
                if e_outer != s_outer {
                    if e_outer {
                        s
                    } else {
                        e
                    }
                } else {
                    e.min(s)
                }
            }
        }
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex ids, the outer sentinel excluded.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertex_alive
            .iter()
            .enumerate()
            .filter_map(move |(i, &alive)| {
                let id = VertexId::new(i);
                (alive && id != self.outer_vertex).then_some(id)
            })
    }

    /// Iterate over all live non-outer triangle ids.
    pub fn triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.triangle_alive
            .iter()
            .enumerate()
            .filter_map(move |(i, &alive)| {
                let id = TriangleId::new(i);
                (alive && !self.is_outer(id)).then_some(id)
            })
    }

    /// Iterate over all live triangle ids, outer triangles included.
    pub fn all_triangle_ids(&self) -> impl Iterator<Item = TriangleId> + '_ {
        self.triangle_alive
            .iter()
            .enumerate()
            .filter_map(|(i, &alive)| alive.then_some(TriangleId::new(i)))
    }

    /// Iterate over the fan of half-edges sharing the origin of `e`,
    /// starting at `e`, counter-clockwise, crossing boundaries through the
    /// outer shell.
    pub fn origin_loop(&self, e: HalfEdgeId) -> OriginLoopIter<'_> {
        OriginLoopIter {
            mesh: self,
            start: e,
            current: e,
            done: false,
        }
    }

    // ==================== Geometry ====================

    /// The edge vector of a half-edge, origin to destination.
    pub fn edge_vector(&self, e: HalfEdgeId) -> Vector3<f64> {
        self.position(self.dest(e)) - self.position(self.origin(e))
    }

    /// The squared length of a half-edge.
    pub fn edge_length_squared(&self, e: HalfEdgeId) -> f64 {
        self.edge_vector(e).norm_squared()
    }

    /// The midpoint of a half-edge.
    pub fn edge_midpoint(&self, e: HalfEdgeId) -> Point3<f64> {
        let p0 = self.position(self.origin(e));
        let p1 = self.position(self.dest(e));
        Point3::from((p0.coords + p1.coords) * 0.5)
    }

    /// The unnormalized normal of a triangle, with norm twice its area.
    pub fn triangle_raw_normal(&self, t: TriangleId) -> Vector3<f64> {
        let [v0, v1, v2] = self.triangle(t).vertices;
        let p0 = self.position(v0);
        let p1 = self.position(v1);
        let p2 = self.position(v2);
        (p1 - p0).cross(&(p2 - p0))
    }

    /// The area of the triangle owning a half-edge.
    pub fn area(&self, e: HalfEdgeId) -> f64 {
        0.5 * self.triangle_raw_normal(e.triangle()).norm()
    }

    // ==================== Validation ====================

    /// Check structural consistency: symmetric links, vertex identities
    /// across edges, and vertex link pointers.
    pub fn check_consistency(&self) -> bool {
        for t in self.all_triangle_ids() {
            for local in 0..3 {
                let e = HalfEdgeId::from_parts(t, local);
                match &self.triangle(t).adjacency[local] {
                    Adjacency::Sym(s) => {
                        if !s.is_valid() || !self.is_triangle_alive(s.triangle()) {
                            return false;
                        }
                        if self.sym(*s) != e {
                            return false;
                        }
                        if self.origin(e) != self.dest(*s) || self.dest(e) != self.origin(*s) {
                            return false;
                        }
                    }
                    Adjacency::Ring(ring) => {
                        if ring.len() < 2 || !ring.contains(&e) {
                            return false;
                        }
                        for &h in ring {
                            if !self.is_triangle_alive(h.triangle()) {
                                return false;
                            }
                            let (o, d) = (self.origin(h), self.dest(h));
                            if (o, d) != (self.origin(e), self.dest(e))
                                && (o, d) != (self.dest(e), self.origin(e))
                            {
                                return false;
                            }
                        }
                    }
                }
            }
        }

        for v in self.vertex_ids() {
            let link = self.vertex(v).link;
            if !link.is_valid()
                || !self.is_triangle_alive(link.triangle())
                || self.origin(link) != v
            {
                return false;
            }
        }

        true
    }
}

/// Iterator over the fan of half-edges sharing an origin vertex.
pub struct OriginLoopIter<'a> {
    mesh: &'a HalfEdgeMesh,
    start: HalfEdgeId,
    current: HalfEdgeId,
    done: bool,
}

impl<'a> Iterator for OriginLoopIter<'a> {
    type Item = HalfEdgeId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next_origin(self.current);
        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    fn two_triangles() -> HalfEdgeMesh {
        // Two triangles sharing the edge 0-1.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_attributes_bitset() {
        let mut a = EdgeAttributes::empty();
        assert!(!a.has(EdgeAttributes::BOUNDARY));

        a.set(EdgeAttributes::BOUNDARY | EdgeAttributes::MARKED);
        assert!(a.has(EdgeAttributes::BOUNDARY));
        assert!(a.has(EdgeAttributes::MARKED));
        assert!(!a.has(EdgeAttributes::OUTER));

        a.clear(EdgeAttributes::MARKED);
        assert!(!a.has(EdgeAttributes::MARKED));
        assert!(a.has(EdgeAttributes::BOUNDARY));
    }

    #[test]
    fn test_edge_vertex_convention() {
        let mesh = two_triangles();
        let t = TriangleId::new(0);
        for local in 0..3 {
            let e = HalfEdgeId::from_parts(t, local);
            let tri = mesh.triangle(t);
            assert_eq!(mesh.apex(e), tri.vertices[local]);
            assert_eq!(mesh.origin(e), tri.vertices[(local + 1) % 3]);
            assert_eq!(mesh.dest(e), tri.vertices[(local + 2) % 3]);
        }
    }

    #[test]
    fn test_sym_is_involutive_on_interior() {
        let mesh = two_triangles();
        for t in mesh.triangle_ids() {
            for local in 0..3 {
                let e = HalfEdgeId::from_parts(t, local);
                let s = mesh.sym(e);
                assert_eq!(mesh.sym(s), e);
                assert_eq!(mesh.origin(e), mesh.dest(s));
                assert_eq!(mesh.dest(e), mesh.origin(s));
            }
        }
    }

    #[test]
    fn test_origin_loop_crosses_boundary() {
        let mesh = two_triangles();
        // Vertex 1 is a boundary vertex shared by both triangles. Its fan
        // visits both real triangles and two outer triangles.
        let v = VertexId::new(1);
        let link = mesh.vertex(v).link;
        assert_eq!(mesh.origin(link), v);

        let fan: Vec<_> = mesh.origin_loop(link).collect();
        assert_eq!(fan.len(), 4);
        for &e in &fan {
            assert_eq!(mesh.origin(e), v);
        }

        let real = fan.iter().filter(|e| !mesh.is_outer(e.triangle())).count();
        assert_eq!(real, 2);
    }

    #[test]
    fn test_consistency_after_build() {
        let mesh = two_triangles();
        assert!(mesh.check_consistency());
        assert_eq!(mesh.active_triangles(), 2);
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn test_canonical_prefers_real_triangle() {
        let mesh = two_triangles();
        for t in mesh.triangle_ids() {
            for local in 0..3 {
                let e = HalfEdgeId::from_parts(t, local);
                let c = mesh.canonical(e);
                assert!(!mesh.is_outer(c.triangle()));
                assert_eq!(mesh.canonical(mesh.sym(e)), c);
            }
        }
    }
}
