//! Local mesh operators: edge contraction, edge split and diagonal swap.
//!
//! All operators work on half-edges of real triangles; a half-edge of an
//! outer triangle is first replaced by its symmetric counterpart. `collapse`
//! assumes `can_collapse` returned `true` for the same edge and target and
//! performs no safety checks of its own.

use nalgebra::{Point3, Vector3};

use super::halfedge::{EdgeAttributes, HalfEdgeMesh, Triangle, Vertex};
use super::index::{HalfEdgeId, TriangleId, VertexId};
use crate::error::{Error, Result};

impl HalfEdgeMesh {
    /// Replace a half-edge of an outer triangle by its real counterpart.
    fn real_half(&self, e: HalfEdgeId) -> HalfEdgeId {
        if self.is_outer(e.triangle()) {
            self.sym(e)
        } else {
            e
        }
    }

    /// Check whether contracting `e` into `target` is legal.
    ///
    /// The test combines a topological link condition (vertices adjacent to
    /// both endpoints must be apexes of the two incident triangles; with the
    /// outer shell in place this also rejects interior edges joining two
    /// boundary vertices) with a geometric pass rejecting contractions that
    /// flip or degenerate a surviving ring triangle. Non-manifold edges and
    /// edges touching one are conservatively refused, as is any edge whose
    /// fans reach a triangle outside the writable region.
    pub fn can_collapse(&self, e: HalfEdgeId, target: &Point3<f64>) -> bool {
        let e = self.real_half(e);
        let s = self.sym(e);
        let t1 = e.triangle();
        let t2 = s.triangle();

        if self.has_attributes(e, EdgeAttributes::NONMANIFOLD) {
            return false;
        }
        // Contraction rewires every triangle of both fans, so a
        // non-manifold or non-writable triangle anywhere in them blocks it.
        for f in self.origin_loop(e) {
            if self.has_attributes(f, EdgeAttributes::NONMANIFOLD) {
                return false;
            }
            let t = f.triangle();
            if !self.is_outer(t) && !self.triangle(t).writable {
                return false;
            }
        }
        for f in self.origin_loop(s) {
            if self.has_attributes(f, EdgeAttributes::NONMANIFOLD) {
                return false;
            }
            let t = f.triangle();
            if !self.is_outer(t) && !self.triangle(t).writable {
                return false;
            }
        }

        // An ear: the two other edges of an incident triangle are both on
        // the boundary, so contraction would leave a dangling triangle.
        if !self.is_outer(t1)
            && self.has_attributes(self.next(e), EdgeAttributes::BOUNDARY)
            && self.has_attributes(self.prev(e), EdgeAttributes::BOUNDARY)
        {
            return false;
        }
        if !self.is_outer(t2)
            && self.has_attributes(self.next(s), EdgeAttributes::BOUNDARY)
            && self.has_attributes(self.prev(s), EdgeAttributes::BOUNDARY)
        {
            return false;
        }

        // Link condition. Neighbors are collected through the outer shell,
        // so the sentinel vertex shows up for boundary endpoints.
        let a1 = self.apex(e);
        let a2 = self.apex(s);
        let neighbors_origin: Vec<VertexId> =
            self.origin_loop(e).map(|f| self.dest(f)).collect();
        for f in self.origin_loop(s) {
            let v = self.dest(f);
            if v != a1 && v != a2 && neighbors_origin.contains(&v) {
                return false;
            }
        }

        self.check_new_ring_normals(e, target, t1, t2)
            && self.check_new_ring_normals(s, target, t1, t2)
    }

    /// Check that moving the origin of `start` to `target` neither flips
    /// nor degenerates any surviving triangle of its fan.
    fn check_new_ring_normals(
        &self,
        start: HalfEdgeId,
        target: &Point3<f64>,
        t1: TriangleId,
        t2: TriangleId,
    ) -> bool {
        for f in self.origin_loop(start) {
            let t = f.triangle();
            if t == t1 || t == t2 || self.is_outer(t) {
                continue;
            }
            let vertices = self.triangle(t).vertices;
            let mut before = [Vector3::zeros(); 3];
            let mut after = [Vector3::zeros(); 3];
            for k in 0..3 {
                before[k] = self.position(vertices[k]).coords;
                after[k] = before[k];
            }
            after[(f.local() + 1) % 3] = target.coords;

            let n0 = (before[1] - before[0]).cross(&(before[2] - before[0]));
            let n1 = (after[1] - after[0]).cross(&(after[2] - after[0]));
            if n0.dot(&n1) <= 0.0 {
                return false;
            }
        }
        true
    }

    /// Contract edge `e`, merging its endpoints into `kept` placed at
    /// `target`.
    ///
    /// The two incident triangles are deleted, the fan of the removed
    /// endpoint is rewired onto `kept`, and the neighbor pairs across the
    /// deleted triangles are glued with merged edge attributes. Returns the
    /// half-edge originating at `kept` whose apex is the apex of the
    /// triangle that owned `e`.
    ///
    /// Precondition: `can_collapse(e, target)` returned `true` and `kept`
    /// is an endpoint of `e`.
    pub fn collapse(
        &mut self,
        e: HalfEdgeId,
        kept: VertexId,
        target: Point3<f64>,
    ) -> HalfEdgeId {
        let e = self.real_half(e);
        let s = self.sym(e);
        let t1 = e.triangle();
        let t2 = s.triangle();

        let origin = self.origin(e);
        let dest = self.dest(e);
        debug_assert!(kept == origin || kept == dest);
        let removed = if kept == origin { dest } else { origin };

        let a1 = self.apex(e);
        let a2 = self.apex(s);
        let n1 = self.sym(self.next(e));
        let p1 = self.sym(self.prev(e));
        let n2 = self.sym(self.next(s));
        let p2 = self.sym(self.prev(s));
        let attrs1 = self.attributes(self.next(e)) | self.attributes(self.prev(e));
        let attrs2 = self.attributes(self.next(s)) | self.attributes(self.prev(s));

        // Rewire the removed endpoint's fan onto the kept vertex. The fan
        // is collected first; it includes edges of the dying triangles.
        let start = if removed == origin { e } else { s };
        let fan: Vec<HalfEdgeId> = self.origin_loop(start).collect();
        for f in fan {
            let t = f.triangle();
            if t == t1 || t == t2 {
                continue;
            }
            self.triangle_mut(t).vertices[(f.local() + 1) % 3] = kept;
        }

        // Glue the neighbors across each dying triangle; the two edges
        // merging into one pool their attributes.
        self.glue(n1, p1);
        self.set_attributes(n1, attrs1);
        self.set_attributes(p1, attrs1);
        self.glue(n2, p2);
        self.set_attributes(n2, attrs2);
        self.set_attributes(p2, attrs2);

        for t in [t1, t2] {
            self.triangle_alive[t.index()] = false;
            if !self.is_outer(t) {
                self.active_triangles -= 1;
            }
        }
        self.vertex_alive[removed.index()] = false;
        self.set_position(kept, target);

        let ret = self.next(n1);
        debug_assert_eq!(self.origin(ret), kept);
        debug_assert_eq!(self.apex(ret), a1);
        self.vertex_mut(kept).link = ret;
        self.vertex_mut(a1).link = n1;
        self.vertex_mut(a2).link = n2;

        ret
    }

    /// Split edge `e` at `point`, inserting one vertex and two triangles.
    ///
    /// This is the structural inverse of [`collapse`](Self::collapse):
    /// contracting the returned edge back into its origin restores the
    /// input mesh. Returns `e`, which now runs from its original origin to
    /// the new vertex.
    pub fn split(&mut self, e: HalfEdgeId, point: Point3<f64>) -> HalfEdgeId {
        let e = self.real_half(e);
        let s = self.sym(e);
        let t1 = e.triangle();
        let t2 = s.triangle();

        let a = self.origin(e);
        let b = self.dest(e);
        let c = self.apex(e);
        let d = self.apex(s);
        let x1 = self.sym(self.next(e));
        let x2 = self.sym(self.next(s));
        let attrs_e = self.attributes(e);
        let attrs_s = self.attributes(s);
        let attrs_bc = self.attributes(self.next(e));
        let attrs_ad = self.attributes(self.next(s));
        let t2_outer = self.is_outer(t2);
        let base2 = if t2_outer {
            EdgeAttributes::OUTER
        } else {
            EdgeAttributes::empty()
        };

        let n = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(point));
        self.vertex_alive.push(true);

        // Shrink the two incident triangles onto the new vertex: the
        // destination slot of each inner half becomes `n`, so `e` now runs
        // a -> n and `s` runs b -> n.
        self.triangle_mut(t1).vertices[(e.local() + 2) % 3] = n;
        self.triangle_mut(t1).attributes[(e.local() + 1) % 3] = EdgeAttributes::empty();
        self.triangle_mut(t2).vertices[(s.local() + 2) % 3] = n;
        self.triangle_mut(t2).attributes[(s.local() + 1) % 3] = base2;

        // Two new triangles cover the freed halves of the old edge.
        let t3 = TriangleId::new(self.triangles.len());
        let tri3 = Triangle::new([c, n, b]);
        self.triangles.push(tri3);
        self.triangle_alive.push(true);
        self.active_triangles += 1;

        let t4 = TriangleId::new(self.triangles.len());
        let mut tri4 = Triangle::new([d, n, a]);
        if t2_outer {
            tri4.outer = true;
            tri4.writable = false;
        } else {
            self.active_triangles += 1;
        }
        self.triangles.push(tri4);
        self.triangle_alive.push(true);

        let t3e0 = HalfEdgeId::from_parts(t3, 0);
        let t3e1 = HalfEdgeId::from_parts(t3, 1);
        let t3e2 = HalfEdgeId::from_parts(t3, 2);
        let t4e0 = HalfEdgeId::from_parts(t4, 0);
        let t4e1 = HalfEdgeId::from_parts(t4, 1);
        let t4e2 = HalfEdgeId::from_parts(t4, 2);

        self.glue(e, t4e0);
        self.glue(s, t3e0);
        self.glue(t3e1, x1);
        self.glue(t3e2, self.next(e));
        self.glue(t4e1, x2);
        self.glue(t4e2, self.next(s));

        {
            let tri = self.triangle_mut(t3);
            tri.attributes[0] = attrs_e;
            tri.attributes[1] = attrs_bc;
            tri.attributes[2] = EdgeAttributes::empty();
        }
        {
            let tri = self.triangle_mut(t4);
            tri.attributes[0] = attrs_s;
            tri.attributes[1] = attrs_ad;
            tri.attributes[2] = base2;
        }

        self.vertex_mut(a).link = e;
        self.vertex_mut(b).link = t3e1;
        self.vertex_mut(n).link = t3e0;

        debug_assert_eq!(self.origin(e), a);
        debug_assert_eq!(self.dest(e), n);
        e
    }

    /// Flip the diagonal of the two triangles incident to `e`.
    ///
    /// Refuses boundary, outer and non-manifold edges, edges of
    /// non-writable triangles, and edges whose surrounding quad touches a
    /// non-manifold edge. The returned half-edge has the same origin and
    /// apex as `e`.
    pub fn swap(&mut self, e: HalfEdgeId) -> Result<HalfEdgeId> {
        if self.has_attributes(
            e,
            EdgeAttributes::BOUNDARY | EdgeAttributes::OUTER | EdgeAttributes::NONMANIFOLD,
        ) {
            return Err(Error::SwapRefused { edge: e });
        }
        let s = self.sym(e);
        if !self.triangle(e.triangle()).writable || !self.triangle(s.triangle()).writable {
            return Err(Error::SwapRefused { edge: e });
        }
        for h in [self.next(e), self.prev(e), self.next(s), self.prev(s)] {
            if self.has_attributes(h, EdgeAttributes::NONMANIFOLD) {
                return Err(Error::SwapRefused { edge: e });
            }
        }

        let t1 = e.triangle();
        let t2 = s.triangle();
        let a = self.origin(e);
        let b = self.dest(e);
        let c = self.apex(e);
        let d = self.apex(s);

        let ext_a = self.sym(self.next(e));
        let ext_b = self.sym(self.prev(e));
        let ext_c = self.sym(self.next(s));
        let ext_d = self.sym(self.prev(s));
        let attrs_bc = self.attributes(self.next(e));
        let attrs_ca = self.attributes(self.prev(e));
        let attrs_ad = self.attributes(self.next(s));
        let attrs_db = self.attributes(self.prev(s));

        // Rebuild the two triangle slots around the new diagonal c-d.
        {
            let tri = self.triangle_mut(t1);
            tri.vertices = [c, a, d];
            tri.attributes = [attrs_ad, EdgeAttributes::SWAPPED, attrs_ca];
        }
        {
            let tri = self.triangle_mut(t2);
            tri.vertices = [c, d, b];
            tri.attributes = [attrs_db, attrs_bc, EdgeAttributes::SWAPPED];
        }

        let t1e0 = HalfEdgeId::from_parts(t1, 0);
        let t1e1 = HalfEdgeId::from_parts(t1, 1);
        let t1e2 = HalfEdgeId::from_parts(t1, 2);
        let t2e0 = HalfEdgeId::from_parts(t2, 0);
        let t2e1 = HalfEdgeId::from_parts(t2, 1);
        let t2e2 = HalfEdgeId::from_parts(t2, 2);

        self.glue(t1e0, ext_c);
        self.glue(t1e2, ext_b);
        self.glue(t2e0, ext_d);
        self.glue(t2e1, ext_a);
        self.glue(t1e1, t2e2);

        self.vertex_mut(a).link = t1e0;
        self.vertex_mut(b).link = t2e1;
        self.vertex_mut(c).link = t2e2;
        self.vertex_mut(d).link = t1e1;

        debug_assert_eq!(self.origin(t1e0), a);
        debug_assert_eq!(self.apex(t1e0), c);
        Ok(t1e0)
    }
}
