//! The greedy contraction driver.
//!
//! A run has four phases: build the vertex quadrics (triangle planes plus
//! boundary reinforcement), seed the cost tree with one entry per
//! undirected edge, contract edges cheapest first with lazy re-validation,
//! and log a termination report. Costs stored in the tree are the cheap
//! endpoint-minimum estimate; the exact placement is only computed when an
//! edge reaches the front of the queue, and an edge that cannot legally be
//! contracted stays in the tree and is skipped in order.
//!
//! Triangles marked non-writable are fenced off: they contribute no
//! quadric planes, their edges are never seeded, and any contraction or
//! swap that would rewrite them is refused.

use log::{debug, info};
use nalgebra::{Point3, Vector3};

use super::quadric::{optimal_placement, Keep, Quadric};
use super::{DecimateOptions, DecimateStats};
use crate::error::Result;
use crate::mesh::{EdgeAttributes, HalfEdgeId, HalfEdgeMesh, VertexId};
use crate::tree::CostTree;

/// Decimate a mesh in place, returning the run counters.
pub fn qem_decimate(mesh: &mut HalfEdgeMesh, options: DecimateOptions) -> Result<DecimateStats> {
    let mut decimater = Decimater::new(mesh, options)?;
    Ok(decimater.compute())
}

/// A saved copy of the vertex quadric table, for inspecting or replaying
/// the state between phases.
#[derive(Debug, Clone)]
pub struct QuadricSnapshot {
    quadrics: Vec<Quadric>,
}

/// Greedy quadric-error decimater over a half-edge mesh.
pub struct Decimater<'a> {
    mesh: &'a mut HalfEdgeMesh,
    options: DecimateOptions,
    /// Squared tolerance compared against edge costs; infinite when only a
    /// triangle target is set.
    tolerance: f64,
    quadrics: Vec<Quadric>,
    tree: CostTree<HalfEdgeId>,
    stats: DecimateStats,
}

impl<'a> Decimater<'a> {
    /// Create a decimater; fails if the options are not runnable.
    pub fn new(mesh: &'a mut HalfEdgeMesh, options: DecimateOptions) -> Result<Self> {
        options.validate()?;
        let tolerance = options.size.map(|s| s * s).unwrap_or(f64::INFINITY);
        let quadrics = vec![Quadric::new(); mesh.vertices.len()];
        Ok(Self {
            mesh,
            options,
            tolerance,
            quadrics,
            tree: CostTree::new(),
            stats: DecimateStats::default(),
        })
    }

    /// Run all phases and return the counters.
    pub fn compute(&mut self) -> DecimateStats {
        self.build_quadrics();
        self.unmark_edges();
        self.seed_tree();
        self.unmark_edges();
        self.contract_all();
        self.report();
        self.stats
    }

    /// Save the current vertex quadrics.
    pub fn checkpoint(&self) -> QuadricSnapshot {
        QuadricSnapshot {
            quadrics: self.quadrics.clone(),
        }
    }

    /// Restore a previously saved quadric table.
    pub fn restore(&mut self, snapshot: &QuadricSnapshot) {
        self.quadrics.clone_from(&snapshot.quadrics);
    }

    // ==================== Phase 1: quadrics ====================

    fn build_quadrics(&mut self) {
        let boundary_weight = self.options.boundary_weight;
        for t in self.mesh.triangle_ids() {
            if !self.mesh.triangle(t).writable {
                continue;
            }
            let raw = self.mesh.triangle_raw_normal(t);
            let norm = raw.norm();
            // The norm is twice the triangle area; the constant factor is
            // shared by every plane and does not matter.
            let area = norm;
            let normal = if norm > 1.0e-20 { raw / norm } else { raw };

            let vertices = self.mesh.triangle(t).vertices;
            let d = -normal.dot(&self.mesh.position(vertices[0]).coords);
            for &v in &vertices {
                self.quadrics[v.index()].add_plane(&normal, d, area);
            }

            // Virtual planes stiffen boundary and non-manifold edges. The
            // weight scales the plane vector, entering the quadric
            // squared, and contributes no area.
            for local in 0..3 {
                let e = HalfEdgeId::from_parts(t, local);
                if !self.mesh.has_attributes(
                    e,
                    EdgeAttributes::BOUNDARY | EdgeAttributes::NONMANIFOLD,
                ) {
                    continue;
                }
                let fin: Vector3<f64> =
                    self.mesh.edge_vector(e).cross(&normal) * boundary_weight;
                let origin = self.mesh.origin(e);
                let dest = self.mesh.dest(e);
                let d = -fin.dot(&self.mesh.position(origin).coords);
                self.quadrics[origin.index()].add_plane(&fin, d, 0.0);
                self.quadrics[dest.index()].add_plane(&fin, d, 0.0);
            }
        }
    }

    // ==================== Phase 2: tree seed ====================

    fn unmark_edges(&mut self) {
        for t in self.mesh.all_triangle_ids().collect::<Vec<_>>() {
            for local in 0..3 {
                self.mesh
                    .clear_attributes(HalfEdgeId::from_parts(t, local), EdgeAttributes::MARKED);
            }
        }
    }

    fn seed_tree(&mut self) {
        for t in self.mesh.triangle_ids().collect::<Vec<_>>() {
            if !self.mesh.triangle(t).writable {
                continue;
            }
            for local in 0..3 {
                let e = HalfEdgeId::from_parts(t, local);
                if self.mesh.has_attributes(e, EdgeAttributes::MARKED) {
                    continue;
                }
                // Mark every half of the edge so it is seeded once.
                let mut h = e;
                loop {
                    self.mesh.set_attributes(h, EdgeAttributes::MARKED);
                    h = self.mesh.sym(h);
                    if h == e {
                        break;
                    }
                }
                let cost = self.edge_cost(self.mesh.origin(e), self.mesh.dest(e));
                self.tree.insert(cost, self.mesh.canonical(e));
            }
        }
    }

    /// Endpoint-minimum cost estimate of contracting `(v1, v2)`.
    fn edge_cost(&self, v1: VertexId, v2: VertexId) -> f64 {
        let q1 = &self.quadrics[v1.index()];
        let q2 = &self.quadrics[v2.index()];
        let p1 = self.mesh.position(v1);
        let p2 = self.mesh.position(v2);
        f64::min(
            q1.value(p1) + q2.value(p1),
            q1.value(p2) + q2.value(p2),
        )
    }

    // ==================== Phase 3: contraction ====================

    fn contract_all(&mut self) {
        // With a triangle target the tolerance gate is bypassed and the
        // queue drains until the target is reached.
        let use_tolerance = self.options.max_triangles == 0;

        while !self.tree.is_empty()
            && (use_tolerance || self.mesh.active_triangles() > self.options.max_triangles)
        {
            // Walk the queue in cost order until a legal contraction shows
            // up; illegal edges stay in the tree for later.
            let mut candidate = self.tree.first();
            let found = loop {
                let Some((key, edge)) = candidate else {
                    break None;
                };
                if use_tolerance && key > self.tolerance {
                    break None;
                }
                let v1 = self.mesh.origin(edge);
                let v2 = self.mesh.dest(edge);
                let merged = Quadric::merged(
                    &self.quadrics[v1.index()],
                    &self.quadrics[v2.index()],
                );
                let (target, keep) = optimal_placement(
                    self.options.placement,
                    self.mesh.position(v1),
                    self.mesh.position(v2),
                    self.mesh.vertex(v1).ref_tag != 0,
                    self.mesh.vertex(v2).ref_tag != 0,
                    &self.quadrics[v1.index()],
                    &self.quadrics[v2.index()],
                    &merged,
                );
                if self.mesh.can_collapse(edge, &target) {
                    break Some((edge, v1, v2, merged, target, keep));
                }
                debug!("edge not contracted: {:?}", edge);
                self.stats.rejected += 1;
                candidate = self.tree.next_after(key, edge);
            };
            let Some((edge, v1, v2, merged, target, keep)) = found else {
                break;
            };

            debug!("contract edge {:?} into {:?}", edge, target);
            self.remove_triangle_edges(edge);

            let kept = match keep {
                Keep::V1 => v1,
                Keep::V2 => v2,
            };
            let ret = self.mesh.collapse(edge, kept, target);
            self.stats.contracted += 1;
            self.quadrics[kept.index()] = merged;

            // Refresh the costs of every edge in the merged vertex's fan.
            let fan: Vec<HalfEdgeId> = self.mesh.origin_loop(ret).collect();
            for f in fan {
                let d = self.mesh.dest(f);
                if d == self.mesh.outer_vertex() || !self.mesh.vertex(d).readable {
                    continue;
                }
                let cost = self.edge_cost(kept, d);
                self.tree.update(cost, self.mesh.canonical(f));
            }

            if self.options.swap {
                self.swap_pass(kept);
            }
        }
    }

    /// Remove the tree entries of all edges of the one or two real
    /// triangles incident to `edge`.
    fn remove_triangle_edges(&mut self, edge: HalfEdgeId) {
        for side in [edge, self.mesh.sym(edge)] {
            let t = side.triangle();
            if self.mesh.is_outer(t) {
                continue;
            }
            for local in 0..3 {
                let key = self.mesh.canonical(HalfEdgeId::from_parts(t, local));
                self.tree.remove(key);
            }
        }
    }

    // ==================== Swap pass ====================

    /// Flip ring edges around `center` while doing so improves the worst
    /// triangle shape, keeping the tree in sync.
    fn swap_pass(&mut self, center: VertexId) {
        loop {
            let link = self.mesh.vertex(center).link;
            let ring: Vec<HalfEdgeId> = self
                .mesh
                .origin_loop(link)
                .map(|f| self.mesh.next(f))
                .collect();

            let mut swapped = false;
            for r in ring {
                if !self.should_swap(r) {
                    continue;
                }
                let t1 = r.triangle();
                let t2 = self.mesh.sym(r).triangle();
                for t in [t1, t2] {
                    for local in 0..3 {
                        let key = self.mesh.canonical(HalfEdgeId::from_parts(t, local));
                        self.tree.remove(key);
                    }
                }
                if self.mesh.swap(r).is_ok() {
                    self.stats.swapped += 1;
                }
                for t in [t1, t2] {
                    for local in 0..3 {
                        let e = HalfEdgeId::from_parts(t, local);
                        let cost = self.edge_cost(self.mesh.origin(e), self.mesh.dest(e));
                        self.tree.update(cost, self.mesh.canonical(e));
                    }
                }
                // The ring snapshot is stale after a flip.
                swapped = true;
                break;
            }
            if !swapped {
                return;
            }
        }
    }

    /// Whether flipping `e` is legal, keeps the surface near-planar and
    /// strictly improves the worse triangle shape of the pair.
    fn should_swap(&self, e: HalfEdgeId) -> bool {
        if self.mesh.has_attributes(
            e,
            EdgeAttributes::BOUNDARY | EdgeAttributes::OUTER | EdgeAttributes::NONMANIFOLD,
        ) {
            return false;
        }
        let s = self.mesh.sym(e);
        for h in [
            self.mesh.next(e),
            self.mesh.prev(e),
            self.mesh.next(s),
            self.mesh.prev(s),
        ] {
            if self.mesh.has_attributes(h, EdgeAttributes::NONMANIFOLD) {
                return false;
            }
        }

        let t1 = e.triangle();
        let t2 = s.triangle();
        if !self.mesh.triangle(t1).writable || !self.mesh.triangle(t2).writable {
            return false;
        }
        let n1 = self.mesh.triangle_raw_normal(t1);
        let n2 = self.mesh.triangle_raw_normal(t2);
        let norms = n1.norm() * n2.norm();
        if norms <= 1.0e-40 || n1.dot(&n2) / norms < self.options.swap_min_cos {
            return false;
        }

        let a = *self.mesh.position(self.mesh.origin(e));
        let b = *self.mesh.position(self.mesh.dest(e));
        let c_v = self.mesh.apex(e);
        let d_v = self.mesh.apex(s);
        let c = *self.mesh.position(c_v);
        let d = *self.mesh.position(d_v);

        // The new diagonal must not duplicate an existing edge.
        for f in self.mesh.origin_loop(self.mesh.prev(e)) {
            if self.mesh.dest(f) == d_v {
                return false;
            }
        }

        // Both new triangles must face the same way as the old pair.
        let up = n1 + n2;
        let m1 = (a - c).cross(&(d - c));
        let m2 = (d - c).cross(&(b - c));
        if m1.dot(&up) <= 0.0 || m2.dot(&up) <= 0.0 {
            return false;
        }

        let before = f64::min(shape_quality(&a, &b, &c), shape_quality(&b, &a, &d));
        let after = f64::min(shape_quality(&c, &a, &d), shape_quality(&c, &d, &b));
        after > before
    }

    // ==================== Phase 4: report ====================

    fn report(&mut self) {
        let threshold = self.options.size.map(|s| s * s).unwrap_or(0.0);
        self.stats.below_tolerance_remaining = self
            .tree
            .iter()
            .take_while(|&(key, _)| key <= threshold)
            .count();
        info!("number of contracted edges: {}", self.stats.contracted);
        info!(
            "number of edges which could have been contracted: {}",
            self.stats.below_tolerance_remaining
        );
        info!(
            "number of other edges not contracted: {}",
            self.tree.len() - self.stats.below_tolerance_remaining
        );
        if self.options.swap {
            info!("number of swapped edges: {}", self.stats.swapped);
        }
    }
}

/// Shape quality of a triangle, 1 for equilateral, 0 for degenerate:
/// `4 sqrt(3) area / sum of squared edge lengths`.
fn shape_quality(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> f64 {
    let e0 = p1 - p0;
    let e1 = p2 - p1;
    let e2 = p0 - p2;
    let denom = e0.norm_squared() + e1.norm_squared() + e2.norm_squared();
    if denom <= 0.0 {
        return 0.0;
    }
    let area = 0.5 * e0.cross(&(-e2)).norm();
    4.0 * 3.0_f64.sqrt() * area / denom
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::decimate::Placement;
    use crate::mesh::build_from_triangles;

    fn flat_strip() -> HalfEdgeMesh {
        // Four collinear quads split into triangles along y = 0 and y = 1.
        let mut vertices = Vec::new();
        for x in 0..5 {
            vertices.push(Point3::new(x as f64, 0.0, 0.0));
        }
        for x in 0..5 {
            vertices.push(Point3::new(x as f64, 1.0, 0.0));
        }
        let mut faces = Vec::new();
        for x in 0..4 {
            faces.push([x, x + 1, x + 6]);
            faces.push([x, x + 6, x + 5]);
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_quadrics_vanish_on_flat_interior() {
        let mut mesh = flat_strip();
        let options = DecimateOptions::new().with_size(0.1);
        let decimater = {
            let mut d = Decimater::new(&mut mesh, options).unwrap();
            d.build_quadrics();
            d
        };
        // Vertex 2 sits mid-span on a straight rim: triangle planes and
        // fin planes all pass through it.
        let q = &decimater.quadrics[2];
        assert!(q.area > 0.0);
        assert!(q.value(&Point3::new(2.0, 0.0, 0.0)).abs() < 1e-9);
        // Leaving the surface plane is penalized.
        assert!(q.value(&Point3::new(2.0, 0.0, 1.0)) > 1.0);
    }

    #[test]
    fn test_count_mode_reaches_target() {
        let mut mesh = flat_strip();
        let options = DecimateOptions::new().with_max_triangles(2);
        let stats = qem_decimate(&mut mesh, options).unwrap();

        assert_eq!(mesh.active_triangles(), 2);
        assert!(stats.contracted >= 3);
        assert!(mesh.check_consistency());
    }

    #[test]
    fn test_tolerance_mode_flattens_strip() {
        let mut mesh = flat_strip();
        // The collinear rim edges of the flat strip have zero cost; a tiny
        // tolerance still lets the strip collapse down.
        let options = DecimateOptions::new().with_size(1e-3);
        let stats = qem_decimate(&mut mesh, options).unwrap();

        assert!(stats.contracted > 0);
        assert!(mesh.active_triangles() < 8);
        assert!(mesh.check_consistency());
    }

    #[test]
    fn test_target_already_met_is_noop() {
        let mut mesh = flat_strip();
        let options = DecimateOptions::new().with_max_triangles(8);
        let stats = qem_decimate(&mut mesh, options).unwrap();

        assert_eq!(stats.contracted, 0);
        assert_eq!(mesh.active_triangles(), 8);
    }

    #[test]
    fn test_illegal_candidates_are_counted() {
        // A diamond: the interior diagonal joins two boundary vertices, so
        // contracting it is refused by the link condition; once a single
        // triangle remains its edges are refused as ears. A generous
        // tolerance keeps every edge below the cost gate.
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [1, 0, 3]];
        let mut mesh = build_from_triangles(&vertices, &faces).unwrap();

        let options = DecimateOptions::new().with_size(1000.0);
        let stats = qem_decimate(&mut mesh, options).unwrap();

        assert_eq!(mesh.active_triangles(), 1);
        assert!(stats.contracted >= 1);
        assert!(stats.rejected > 0);
    }

    #[test]
    fn test_strip_reduces_to_two_triangles_keeping_corners() {
        let mut mesh = flat_strip();
        let options = DecimateOptions::new()
            .with_max_triangles(2)
            .with_placement(Placement::Optimal);
        let mut decimater = Decimater::new(&mut mesh, options).unwrap();
        decimater.compute();

        // Surviving vertices carry the merged quadrics of everything
        // contracted into them; the result never left the input plane, so
        // the residual error vanishes at every one.
        let survivors: Vec<VertexId> = decimater.mesh.vertex_ids().collect();
        for &v in &survivors {
            let residual = decimater.quadrics[v.index()].value(decimater.mesh.position(v));
            assert!(residual.abs() < 1e-9);
        }
        drop(decimater);

        assert_eq!(mesh.active_triangles(), 2);
        assert_eq!(mesh.num_vertices(), 4);
        for corner in [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(4.0, 1.0, 0.0),
        ] {
            assert!(mesh
                .vertex_ids()
                .any(|v| (mesh.position(v) - corner).norm() < 1e-9));
        }
        assert!(mesh.check_consistency());
    }

    #[test]
    fn test_planar_patch_contraction_costs_vanish() {
        // A flat 4x4 grid. Quadrics are sums of squared plane distances,
        // so no contraction can have a negative cost, and on a perfectly
        // planar patch the placed cost is zero for every edge.
        let mut vertices = Vec::new();
        for y in 0..4 {
            for x in 0..4 {
                vertices.push(Point3::new(x as f64, y as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                let v = y * 4 + x;
                faces.push([v, v + 1, v + 5]);
                faces.push([v, v + 5, v + 4]);
            }
        }
        let mut mesh = build_from_triangles(&vertices, &faces).unwrap();

        let options = DecimateOptions::new()
            .with_size(0.1)
            .with_placement(Placement::Optimal);
        let mut decimater = Decimater::new(&mut mesh, options).unwrap();
        decimater.build_quadrics();

        let interior = [5usize, 6, 9, 10];
        let tris: Vec<_> = decimater.mesh.triangle_ids().collect();
        for t in tris {
            for local in 0..3 {
                let e = HalfEdgeId::from_parts(t, local);
                let v1 = decimater.mesh.origin(e);
                let v2 = decimater.mesh.dest(e);

                let estimate = decimater.edge_cost(v1, v2);
                assert!(estimate >= -1e-9, "negative estimate on {e:?}");
                // Edges between interior vertices see nothing but the
                // surface plane itself.
                if interior.contains(&v1.index()) && interior.contains(&v2.index()) {
                    assert!(estimate.abs() < 1e-12);
                }

                let q1 = &decimater.quadrics[v1.index()];
                let q2 = &decimater.quadrics[v2.index()];
                let merged = Quadric::merged(q1, q2);
                let (target, _) = optimal_placement(
                    Placement::Optimal,
                    decimater.mesh.position(v1),
                    decimater.mesh.position(v2),
                    false,
                    false,
                    q1,
                    q2,
                    &merged,
                );
                let cost = merged.value(&target);
                assert!(cost >= -1e-9, "negative cost on {e:?}");
                assert!(cost < 1e-9, "planar contraction left residual cost");
            }
        }
    }

    #[test]
    fn test_frozen_mesh_is_left_alone() {
        let mut mesh = flat_strip();
        for t in mesh.triangle_ids().collect::<Vec<_>>() {
            mesh.triangle_mut(t).writable = false;
        }

        let options = DecimateOptions::new().with_max_triangles(2);
        let stats = qem_decimate(&mut mesh, options).unwrap();

        assert_eq!(stats.contracted, 0);
        assert_eq!(mesh.active_triangles(), 8);
    }

    #[test]
    fn test_frozen_region_is_preserved() {
        use crate::mesh::TriangleId;

        let mut mesh = flat_strip();
        // Freeze the rightmost quad; the rest of the strip stays editable.
        let frozen = [TriangleId::new(6), TriangleId::new(7)];
        for t in frozen {
            mesh.triangle_mut(t).writable = false;
        }

        let options = DecimateOptions::new().with_max_triangles(2);
        let stats = qem_decimate(&mut mesh, options).unwrap();

        assert!(stats.contracted > 0);
        for t in frozen {
            assert!(mesh.is_triangle_alive(t));
        }
        // The frozen triangles' vertices stay exactly where they were.
        for (v, p) in [
            (3, Point3::new(3.0, 0.0, 0.0)),
            (4, Point3::new(4.0, 0.0, 0.0)),
            (8, Point3::new(3.0, 1.0, 0.0)),
            (9, Point3::new(4.0, 1.0, 0.0)),
        ] {
            assert!((mesh.position(VertexId::new(v)) - p).norm() < 1e-12);
        }
        assert!(mesh.check_consistency());
    }

    #[test]
    fn test_fully_tagged_rim_never_moves() {
        use crate::mesh::build_with_tags;

        // Every vertex of the strip lies on the rim; tagging them all
        // forces each contraction to coincide with an endpoint, so no
        // position is ever averaged inward.
        let mut vertices = Vec::new();
        for x in 0..5 {
            vertices.push(Point3::new(x as f64, 0.0, 0.0));
        }
        for x in 0..5 {
            vertices.push(Point3::new(x as f64, 1.0, 0.0));
        }
        let mut faces = Vec::new();
        for x in 0..4 {
            faces.push([x, x + 1, x + 6]);
            faces.push([x, x + 6, x + 5]);
        }
        let tags: Vec<(usize, i32)> = (0..10).map(|v| (v, 1)).collect();
        let mut mesh = build_with_tags(&vertices, &faces, &tags).unwrap();

        let options = DecimateOptions::new().with_max_triangles(2);
        qem_decimate(&mut mesh, options).unwrap();

        for v in mesh.vertex_ids() {
            let p = mesh.position(v);
            assert!(vertices.iter().any(|q| (p - q).norm() < 1e-12));
        }
        assert!(mesh.check_consistency());
    }

    #[test]
    fn test_tagged_vertex_keeps_its_position() {
        use crate::mesh::build_with_tags;

        let mut vertices = Vec::new();
        for x in 0..5 {
            vertices.push(Point3::new(x as f64, 0.0, 0.0));
        }
        for x in 0..5 {
            vertices.push(Point3::new(x as f64, 1.0, 0.0));
        }
        let mut faces = Vec::new();
        for x in 0..4 {
            faces.push([x, x + 1, x + 6]);
            faces.push([x, x + 6, x + 5]);
        }
        // Pin the midpoint of the bottom rim.
        let pinned = Point3::new(2.0, 0.0, 0.0);
        let mut mesh = build_with_tags(&vertices, &faces, &[(2, 1)]).unwrap();

        let options = DecimateOptions::new().with_max_triangles(2);
        qem_decimate(&mut mesh, options).unwrap();

        assert!(mesh
            .vertex_ids()
            .any(|v| (mesh.position(v) - pinned).norm() < 1e-12));
        assert!(mesh.check_consistency());
    }

    #[test]
    fn test_swap_pass_keeps_mesh_consistent() {
        let mut mesh = flat_strip();
        let options = DecimateOptions::new()
            .with_max_triangles(4)
            .with_swap(true);
        let stats = qem_decimate(&mut mesh, options).unwrap();

        assert!(mesh.active_triangles() <= 4);
        assert!(stats.contracted > 0);
        assert!(mesh.check_consistency());
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let mut mesh = flat_strip();
        let options = DecimateOptions::new().with_size(0.1);
        let mut decimater = Decimater::new(&mut mesh, options).unwrap();
        decimater.build_quadrics();

        let snapshot = decimater.checkpoint();
        let before = decimater.quadrics[3].value(&Point3::new(0.0, 0.0, 5.0));
        decimater.quadrics[3] = Quadric::new();
        decimater.restore(&snapshot);
        let after = decimater.quadrics[3].value(&Point3::new(0.0, 0.0, 5.0));
        assert_eq!(before, after);
    }

    #[test]
    fn test_shape_quality() {
        // Equilateral triangle has quality 1.
        let q = shape_quality(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.5, 3.0_f64.sqrt() / 2.0, 0.0),
        );
        assert!((q - 1.0).abs() < 1e-12);

        // A degenerate sliver has quality near 0.
        let q = shape_quality(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.5, 1e-9, 0.0),
        );
        assert!(q < 1e-8);
    }
}
