//! Mesh construction utilities.
//!
//! This module builds half-edge meshes from face-vertex lists and converts
//! them back. Construction validates the input, links symmetric half-edges
//! through a directed-edge map, and closes the surface with a sentinel
//! outer shell: every boundary edge gets an outer triangle whose apex is a
//! reserved outer vertex, and outer triangles are glued side to side along
//! boundary loops so that fan traversal never falls off the mesh.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Adjacency, EdgeAttributes, HalfEdgeMesh, Triangle, Vertex};
use super::index::{HalfEdgeId, TriangleId, VertexId};
use crate::error::{Error, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangles, each as `[v0, v1, v2]` indices,
///   counter-clockwise
///
/// # Example
/// ```
/// use whittle::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.active_triangles(), 1);
/// ```
pub fn build_from_triangles(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh> {
    build_with_tags(vertices, faces, &[])
}

/// Build a half-edge mesh, carrying constraint tags on some vertices.
///
/// `tags` is a list of `(vertex index, tag)` pairs; tagged vertices keep
/// their identity and position through decimation. A tag of `0` means
/// unconstrained.
pub fn build_with_tags(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
    tags: &[(usize, i32)],
) -> Result<HalfEdgeMesh> {
    if faces.is_empty() {
        return Err(Error::EmptyMesh);
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(Error::InvalidVertexIndex {
                    triangle: fi,
                    vertex: vi,
                });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(Error::DegenerateTriangle { triangle: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::new();
    for &pos in vertices {
        mesh.vertices.push(Vertex::new(pos));
        mesh.vertex_alive.push(true);
    }
    for &(vi, tag) in tags {
        if vi >= vertices.len() {
            return Err(Error::InvalidVertexIndex {
                triangle: usize::MAX,
                vertex: vi,
            });
        }
        mesh.vertices[vi].ref_tag = tag;
    }

    for face in faces {
        let tri = Triangle::new([
            VertexId::new(face[0]),
            VertexId::new(face[1]),
            VertexId::new(face[2]),
        ]);
        mesh.triangles.push(tri);
        mesh.triangle_alive.push(true);
    }
    mesh.active_triangles = faces.len();

    // Group half-edges by undirected edge.
    let mut edge_map: HashMap<(usize, usize), Vec<HalfEdgeId>> = HashMap::new();
    for ti in 0..faces.len() {
        let t = TriangleId::new(ti);
        for local in 0..3 {
            let e = HalfEdgeId::from_parts(t, local);
            let o = mesh.origin(e).index();
            let d = mesh.dest(e).index();
            edge_map.entry((o.min(d), o.max(d))).or_default().push(e);
        }
    }

    let mut boundary: Vec<HalfEdgeId> = Vec::new();
    for halves in edge_map.values() {
        match halves.as_slice() {
            [a, b] if mesh.origin(*a) == mesh.dest(*b) => mesh.glue(*a, *b),
            [a] => boundary.push(*a),
            _ => {
                // Three or more incident triangles, or two with the same
                // orientation: link the halves into a cyclic ring.
                let mut ring = halves.clone();
                ring.sort();
                for &h in &ring {
                    mesh.triangle_mut(h.triangle()).adjacency[h.local()] =
                        Adjacency::Ring(ring.clone());
                    mesh.set_attributes(h, EdgeAttributes::NONMANIFOLD);
                }
            }
        }
    }

    if !boundary.is_empty() {
        build_outer_shell(&mut mesh, &boundary)?;
    }

    // Vertex links point at an originating half-edge of a real triangle.
    for ti in (0..faces.len()).rev() {
        let t = TriangleId::new(ti);
        for local in 0..3 {
            let e = HalfEdgeId::from_parts(t, local);
            let v = mesh.origin(e);
            mesh.vertex_mut(v).link = e;
        }
    }

    debug_assert!(mesh.check_consistency());
    Ok(mesh)
}

/// Close the surface with one outer triangle per boundary half-edge and
/// glue the outer triangles together along boundary loops.
///
/// Fails when the boundary edges around some vertex all point the same
/// way, which happens when two faces share an edge with the same winding.
fn build_outer_shell(mesh: &mut HalfEdgeMesh, boundary: &[HalfEdgeId]) -> Result<()> {
    let outer = VertexId::new(mesh.vertices.len());
    let mut sentinel = Vertex::new(Point3::origin());
    sentinel.readable = false;
    sentinel.writable = false;
    mesh.vertices.push(sentinel);
    mesh.vertex_alive.push(true);
    mesh.outer_vertex = outer;

    // For the real half-edge o -> d, the outer triangle is [outer, d, o]:
    // its edge 0 runs d -> o (the symmetric of the real edge), edge 1 runs
    // o -> outer and edge 2 runs outer -> d.
    let mut into_sentinel: HashMap<usize, Vec<HalfEdgeId>> = HashMap::new();
    let mut out_of_sentinel: HashMap<usize, Vec<HalfEdgeId>> = HashMap::new();

    for &e in boundary {
        let o = mesh.origin(e);
        let d = mesh.dest(e);

        let t = TriangleId::new(mesh.triangles.len());
        let mut tri = Triangle::new([outer, d, o]);
        tri.outer = true;
        tri.writable = false;
        tri.attributes[0] = EdgeAttributes::OUTER | EdgeAttributes::BOUNDARY;
        tri.attributes[1] = EdgeAttributes::OUTER;
        tri.attributes[2] = EdgeAttributes::OUTER;
        mesh.triangles.push(tri);
        mesh.triangle_alive.push(true);

        let sym = HalfEdgeId::from_parts(t, 0);
        mesh.glue(e, sym);
        mesh.set_attributes(e, EdgeAttributes::BOUNDARY);

        into_sentinel
            .entry(o.index())
            .or_default()
            .push(HalfEdgeId::from_parts(t, 1));
        out_of_sentinel
            .entry(d.index())
            .or_default()
            .push(HalfEdgeId::from_parts(t, 2));

        if !mesh.vertex(outer).link.is_valid() {
            mesh.vertex_mut(outer).link = HalfEdgeId::from_parts(t, 2);
        }
    }

    // Consecutive boundary edges a -> x and x -> b share the vertex x; the
    // side edge (outer -> x) of the first outer triangle is glued to the
    // side edge (x -> outer) of the second. A vertex with side edges in
    // only one direction has no consistent loop through it.
    for &x in into_sentinel.keys() {
        if !out_of_sentinel.contains_key(&x) {
            return Err(Error::InconsistentOrientation { vertex: x });
        }
    }
    for (&x, outs) in &out_of_sentinel {
        let Some(ins) = into_sentinel.get(&x) else {
            return Err(Error::InconsistentOrientation { vertex: x });
        };
        match (outs.as_slice(), ins.as_slice()) {
            (&[o], &[i]) => mesh.glue(o, i),
            _ => {
                // Several boundary loops meet at this vertex.
                let mut ring: Vec<HalfEdgeId> = outs.iter().chain(ins.iter()).copied().collect();
                ring.sort();
                for &h in &ring {
                    mesh.triangle_mut(h.triangle()).adjacency[h.local()] =
                        Adjacency::Ring(ring.clone());
                    mesh.set_attributes(h, EdgeAttributes::NONMANIFOLD);
                }
            }
        }
    }

    Ok(())
}

/// Convert a half-edge mesh back to a face-vertex representation,
/// compacting away dead vertices and the outer shell.
///
/// Returns a `(vertices, faces)` tuple.
pub fn to_face_vertex(mesh: &HalfEdgeMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let mut vertices = Vec::new();
    for v in mesh.vertex_ids() {
        remap.insert(v.index(), vertices.len());
        vertices.push(*mesh.position(v));
    }

    let faces: Vec<[usize; 3]> = mesh
        .triangle_ids()
        .map(|t| {
            let [v0, v1, v2] = mesh.triangle(t).vertices;
            [
                remap[&v0.index()],
                remap[&v1.index()],
                remap[&v2.index()],
            ]
        })
        .collect();

    (vertices, faces)
}
