//! Half-edge triangle mesh: storage, navigation, local operators and
//! construction from face-vertex lists.

mod builder;
mod halfedge;
mod index;
mod ops;

pub use builder::{build_from_triangles, build_with_tags, to_face_vertex};
pub use halfedge::{Adjacency, EdgeAttributes, HalfEdgeMesh, OriginLoopIter, Triangle, Vertex};
pub use index::{HalfEdgeId, TriangleId, VertexId};
