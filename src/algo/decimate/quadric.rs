//! Error quadrics and contraction placement.
//!
//! A quadric accumulates squared distances to a set of planes as the form
//! `q(p) = p'Ap + 2b.p + c`. Each vertex starts with the planes of its
//! incident triangles, boundary and non-manifold edges add reinforcement
//! planes, and contracting an edge merges the endpoint quadrics by an
//! area-weighted convex combination rather than a plain sum, which keeps
//! the error measure commensurable across vertices supporting different
//! amounts of surface.

use nalgebra::{Matrix3, Point3, Vector3};

/// Error quadric of a vertex.
#[derive(Debug, Clone, Default)]
pub struct Quadric {
    a: Matrix3<f64>,
    b: Vector3<f64>,
    c: f64,
    /// Total surface area supporting this quadric. Strictly positive for
    /// any vertex with a live incident triangle.
    pub area: f64,
}

impl Quadric {
    /// A zero quadric supported by no surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate the plane `direction . p + d = 0`.
    ///
    /// `direction` is the unit normal for triangle planes; reinforcement
    /// planes pass an unnormalized vector whose length carries their
    /// weight, with no area contribution.
    pub fn add_plane(&mut self, direction: &Vector3<f64>, d: f64, area: f64) {
        self.a += direction * direction.transpose();
        self.b += *direction * d;
        self.c += d * d;
        self.area += area;
    }

    /// Merge two endpoint quadrics by area-weighted convex combination.
    pub fn merged(q1: &Quadric, q2: &Quadric) -> Quadric {
        debug_assert!(q1.area > 0.0);
        debug_assert!(q2.area > 0.0);
        let total = q1.area + q2.area;
        let l1 = q1.area / total;
        let l2 = q2.area / total;
        Quadric {
            a: q1.a * l1 + q2.a * l2,
            b: q1.b * l1 + q2.b * l2,
            c: q1.c * l1 + q2.c * l2,
            area: total,
        }
    }

    /// Evaluate the quadric at a point.
    pub fn value(&self, p: &Point3<f64>) -> f64 {
        let v = p.coords;
        (self.a * v).dot(&v) + 2.0 * self.b.dot(&v) + self.c
    }
}

/// Where a contraction places the merged vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// The cheaper of the two endpoints.
    Vertex,
    /// The edge midpoint.
    Middle,
    /// The minimizer of the merged quadric along the edge segment.
    #[default]
    Edge,
    /// The unconstrained minimizer of the merged quadric, when defined.
    Optimal,
}

impl Placement {
    /// Parse a placement name as accepted by the option map.
    pub fn parse(s: &str) -> Option<Placement> {
        match s.to_ascii_uppercase().as_str() {
            "VERTEX" => Some(Placement::Vertex),
            "MIDDLE" => Some(Placement::Middle),
            "EDGE" => Some(Placement::Edge),
            "OPTIMAL" => Some(Placement::Optimal),
            _ => None,
        }
    }
}

/// Which endpoint keeps its identity through a contraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keep {
    /// The edge origin survives.
    V1,
    /// The edge destination survives.
    V2,
}

/// The endpoint with the smaller summed error, ties favoring the first.
fn cheaper_endpoint(
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    q1: &Quadric,
    q2: &Quadric,
) -> (Point3<f64>, Keep) {
    if q1.value(p2) + q2.value(p2) < q1.value(p1) + q2.value(p1) {
        (*p2, Keep::V2)
    } else {
        (*p1, Keep::V1)
    }
}

/// Compute the position of the merged vertex and which endpoint survives.
///
/// `ref1`/`ref2` flag constrained endpoints. A constrained endpoint keeps
/// its identity; with both constrained the placement degrades to the
/// cheaper endpoint so that the result coincides with one of them. A
/// single constrained endpoint also pins the position, except under
/// [`Placement::Middle`] which still moves it to the midpoint.
///
/// `Optimal` falls back to `Edge` when the merged matrix is singular, and
/// `Edge` falls back to the cheaper endpoint when the quadric is flat
/// along the edge direction.
pub fn optimal_placement(
    strategy: Placement,
    p1: &Point3<f64>,
    p2: &Point3<f64>,
    ref1: bool,
    ref2: bool,
    q1: &Quadric,
    q2: &Quadric,
    merged: &Quadric,
) -> (Point3<f64>, Keep) {
    if ref1 && ref2 {
        return cheaper_endpoint(p1, p2, q1, q2);
    }
    let midpoint = Point3::from((p1.coords + p2.coords) * 0.5);
    if ref1 != ref2 {
        let keep = if ref1 { Keep::V1 } else { Keep::V2 };
        return match strategy {
            Placement::Middle => (midpoint, keep),
            _ => (if ref1 { *p1 } else { *p2 }, keep),
        };
    }

    match strategy {
        Placement::Vertex => cheaper_endpoint(p1, p2, q1, q2),
        Placement::Middle => (midpoint, Keep::V2),
        Placement::Edge | Placement::Optimal => {
            if strategy == Placement::Optimal {
                if let Some(inv) = merged.a.try_inverse() {
                    return (Point3::from(-(inv * merged.b)), Keep::V2);
                }
            }
            // Minimize along the segment p1 + s (p2 - p1).
            let dv = p2 - p1;
            let num = merged.b.dot(&dv) + (merged.a * p1.coords).dot(&dv);
            let den = (merged.a * dv).dot(&dv);
            if den > 1.0e-20 * num.abs() {
                let s = (-num / den).clamp(0.0, 1.0);
                (p1 + dv * s, Keep::V2)
            } else {
                cheaper_endpoint(p1, p2, q1, q2)
            }
        }
    }
}
