use std::cmp::Ordering;

use crate::error::Result;
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::topology::{EdgeId, TopologyMesh};

/// Decides where an edge is split and in which order edges are visited.
///
/// Implementations must return the split points ordered from the edge's
/// first endpoint (`edge.a`) towards its second (`edge.b`).
pub trait SubdivisionStrategy {
    /// Points to insert along `edge`, ordered from `a` to `b`.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or its endpoints are missing.
    fn split_points(&self, mesh: &TopologyMesh, edge: EdgeId) -> Result<Vec<Point3>>;

    /// Processing order of two edges in a subdivision pass.
    fn edge_order(&self, mesh: &TopologyMesh, a: EdgeId, b: EdgeId) -> Ordering {
        EdgeOrder::LongestFirst.compare(mesh, a, b)
    }
}

/// Predefined edge orderings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeOrder {
    /// Longest edge first (by squared length).
    #[default]
    LongestFirst,
    /// Shortest edge first.
    ShortestFirst,
    /// Boundary edges before manifold ones, longest first within a group.
    FewestFacesFirst,
}

impl EdgeOrder {
    /// Compares two edges. Edges that no longer exist sort as zero-length.
    #[must_use]
    pub fn compare(self, mesh: &TopologyMesh, a: EdgeId, b: EdgeId) -> Ordering {
        let len = |e| mesh.edge_length_squared(e).unwrap_or(0.0);
        match self {
            Self::LongestFirst => len(b).total_cmp(&len(a)),
            Self::ShortestFirst => len(a).total_cmp(&len(b)),
            Self::FewestFacesFirst => {
                let faces = |e| mesh.edge(e).map_or(0, |edge| edge.faces.len());
                faces(a)
                    .cmp(&faces(b))
                    .then_with(|| len(b).total_cmp(&len(a)))
            }
        }
    }
}

fn endpoints(mesh: &TopologyMesh, edge: EdgeId) -> Result<(Point3, Point3)> {
    let e = mesh.edge(edge)?;
    Ok((mesh.position(e.a)?, mesh.position(e.b)?))
}

/// Pushes `point` away from `centroid` by `distance`.
fn displace_from(point: Point3, centroid: &Point3, distance: f64) -> Point3 {
    let dir = (point - centroid)
        .try_normalize(TOLERANCE)
        .unwrap_or_else(Vector3::zeros);
    point + dir * distance
}

/// Splits every edge at its midpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct Midpoint {
    pub order: EdgeOrder,
}

impl SubdivisionStrategy for Midpoint {
    fn split_points(&self, mesh: &TopologyMesh, edge: EdgeId) -> Result<Vec<Point3>> {
        let (a, b) = endpoints(mesh, edge)?;
        Ok(vec![nalgebra::center(&a, &b)])
    }

    fn edge_order(&self, mesh: &TopologyMesh, a: EdgeId, b: EdgeId) -> Ordering {
        self.order.compare(mesh, a, b)
    }
}

/// Splits at the midpoint, then pushes the new point away from a reference
/// centroid by `amplitude` times the edge length.
///
/// Repeated passes give rough, rock-like surfaces.
#[derive(Debug, Clone, Copy)]
pub struct MidpointDisplacement {
    pub centroid: Point3,
    pub amplitude: f64,
    pub order: EdgeOrder,
}

impl MidpointDisplacement {
    #[must_use]
    pub fn new(centroid: Point3, amplitude: f64) -> Self {
        Self {
            centroid,
            amplitude,
            order: EdgeOrder::default(),
        }
    }
}

impl SubdivisionStrategy for MidpointDisplacement {
    fn split_points(&self, mesh: &TopologyMesh, edge: EdgeId) -> Result<Vec<Point3>> {
        let (a, b) = endpoints(mesh, edge)?;
        let length = nalgebra::distance(&a, &b);
        let mid = nalgebra::center(&a, &b);
        Ok(vec![displace_from(mid, &self.centroid, self.amplitude * length)])
    }

    fn edge_order(&self, mesh: &TopologyMesh, a: EdgeId, b: EdgeId) -> Ordering {
        self.order.compare(mesh, a, b)
    }
}

/// Radial displacement applied by [`Dual`] to its two split points.
#[derive(Debug, Clone, Copy)]
pub struct DualDisplacement {
    pub centroid: Point3,
    /// Amplitude for the point at one third.
    pub amp_a: f64,
    /// Amplitude for the point at two thirds.
    pub amp_b: f64,
}

/// Splits every edge in three, at `t = 1/3` and `t = 2/3`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dual {
    pub displacement: Option<DualDisplacement>,
    pub order: EdgeOrder,
}

impl Dual {
    /// Dual split with both points displaced away from `centroid`.
    #[must_use]
    pub fn displaced(centroid: Point3, amp_a: f64, amp_b: f64) -> Self {
        Self {
            displacement: Some(DualDisplacement {
                centroid,
                amp_a,
                amp_b,
            }),
            order: EdgeOrder::default(),
        }
    }
}

impl SubdivisionStrategy for Dual {
    fn split_points(&self, mesh: &TopologyMesh, edge: EdgeId) -> Result<Vec<Point3>> {
        let (a, b) = endpoints(mesh, edge)?;
        let first = a + (b - a) / 3.0;
        let second = a + (b - a) * (2.0 / 3.0);
        let Some(d) = self.displacement else {
            return Ok(vec![first, second]);
        };
        let length = nalgebra::distance(&a, &b);
        Ok(vec![
            displace_from(first, &d.centroid, d.amp_a * length),
            displace_from(second, &d.centroid, d.amp_b * length),
        ])
    }

    fn edge_order(&self, mesh: &TopologyMesh, a: EdgeId, b: EdgeId) -> Ordering {
        self.order.compare(mesh, a, b)
    }
}

/// Splits every edge in four, at `t = 1/4, 1/2, 3/4`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tri {
    pub order: EdgeOrder,
}

impl SubdivisionStrategy for Tri {
    fn split_points(&self, mesh: &TopologyMesh, edge: EdgeId) -> Result<Vec<Point3>> {
        let (a, b) = endpoints(mesh, edge)?;
        Ok([0.25, 0.5, 0.75].iter().map(|&t| a + (b - a) * t).collect())
    }

    fn edge_order(&self, mesh: &TopologyMesh, a: EdgeId, b: EdgeId) -> Ordering {
        self.order.compare(mesh, a, b)
    }
}

/// Splits at the midpoint and moves the point along the averaged normal of
/// the edge's faces by `amplitude` times the edge length.
#[derive(Debug, Clone, Copy)]
pub struct NormalDisplacement {
    pub amplitude: f64,
    pub order: EdgeOrder,
}

impl NormalDisplacement {
    #[must_use]
    pub fn new(amplitude: f64) -> Self {
        Self {
            amplitude,
            order: EdgeOrder::default(),
        }
    }
}

impl SubdivisionStrategy for NormalDisplacement {
    fn split_points(&self, mesh: &TopologyMesh, edge: EdgeId) -> Result<Vec<Point3>> {
        let (a, b) = endpoints(mesh, edge)?;
        let mut normal = Vector3::zeros();
        for &face in &mesh.edge(edge)?.faces {
            normal += mesh.face(face)?.normal;
        }
        let normal = normal.try_normalize(TOLERANCE).unwrap_or_else(Vector3::zeros);
        let length = nalgebra::distance(&a, &b);
        Ok(vec![nalgebra::center(&a, &b) + normal * (self.amplitude * length)])
    }

    fn edge_order(&self, mesh: &TopologyMesh, a: EdgeId, b: EdgeId) -> Ordering {
        self.order.compare(mesh, a, b)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// A right triangle with legs 3 and 4; returns the mesh and its edges
    /// keyed by length.
    fn triangle() -> (TopologyMesh, EdgeId, EdgeId, EdgeId) {
        let mut mesh = TopologyMesh::new();
        mesh.add_face(p(0.0, 0.0, 0.0), p(3.0, 0.0, 0.0), p(0.0, 4.0, 0.0));
        let id = |mesh: &TopologyMesh, a: Point3, b: Point3| {
            mesh.edge_between(mesh.vertex_at(&a).unwrap(), mesh.vertex_at(&b).unwrap())
                .unwrap()
        };
        let short = id(&mesh, p(0.0, 0.0, 0.0), p(3.0, 0.0, 0.0));
        let mid = id(&mesh, p(0.0, 0.0, 0.0), p(0.0, 4.0, 0.0));
        let long = id(&mesh, p(3.0, 0.0, 0.0), p(0.0, 4.0, 0.0));
        (mesh, short, mid, long)
    }

    fn sorted(mesh: &TopologyMesh, strategy: &dyn SubdivisionStrategy) -> Vec<EdgeId> {
        let mut edges: Vec<EdgeId> = mesh.edges().map(|(id, _)| id).collect();
        edges.sort_by(|&a, &b| strategy.edge_order(mesh, a, b));
        edges
    }

    #[test]
    fn default_order_is_longest_first() {
        let (mesh, short, mid, long) = triangle();
        assert_eq!(sorted(&mesh, &Midpoint::default()), vec![long, mid, short]);
    }

    #[test]
    fn shortest_first_order() {
        let (mesh, short, mid, long) = triangle();
        let strategy = Tri {
            order: EdgeOrder::ShortestFirst,
        };
        assert_eq!(sorted(&mesh, &strategy), vec![short, mid, long]);
    }

    #[test]
    fn split_point_counts_and_positions() {
        let (mesh, short, _, _) = triangle();
        let edge = mesh.edge(short).unwrap();
        let a = mesh.position(edge.a).unwrap();
        let b = mesh.position(edge.b).unwrap();

        let mid = Midpoint::default().split_points(&mesh, short).unwrap();
        assert_eq!(mid.len(), 1);
        assert_relative_eq!(mid[0], p(1.5, 0.0, 0.0));

        let dual = Dual::default().split_points(&mesh, short).unwrap();
        assert_eq!(dual.len(), 2);
        assert_relative_eq!(dual[0], a + (b - a) / 3.0);
        assert_relative_eq!(dual[1], a + (b - a) * (2.0 / 3.0));

        let tri = Tri::default().split_points(&mesh, short).unwrap();
        assert_eq!(tri.len(), 3);
        assert_relative_eq!(tri[1], p(1.5, 0.0, 0.0));
        assert_relative_eq!(tri[0], a + (b - a) * 0.25);
    }

    #[test]
    fn midpoint_displacement_moves_away_from_centroid() {
        let (mesh, short, _, _) = triangle();
        let strategy = MidpointDisplacement::new(p(1.5, 1.0, 0.0), 0.5);
        let pts = strategy.split_points(&mesh, short).unwrap();
        // Edge of length 3, midpoint (1.5, 0, 0), pushed along -y by 1.5.
        assert_relative_eq!(pts[0], p(1.5, -1.5, 0.0));
    }

    #[test]
    fn dual_displacement_uses_both_amplitudes() {
        let (mesh, short, _, _) = triangle();
        let strategy = Dual::displaced(p(1.5, 1.0, 0.0), 0.0, 1.0);
        let pts = strategy.split_points(&mesh, short).unwrap();
        let plain = Dual::default().split_points(&mesh, short).unwrap();
        assert_relative_eq!(pts[0], plain[0]);
        assert!((pts[1] - plain[1]).norm() > 2.9);
    }

    #[test]
    fn normal_displacement_follows_face_normal() {
        let (mesh, short, _, _) = triangle();
        let pts = NormalDisplacement::new(1.0).split_points(&mesh, short).unwrap();
        assert_relative_eq!(pts[0], p(1.5, 0.0, 3.0));
    }
}
