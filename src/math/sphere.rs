use super::Point3;

/// A sphere enclosing a set of points.
///
/// Produced by [`IndexedMesh::bounding_sphere`](crate::mesh::IndexedMesh::bounding_sphere),
/// which centers it on the vertex centroid. It is therefore not the minimal
/// enclosing sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Point3,
    pub radius: f64,
}

impl BoundingSphere {
    /// Returns `true` if `point` lies inside or on the sphere.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        nalgebra::distance_squared(&self.center, point) <= self.radius * self.radius
    }
}
