use crate::math::{ray_triangle_intersect, Aabb, Point3, Ray, Vector3};
use crate::mesh::Mesh;

/// The closest intersection of a ray with a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Intersection point.
    pub point: Point3,
    /// Distance from the ray origin along its (unit) direction.
    pub distance: f64,
    /// Normal of the face that was hit.
    pub normal: Vector3,
    /// Direction of the incoming ray.
    pub incoming: Vector3,
}

#[derive(Debug, Clone, Copy)]
struct Triangle {
    corners: [Point3; 3],
    normal: Vector3,
}

/// Ray queries against a snapshot of a mesh's faces.
///
/// The snapshot is taken by [`new`](Self::new) and [`set_mesh`](Self::set_mesh);
/// later edits to the mesh are not seen. Queries are a bounding-box reject
/// followed by a test of every triangle.
#[derive(Debug, Clone, Default)]
pub struct MeshIntersector {
    triangles: Vec<Triangle>,
    bounds: Option<Aabb>,
}

impl MeshIntersector {
    /// Creates a new intersector over the faces of `mesh`.
    #[must_use]
    pub fn new<M: Mesh + ?Sized>(mesh: &M) -> Self {
        let mut intersector = Self::default();
        intersector.set_mesh(mesh);
        intersector
    }

    /// Replaces the snapshot with the faces of `mesh`.
    pub fn set_mesh<M: Mesh + ?Sized>(&mut self, mesh: &M) {
        let indexed = mesh.indexed();
        self.triangles = indexed
            .faces()
            .filter_map(|(id, face)| {
                Some(Triangle {
                    corners: indexed.face_positions(id).ok()?,
                    normal: face.normal,
                })
            })
            .collect();
        self.bounds = mesh.bounding_box();
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Bounding box of the snapshot, `None` for an empty mesh.
    #[must_use]
    pub fn bounds(&self) -> Option<&Aabb> {
        self.bounds.as_ref()
    }

    /// Returns the nearest hit in front of the ray origin, if any.
    #[must_use]
    pub fn intersects_ray(&self, ray: &Ray) -> Option<RayHit> {
        if !self.bounds.as_ref()?.intersects_ray(ray) {
            return None;
        }

        let (distance, triangle) = self
            .triangles
            .iter()
            .filter_map(|tri| {
                let [a, b, c] = &tri.corners;
                ray_triangle_intersect(ray, a, b, c).map(|t| (t, tri))
            })
            .min_by(|l, r| l.0.total_cmp(&r.0))?;

        Some(RayHit {
            point: ray.point_at(distance),
            distance,
            normal: triangle.normal,
            incoming: ray.direction,
        })
    }
}
