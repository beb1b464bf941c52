mod buffers;
mod indexed;

pub use buffers::emission_order;
pub use indexed::IndexedMesh;

use crate::error::Result;
use crate::math::{Aabb, BoundingSphere, Matrix4, Point2, Point3, Vector3};
use crate::topology::{FaceId, TopologyMesh, VertexId};

/// Everything needed to insert one triangle.
#[derive(Debug, Clone, Copy)]
pub struct FaceInput {
    /// Corner positions in winding order.
    pub points: [Point3; 3],
    /// Optional orientation hint. If it disagrees with the winding of
    /// `points`, the first two corners are swapped.
    pub normal: Option<Vector3>,
    /// Optional texture coordinates, one per corner.
    pub uvs: Option<[Point2; 3]>,
}

impl FaceInput {
    /// Creates a face input from three corner positions.
    #[must_use]
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self {
            points: [a, b, c],
            normal: None,
            uvs: None,
        }
    }

    /// Sets the orientation hint.
    #[must_use]
    pub fn with_normal(mut self, normal: Vector3) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Sets per-corner texture coordinates.
    #[must_use]
    pub fn with_uvs(mut self, uvs: [Point2; 3]) -> Self {
        self.uvs = Some(uvs);
        self
    }
}

/// The construction and geometry contract shared by [`IndexedMesh`] and
/// [`TopologyMesh`].
///
/// Collaborators that only push triangles or run geometric queries should be
/// written against this trait so they work with either mesh kind.
pub trait Mesh {
    /// Read access to the vertex and face pools.
    fn indexed(&self) -> &IndexedMesh;

    /// Inserts a triangle. Returns `None` if it was degenerate and dropped.
    fn insert_face(&mut self, input: FaceInput) -> Option<FaceId>;

    /// Removes all vertices, faces and (if present) edges.
    fn clear(&mut self);

    /// Recomputes every face normal from the current vertex positions.
    fn compute_face_normals(&mut self);

    /// Recomputes vertex normals as the normalized sum of adjacent face
    /// normals.
    fn compute_vertex_normals(&mut self);

    /// Applies an affine transform to every vertex.
    ///
    /// Vertex normals are not touched; call
    /// [`compute_vertex_normals`](Mesh::compute_vertex_normals) afterwards if
    /// needed. The position lookup is stale until
    /// [`rebuild_index`](Mesh::rebuild_index) is called.
    fn transform(&mut self, matrix: &Matrix4, update_face_normals: bool);

    /// Moves a single vertex. Leaves the position lookup stale.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not part of this mesh.
    fn set_vertex_position(&mut self, vertex: VertexId, position: Point3) -> Result<()>;

    /// Reverses the winding of every face.
    fn flip_vertex_order(&mut self);

    /// Rebuilds the lookup tables after vertices were moved.
    fn rebuild_index(&mut self);

    /// The winged-edge view of this mesh, if it has one.
    fn topology(&self) -> Option<&TopologyMesh> {
        None
    }

    /// Mutable winged-edge view of this mesh, if it has one.
    fn topology_mut(&mut self) -> Option<&mut TopologyMesh> {
        None
    }

    /// Inserts a triangle from three corner positions.
    fn add_face(&mut self, a: Point3, b: Point3, c: Point3) -> Option<FaceId> {
        self.insert_face(FaceInput::new(a, b, c))
    }

    /// Copies every face of `other` into this mesh, using the source face
    /// normals as orientation hints.
    fn add_mesh(&mut self, other: &IndexedMesh) {
        let inputs: Vec<FaceInput> = other
            .faces()
            .filter_map(|(id, face)| {
                let points = other.face_positions(id).ok()?;
                Some(FaceInput {
                    points,
                    normal: Some(face.normal),
                    uvs: face.uvs,
                })
            })
            .collect();
        for input in inputs {
            self.insert_face(input);
        }
    }

    /// Number of vertices.
    fn vertex_count(&self) -> usize {
        self.indexed().vertex_count()
    }

    /// Number of faces.
    fn face_count(&self) -> usize {
        self.indexed().face_count()
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty mesh.
    fn bounding_box(&self) -> Option<Aabb> {
        self.indexed().bounding_box()
    }

    /// Sphere around the vertex centroid, `None` for an empty mesh.
    fn bounding_sphere(&self) -> Option<BoundingSphere> {
        self.indexed().bounding_sphere()
    }

    /// Translates the mesh so its bounding-box center sits at `origin`
    /// (world origin if `None`). Returns the new bounding box.
    fn center(&mut self, origin: Option<Point3>) -> Option<Aabb> {
        let current = self.bounding_box()?.center();
        let target = origin.unwrap_or_else(Point3::origin);
        self.translate(&(target - current));
        self.bounding_box()
    }

    /// Moves every vertex by `offset`.
    fn translate(&mut self, offset: &Vector3) {
        self.transform(&Matrix4::new_translation(offset), false);
    }

    /// Scales every vertex about the world origin.
    fn scale(&mut self, factor: f64) {
        self.transform(&Matrix4::new_scaling(factor), false);
    }

    /// Rotates every vertex about `axis` through the world origin by `angle`
    /// radians, updating face normals.
    fn rotate(&mut self, axis: &Vector3, angle: f64) {
        let Some(axis) = nalgebra::Unit::try_new(*axis, crate::math::TOLERANCE) else {
            return;
        };
        let rotation = nalgebra::Rotation3::from_axis_angle(&axis, angle);
        self.transform(&rotation.to_homogeneous(), true);
    }
}
