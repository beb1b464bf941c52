use crate::math::{Point3, Vector3};

slotmap::new_key_type! {
    /// Unique identifier for a vertex in a mesh.
    pub struct VertexId;
}

/// A mesh vertex.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of the vertex.
    pub position: Point3,
    /// Insertion-order number, stable for the lifetime of the vertex.
    ///
    /// Serials are dense in `[0, vertex_count)` until a vertex is removed.
    pub serial: u32,
    /// Vertex normal. Holds the running sum while normals are accumulated.
    pub normal: Vector3,
    /// Number of faces that contributed to `normal`.
    pub valence: u32,
}

impl Vertex {
    /// Creates a new vertex at the given point.
    #[must_use]
    pub fn new(position: Point3, serial: u32) -> Self {
        Self {
            position,
            serial,
            normal: Vector3::zeros(),
            valence: 0,
        }
    }

    pub(crate) fn clear_normal(&mut self) {
        self.normal = Vector3::zeros();
        self.valence = 0;
    }

    pub(crate) fn add_face_normal(&mut self, normal: &Vector3) {
        self.normal += normal;
        self.valence += 1;
    }

    /// Normalizes the accumulated normal. A vertex without faces ends up with
    /// the zero vector.
    pub(crate) fn finish_normal(&mut self) {
        self.normal = self
            .normal
            .try_normalize(crate::math::TOLERANCE)
            .unwrap_or_else(Vector3::zeros);
    }
}
