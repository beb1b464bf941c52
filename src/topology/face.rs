use crate::math::{Point2, Vector3};

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a face in a mesh.
    pub struct FaceId;
}

/// A triangle referencing three distinct vertices.
///
/// The winding is anti-clockwise when seen from the side `normal` points to.
#[derive(Debug, Clone)]
pub struct Face {
    /// The corners `a`, `b`, `c` in winding order.
    pub vertices: [VertexId; 3],
    /// Unit face normal, or zero for a collapsed triangle.
    pub normal: Vector3,
    /// Optional texture coordinates, one per corner.
    pub uvs: Option<[Point2; 3]>,
}

impl Face {
    /// Returns `true` if `vertex` is one of the corners.
    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// The corner that is neither `a` nor `b`, if `(a, b)` is an edge of
    /// this face.
    #[must_use]
    pub fn opposite(&self, a: VertexId, b: VertexId) -> Option<VertexId> {
        if !self.contains(a) || !self.contains(b) {
            return None;
        }
        self.vertices.iter().copied().find(|&v| v != a && v != b)
    }

    /// The three undirected edges as vertex pairs `(a,b)`, `(b,c)`, `(c,a)`.
    #[must_use]
    pub fn edge_pairs(&self) -> [(VertexId, VertexId); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }

    pub(crate) fn flip(&mut self) {
        self.vertices.swap(1, 2);
        if let Some(uvs) = self.uvs.as_mut() {
            uvs.swap(1, 2);
        }
        self.normal = -self.normal;
    }
}
