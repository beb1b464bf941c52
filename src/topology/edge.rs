use super::face::FaceId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in a topology mesh.
    pub struct EdgeId;
}

/// Unordered vertex pair identifying an edge.
///
/// The smaller key is always stored first, so `(a, b)` and `(b, a)` compare
/// and hash equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey(VertexId, VertexId);

impl EdgeKey {
    /// Creates the canonical key for the pair `(a, b)`.
    #[must_use]
    pub fn new(a: VertexId, b: VertexId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    /// The two endpoints in canonical order.
    #[must_use]
    pub fn vertices(self) -> (VertexId, VertexId) {
        (self.0, self.1)
    }
}

/// A winged edge: an unordered vertex pair with its incident faces.
///
/// A manifold edge has two faces, a boundary edge one. The edge is deleted as
/// soon as its last face goes away, so `faces` is never empty.
#[derive(Debug, Clone)]
pub struct Edge {
    /// First endpoint (canonical order).
    pub a: VertexId,
    /// Second endpoint (canonical order).
    pub b: VertexId,
    /// Faces sharing this edge.
    pub faces: Vec<FaceId>,
    /// Creation-order number.
    pub serial: u32,
}

impl Edge {
    pub(crate) fn new(key: EdgeKey, serial: u32) -> Self {
        let (a, b) = key.vertices();
        Self {
            a,
            b,
            faces: Vec::with_capacity(2),
            serial,
        }
    }

    /// The canonical key of this edge.
    #[must_use]
    pub fn key(&self) -> EdgeKey {
        EdgeKey::new(self.a, self.b)
    }

    /// The endpoint that is not `vertex`, or `None` if `vertex` is not an
    /// endpoint.
    #[must_use]
    pub fn other(&self, vertex: VertexId) -> Option<VertexId> {
        if vertex == self.a {
            Some(self.b)
        } else if vertex == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// Returns `true` if exactly one face uses this edge.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.faces.len() == 1
    }
}
