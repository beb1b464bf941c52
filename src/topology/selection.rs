use std::collections::HashSet;

use crate::math::Aabb;
use crate::mesh::IndexedMesh;

use super::{TopologyMesh, VertexId};

/// A set of vertices that an operation (e.g. smoothing) is restricted to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexSelection {
    vertices: HashSet<VertexId>,
}

impl VertexSelection {
    /// An empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection of the given vertex ids.
    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = VertexId>) -> Self {
        ids.into_iter().collect()
    }

    /// Every vertex of the mesh.
    #[must_use]
    pub fn all(mesh: &IndexedMesh) -> Self {
        mesh.vertices().map(|(id, _)| id).collect()
    }

    /// Vertices inside or on `aabb`.
    #[must_use]
    pub fn within_box(mesh: &IndexedMesh, aabb: &Aabb) -> Self {
        mesh.vertices()
            .filter(|(_, v)| aabb.contains(&v.position))
            .map(|(id, _)| id)
            .collect()
    }

    /// Vertices not touching any boundary edge.
    #[must_use]
    pub fn interior(mesh: &TopologyMesh) -> Self {
        mesh.vertices()
            .map(|(id, _)| id)
            .filter(|&id| !mesh.is_boundary_vertex(id))
            .collect()
    }

    /// Adds the neighbours of every selected vertex.
    pub fn grow(&mut self, mesh: &TopologyMesh) {
        let added: Vec<VertexId> = self
            .vertices
            .iter()
            .flat_map(|&v| mesh.neighbors(v))
            .collect();
        self.vertices.extend(added);
    }

    /// Replaces the selection by every vertex of `mesh` not currently selected.
    pub fn invert(&mut self, mesh: &IndexedMesh) {
        self.vertices = mesh
            .vertices()
            .map(|(id, _)| id)
            .filter(|id| !self.vertices.contains(id))
            .collect();
    }

    /// Drops vertices that are no longer part of `mesh`.
    pub fn retain_existing(&mut self, mesh: &IndexedMesh) {
        self.vertices.retain(|&id| mesh.vertex(id).is_ok());
    }

    pub fn insert(&mut self, vertex: VertexId) -> bool {
        self.vertices.insert(vertex)
    }

    pub fn remove(&mut self, vertex: VertexId) -> bool {
        self.vertices.remove(&vertex)
    }

    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.iter().copied()
    }
}

impl FromIterator<VertexId> for VertexSelection {
    fn from_iter<I: IntoIterator<Item = VertexId>>(iter: I) -> Self {
        Self {
            vertices: iter.into_iter().collect(),
        }
    }
}

impl Extend<VertexId> for VertexSelection {
    fn extend<I: IntoIterator<Item = VertexId>>(&mut self, iter: I) {
        self.vertices.extend(iter);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    /// A 3x3 vertex grid; only the center vertex is interior.
    fn grid() -> TopologyMesh {
        let mut mesh = TopologyMesh::new();
        for i in 0..2 {
            for j in 0..2 {
                let (x, y) = (f64::from(i), f64::from(j));
                mesh.add_face(p(x, y, 0.0), p(x + 1.0, y, 0.0), p(x + 1.0, y + 1.0, 0.0));
                mesh.add_face(p(x, y, 0.0), p(x + 1.0, y + 1.0, 0.0), p(x, y + 1.0, 0.0));
            }
        }
        mesh
    }

    #[test]
    fn interior_of_grid_is_center() {
        let mesh = grid();
        let interior = VertexSelection::interior(&mesh);
        assert_eq!(interior.len(), 1);
        let center = mesh.vertex_at(&p(1.0, 1.0, 0.0)).unwrap();
        assert!(interior.contains(center));
    }

    #[test]
    fn grow_and_invert() {
        let mesh = grid();
        let mut selection = VertexSelection::interior(&mesh);
        selection.grow(&mesh);
        // The two corners off the diagonals are not neighbours of the center.
        assert_eq!(selection.len(), 7);

        selection.invert(&mesh);
        assert_eq!(selection.len(), 2);
        assert!(selection.contains(mesh.vertex_at(&p(2.0, 0.0, 0.0)).unwrap()));
    }

    #[test]
    fn box_selection() {
        let mesh = grid();
        let aabb = Aabb::new(p(-0.5, -0.5, -1.0), p(1.5, 0.5, 1.0));
        let selection = VertexSelection::within_box(&mesh, &aabb);
        assert_eq!(selection.len(), 2);
        assert_eq!(VertexSelection::all(&mesh).len(), 9);
    }
}
