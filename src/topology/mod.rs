pub mod edge;
pub mod face;
pub mod selection;
pub mod vertex;

pub use edge::{Edge, EdgeId, EdgeKey};
pub use face::{Face, FaceId};
pub use selection::VertexSelection;
pub use vertex::{Vertex, VertexId};

use std::collections::HashMap;
use std::ops::Deref;

use slotmap::{SecondaryMap, SlotMap};
use tracing::{trace, warn};

use crate::error::{Result, TopologyError};
use crate::math::{Matrix4, Point3, Vector3};
use crate::mesh::{FaceInput, IndexedMesh, Mesh};

/// An [`IndexedMesh`] extended with winged-edge adjacency.
///
/// Every face registers its three undirected edges; every edge records the
/// faces using it and is registered on both endpoint vertices. Removing a
/// face cascades: edges left without faces are deleted, and vertices left
/// without edges leave the vertex pool.
///
/// Read access to the underlying vertex and face pools goes through
/// `Deref<Target = IndexedMesh>`. Mutation goes through this type (or the
/// [`Mesh`] trait) so the edge tables stay consistent.
#[derive(Debug, Clone, Default)]
pub struct TopologyMesh {
    mesh: IndexedMesh,
    edges: SlotMap<EdgeId, Edge>,
    edge_index: HashMap<EdgeKey, EdgeId>,
    vertex_edges: SecondaryMap<VertexId, Vec<EdgeId>>,
    next_edge_serial: u32,
}

impl Deref for TopologyMesh {
    type Target = IndexedMesh;

    fn deref(&self) -> &IndexedMesh {
        &self.mesh
    }
}

impl TopologyMesh {
    /// Creates a new, empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty mesh with a name.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            mesh: IndexedMesh::with_name(name),
            ..Self::default()
        }
    }

    /// Builds the edge tables for an existing mesh.
    #[must_use]
    pub fn from_indexed(mesh: &IndexedMesh) -> Self {
        let mut topo = Self::with_name(mesh.name());
        topo.add_mesh(mesh);
        topo
    }

    /// The underlying vertex and face pools.
    #[must_use]
    pub fn as_indexed(&self) -> &IndexedMesh {
        &self.mesh
    }

    /// Drops the edge tables and returns the plain mesh.
    #[must_use]
    pub fn into_indexed(self) -> IndexedMesh {
        self.mesh
    }

    // --- Edge access ---

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns a reference to the edge, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not part of this mesh.
    pub fn edge(&self, id: EdgeId) -> std::result::Result<&Edge, TopologyError> {
        self.edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))
    }

    /// Returns `true` if the edge is still part of the mesh.
    #[must_use]
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    /// Iterates over all edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges.iter()
    }

    /// The edge joining `a` and `b`, in either direction.
    #[must_use]
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_index.get(&EdgeKey::new(a, b)).copied()
    }

    /// Squared distance between the endpoints of an edge.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge or one of its endpoints is missing.
    pub fn edge_length_squared(&self, id: EdgeId) -> std::result::Result<f64, TopologyError> {
        let edge = self.edge(id)?;
        let a = self.mesh.position(edge.a)?;
        let b = self.mesh.position(edge.b)?;
        Ok(nalgebra::distance_squared(&a, &b))
    }

    /// Edges incident to `vertex`. Empty for an unknown vertex.
    #[must_use]
    pub fn edges_of(&self, vertex: VertexId) -> &[EdgeId] {
        self.vertex_edges
            .get(vertex)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The vertices sharing an edge with `vertex`.
    #[must_use]
    pub fn neighbors(&self, vertex: VertexId) -> Vec<VertexId> {
        self.edges_of(vertex)
            .iter()
            .filter_map(|&e| self.edges.get(e)?.other(vertex))
            .collect()
    }

    /// Faces having `vertex` as a corner, each listed once.
    #[must_use]
    pub fn faces_of_vertex(&self, vertex: VertexId) -> Vec<FaceId> {
        let mut faces: Vec<FaceId> = self
            .edges_of(vertex)
            .iter()
            .filter_map(|&e| self.edges.get(e))
            .flat_map(|edge| edge.faces.iter().copied())
            .collect();
        faces.sort_unstable();
        faces.dedup();
        faces
    }

    /// Edges used by exactly one face.
    #[must_use]
    pub fn boundary_edges(&self) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|(_, edge)| edge.is_boundary())
            .map(|(id, _)| id)
            .collect()
    }

    /// Returns `true` if `vertex` lies on a boundary edge.
    #[must_use]
    pub fn is_boundary_vertex(&self, vertex: VertexId) -> bool {
        self.edges_of(vertex)
            .iter()
            .filter_map(|&e| self.edges.get(e))
            .any(Edge::is_boundary)
    }

    // --- Construction ---

    /// Inserts a triangle from three corner positions.
    pub fn add_face(&mut self, a: Point3, b: Point3, c: Point3) -> Option<FaceId> {
        self.insert_face(FaceInput::new(a, b, c))
    }

    /// Inserts a triangle and registers its three edges.
    ///
    /// An edge that already has two faces still accepts a third; such
    /// non-manifold edges are representable, but subdivision and smoothing
    /// assume at most two.
    pub fn insert_face(&mut self, input: FaceInput) -> Option<FaceId> {
        let id = self.mesh.insert_face(input)?;
        self.attach_face(id)
    }

    /// Inserts a triangle over existing vertices and registers its edges.
    ///
    /// Unlike [`insert_face`](Self::insert_face) this does not consult the
    /// position lookup, so it stays correct while the lookup is stale.
    pub(crate) fn insert_face_with_ids(
        &mut self,
        ids: [VertexId; 3],
        hint: Option<Vector3>,
    ) -> Option<FaceId> {
        let id = self.mesh.insert_face_with_ids(ids, hint, None)?;
        self.attach_face(id)
    }

    /// The vertex at `position`, created if there is none.
    pub(crate) fn resolve_vertex(&mut self, position: Point3) -> VertexId {
        self.mesh.resolve_vertex(position)
    }

    fn attach_face(&mut self, id: FaceId) -> Option<FaceId> {
        let pairs = self.mesh.face(id).ok()?.edge_pairs();
        for (a, b) in pairs {
            self.attach_edge(a, b, id);
        }
        Some(id)
    }

    /// Copies every face of `other` into this mesh.
    pub fn add_mesh(&mut self, other: &IndexedMesh) {
        Mesh::add_mesh(self, other);
    }

    fn attach_edge(&mut self, a: VertexId, b: VertexId, face: FaceId) {
        let key = EdgeKey::new(a, b);
        if let Some(edge) = self
            .edge_index
            .get(&key)
            .and_then(|&id| self.edges.get_mut(id))
        {
            edge.faces.push(face);
            return;
        }

        let id = self.edges.insert(Edge::new(key, self.next_edge_serial));
        self.next_edge_serial += 1;
        self.edge_index.insert(key, id);
        for v in [a, b] {
            if let Some(entry) = self.vertex_edges.entry(v) {
                entry.or_default().push(id);
            }
        }
        if let Some(edge) = self.edges.get_mut(id) {
            edge.faces.push(face);
        }
    }

    // --- Removal ---

    /// Removes a face, cascading to edges and vertices it leaves unused.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::EntityNotFound`] for an unknown face and
    /// [`TopologyError::EdgeNotIndexed`] if one of the face's edges is missing
    /// from the edge index. In both cases the mesh is left unchanged.
    pub fn remove_face(&mut self, id: FaceId) -> Result<()> {
        let pairs = self.mesh.face(id)?.edge_pairs();

        let mut edge_ids = [EdgeId::default(); 3];
        for (slot, (a, b)) in edge_ids.iter_mut().zip(pairs) {
            *slot = self
                .edge_between(a, b)
                .filter(|&e| self.edges.contains_key(e))
                .ok_or_else(|| self.edge_not_indexed(a, b))?;
        }

        self.mesh.remove_face_entry(id);
        for edge_id in edge_ids {
            let Some(edge) = self.edges.get_mut(edge_id) else {
                continue;
            };
            edge.faces.retain(|&f| f != id);
            if edge.faces.is_empty() {
                self.drop_edge(edge_id);
            }
        }
        trace!(faces = self.mesh.face_count(), edges = self.edges.len(), "removed face");
        Ok(())
    }

    /// Removes an edge by removing every face that uses it.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is unknown or one of its faces cannot be
    /// removed.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<()> {
        let edge = self.edge(id)?;
        if self.edge_index.get(&edge.key()) != Some(&id) {
            return Err(self.edge_not_indexed(edge.a, edge.b).into());
        }
        for face in edge.faces.clone() {
            self.remove_face(face)?;
        }
        Ok(())
    }

    fn drop_edge(&mut self, id: EdgeId) {
        let Some(edge) = self.edges.remove(id) else {
            return;
        };
        if self.edge_index.get(&edge.key()) == Some(&id) {
            self.edge_index.remove(&edge.key());
        }
        for v in [edge.a, edge.b] {
            let now_isolated = match self.vertex_edges.get_mut(v) {
                Some(list) => {
                    list.retain(|&e| e != id);
                    list.is_empty()
                }
                None => false,
            };
            if now_isolated {
                self.vertex_edges.remove(v);
                self.mesh.remove_vertex_entry(v);
            }
        }
    }

    fn edge_not_indexed(&self, a: VertexId, b: VertexId) -> TopologyError {
        let serial = |v| self.mesh.vertex(v).map_or(u32::MAX, |vx| vx.serial);
        TopologyError::EdgeNotIndexed {
            a: serial(a),
            b: serial(b),
        }
    }

    /// Removes all vertices, faces and edges.
    pub fn clear(&mut self) {
        self.mesh.clear();
        self.edges.clear();
        self.edge_index.clear();
        self.vertex_edges.clear();
        self.next_edge_serial = 0;
    }

    /// Rebuilds the position lookup and the edge tables from the current
    /// vertices and edges.
    ///
    /// Must be called after vertices were moved in bulk (transform,
    /// smoothing, manual repositioning); it is never run implicitly.
    pub fn rebuild_index(&mut self) {
        self.mesh.rebuild_index();

        self.edge_index.clear();
        self.vertex_edges.clear();
        let mut ordered: Vec<(EdgeId, &Edge)> = self.edges.iter().collect();
        ordered.sort_by_key(|(_, e)| e.serial);
        for (id, edge) in ordered {
            if self.edge_index.insert(edge.key(), id).is_some() {
                warn!(serial = edge.serial, "duplicate edge in edge pool");
            }
            for v in [edge.a, edge.b] {
                if let Some(entry) = self.vertex_edges.entry(v) {
                    entry.or_default().push(id);
                }
            }
        }
    }

    /// Checks the winged-edge invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidTopology`] describing the first
    /// violation found.
    pub fn validate(&self) -> std::result::Result<(), TopologyError> {
        let mut incidences = 0;
        for (id, edge) in &self.edges {
            if edge.faces.is_empty() {
                return Err(TopologyError::InvalidTopology(format!("edge {} has no faces", edge.serial)));
            }
            if self.edge_index.get(&edge.key()) != Some(&id) {
                return Err(TopologyError::InvalidTopology(format!("edge {} is not indexed", edge.serial)));
            }
            incidences += edge.faces.len();
        }
        for (id, face) in self.mesh.faces() {
            for (a, b) in face.edge_pairs() {
                let listed = self
                    .edge_between(a, b)
                    .and_then(|e| self.edges.get(e))
                    .is_some_and(|e| e.faces.contains(&id));
                if !listed {
                    return Err(TopologyError::InvalidTopology("face edge is missing".into()));
                }
            }
        }
        if incidences != 3 * self.mesh.face_count() {
            return Err(TopologyError::InvalidTopology(format!(
                "{incidences} edge-face incidences for {} faces",
                self.mesh.face_count()
            )));
        }
        Ok(())
    }
}

impl Mesh for TopologyMesh {
    fn indexed(&self) -> &IndexedMesh {
        &self.mesh
    }

    fn insert_face(&mut self, input: FaceInput) -> Option<FaceId> {
        TopologyMesh::insert_face(self, input)
    }

    fn clear(&mut self) {
        TopologyMesh::clear(self);
    }

    fn compute_face_normals(&mut self) {
        self.mesh.compute_face_normals();
    }

    fn compute_vertex_normals(&mut self) {
        self.mesh.compute_vertex_normals();
    }

    fn transform(&mut self, matrix: &Matrix4, update_face_normals: bool) {
        self.mesh.transform(matrix, update_face_normals);
    }

    fn set_vertex_position(&mut self, vertex: VertexId, position: Point3) -> Result<()> {
        self.mesh.set_vertex_position(vertex, position)
    }

    fn flip_vertex_order(&mut self) {
        self.mesh.flip_vertex_order();
    }

    fn rebuild_index(&mut self) {
        TopologyMesh::rebuild_index(self);
    }

    fn topology(&self) -> Option<&TopologyMesh> {
        Some(self)
    }

    fn topology_mut(&mut self) -> Option<&mut TopologyMesh> {
        Some(self)
    }
}
