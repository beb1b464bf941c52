use std::collections::HashMap;

use slotmap::SlotMap;
use tracing::{trace, warn};

use crate::error::{Result, TopologyError};
use crate::math::{
    transform_point, triangle_normal, Aabb, BoundingSphere, Matrix4, Point2, Point3, Vector3,
};
use crate::topology::{Face, FaceId, Vertex, VertexId};

use super::{FaceInput, Mesh};

/// Exact-value hash key for a position. Both zeros map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PositionKey([u64; 3]);

impl PositionKey {
    fn new(p: &Point3) -> Self {
        let bits = |v: f64| if v == 0.0 { 0_u64 } else { v.to_bits() };
        Self([bits(p.x), bits(p.y), bits(p.z)])
    }
}

/// A triangle mesh with a position-deduplicated vertex pool.
///
/// Vertices live in an arena and are addressed by [`VertexId`]. A separate
/// position lookup merges corners inserted at exactly the same coordinates.
/// Moving vertices (through [`Mesh::transform`] or
/// [`Mesh::set_vertex_position`]) does not update that lookup; call
/// [`rebuild_index`](IndexedMesh::rebuild_index) once the bulk edit is done.
#[derive(Debug, Clone, Default)]
pub struct IndexedMesh {
    name: String,
    vertices: SlotMap<VertexId, Vertex>,
    faces: SlotMap<FaceId, Face>,
    lookup: HashMap<PositionKey, VertexId>,
    next_serial: u32,
}

impl IndexedMesh {
    /// Creates a new, empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty mesh with a name.
    #[must_use]
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    // --- Vertex access ---

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns a reference to the vertex, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not part of this mesh.
    pub fn vertex(&self, id: VertexId) -> std::result::Result<&Vertex, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// Position of a vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not part of this mesh.
    pub fn position(&self, id: VertexId) -> std::result::Result<Point3, TopologyError> {
        self.vertex(id).map(|v| v.position)
    }

    /// Iterates over all vertices in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices.iter()
    }

    /// All vertices sorted by serial, i.e. in insertion order.
    #[must_use]
    pub fn ordered_vertices(&self) -> Vec<(VertexId, &Vertex)> {
        let mut ordered: Vec<_> = self.vertices.iter().collect();
        ordered.sort_by_key(|(_, v)| v.serial);
        ordered
    }

    /// Exact position lookup.
    #[must_use]
    pub fn vertex_at(&self, position: &Point3) -> Option<VertexId> {
        self.lookup.get(&PositionKey::new(position)).copied()
    }

    /// The vertex nearest to `point`, `None` for an empty mesh.
    ///
    /// The exact lookup is only trusted while the vertex it names is still at
    /// `point`; a stale lookup falls back to the linear scan.
    #[must_use]
    pub fn closest_vertex_to_point(&self, point: &Point3) -> Option<VertexId> {
        if let Some(id) = self.vertex_at(point) {
            if self.vertices.get(id).is_some_and(|v| v.position == *point) {
                return Some(id);
            }
        }
        self.vertices
            .iter()
            .map(|(id, v)| (id, nalgebra::distance_squared(&v.position, point)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    // --- Face access ---

    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns a reference to the face, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is not part of this mesh.
    pub fn face(&self, id: FaceId) -> std::result::Result<&Face, TopologyError> {
        self.faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))
    }

    /// Iterates over all faces in arena order.
    pub fn faces(&self) -> impl Iterator<Item = (FaceId, &Face)> {
        self.faces.iter()
    }

    /// Corner positions of a face in winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if the face or one of its vertices is missing.
    pub fn face_positions(&self, id: FaceId) -> std::result::Result<[Point3; 3], TopologyError> {
        let [a, b, c] = self.face(id)?.vertices;
        Ok([self.position(a)?, self.position(b)?, self.position(c)?])
    }

    // --- Construction ---

    /// Inserts a triangle from three corner positions.
    pub fn add_face(&mut self, a: Point3, b: Point3, c: Point3) -> Option<FaceId> {
        self.insert_face(FaceInput::new(a, b, c))
    }

    /// Inserts a triangle, reusing vertices at identical positions.
    ///
    /// Corner vertices are created even when the triangle turns out to be
    /// degenerate; the face itself is then dropped and `None` returned.
    pub fn insert_face(&mut self, input: FaceInput) -> Option<FaceId> {
        let ids = input.points.map(|p| self.resolve_vertex(p));
        self.insert_face_with_ids(ids, input.normal, input.uvs)
    }

    /// Inserts a triangle over existing vertices.
    ///
    /// Returns `None` if two corners coincide or a corner is not part of the
    /// mesh. A `hint` opposing the geometric normal swaps the first two
    /// corners.
    pub(crate) fn insert_face_with_ids(
        &mut self,
        mut ids: [VertexId; 3],
        hint: Option<Vector3>,
        mut uvs: Option<[Point2; 3]>,
    ) -> Option<FaceId> {
        if ids[0] == ids[1] || ids[1] == ids[2] || ids[2] == ids[0] {
            trace!(vertices = ?ids, "ignoring degenerate face");
            return None;
        }

        let a = self.vertices.get(ids[0])?.position;
        let b = self.vertices.get(ids[1])?.position;
        let c = self.vertices.get(ids[2])?.position;
        let mut normal = triangle_normal(&a, &b, &c);
        if let Some(hint) = hint {
            if hint.dot(&normal) < 0.0 {
                ids.swap(0, 1);
                if let Some(uvs) = uvs.as_mut() {
                    uvs.swap(0, 1);
                }
                normal = -normal;
            }
        }

        Some(self.faces.insert(Face {
            vertices: ids,
            normal,
            uvs,
        }))
    }

    /// Copies every face of `other` into this mesh.
    pub fn add_mesh(&mut self, other: &IndexedMesh) {
        Mesh::add_mesh(self, other);
    }

    /// Removes all vertices and faces. The name is kept.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.lookup.clear();
        self.next_serial = 0;
    }

    /// The vertex at `position`, created if there is none.
    ///
    /// A lookup entry whose vertex has since moved away is replaced rather
    /// than reused.
    pub(crate) fn resolve_vertex(&mut self, position: Point3) -> VertexId {
        let key = PositionKey::new(&position);
        if let Some(&id) = self.lookup.get(&key) {
            if self
                .vertices
                .get(id)
                .is_some_and(|v| PositionKey::new(&v.position) == key)
            {
                return id;
            }
        }
        let id = self.vertices.insert(Vertex::new(position, self.next_serial));
        self.next_serial += 1;
        self.lookup.insert(key, id);
        id
    }

    pub(crate) fn remove_face_entry(&mut self, id: FaceId) -> Option<Face> {
        self.faces.remove(id)
    }

    pub(crate) fn remove_vertex_entry(&mut self, id: VertexId) -> Option<Vertex> {
        let vertex = self.vertices.remove(id)?;
        let key = PositionKey::new(&vertex.position);
        if self.lookup.get(&key) == Some(&id) {
            self.lookup.remove(&key);
        }
        Some(vertex)
    }

    // --- Geometry ---

    /// Recomputes every face normal from the current vertex positions.
    pub fn compute_face_normals(&mut self) {
        for face in self.faces.values_mut() {
            let [a, b, c] = face.vertices;
            if let (Some(a), Some(b), Some(c)) =
                (self.vertices.get(a), self.vertices.get(b), self.vertices.get(c))
            {
                face.normal = triangle_normal(&a.position, &b.position, &c.position);
            }
        }
    }

    /// Recomputes vertex normals from the face normals.
    pub fn compute_vertex_normals(&mut self) {
        for vertex in self.vertices.values_mut() {
            vertex.clear_normal();
        }
        for face in self.faces.values() {
            for id in face.vertices {
                if let Some(vertex) = self.vertices.get_mut(id) {
                    vertex.add_face_normal(&face.normal);
                }
            }
        }
        for vertex in self.vertices.values_mut() {
            vertex.finish_normal();
        }
    }

    /// Mean of all vertex positions.
    #[must_use]
    pub fn centroid(&self) -> Option<Point3> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .values()
            .fold(nalgebra::Vector3::zeros(), |acc, v| acc + v.position.coords);
        #[allow(clippy::cast_precision_loss)]
        let n = self.vertices.len() as f64;
        Some(Point3::from(sum / n))
    }

    #[must_use]
    pub fn bounding_box(&self) -> Option<Aabb> {
        Aabb::from_points(self.vertices.values().map(|v| &v.position))
    }

    /// Sphere centered on the vertex centroid that encloses every vertex.
    ///
    /// This is not the minimal enclosing sphere.
    #[must_use]
    pub fn bounding_sphere(&self) -> Option<BoundingSphere> {
        let center = self.centroid()?;
        let max_sq = self
            .vertices
            .values()
            .map(|v| nalgebra::distance_squared(&center, &v.position))
            .fold(0.0_f64, f64::max);
        Some(BoundingSphere {
            center,
            radius: max_sq.sqrt(),
        })
    }

    /// Applies an affine transform to every vertex.
    pub fn transform(&mut self, matrix: &Matrix4, update_face_normals: bool) {
        for vertex in self.vertices.values_mut() {
            vertex.position = transform_point(matrix, &vertex.position);
        }
        if update_face_normals {
            self.compute_face_normals();
        }
    }

    /// Moves a single vertex.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not part of this mesh.
    pub fn set_vertex_position(&mut self, id: VertexId, position: Point3) -> Result<()> {
        let vertex = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
        vertex.position = position;
        Ok(())
    }

    /// Reverses the winding of every face and negates its normal.
    pub fn flip_vertex_order(&mut self) {
        for face in self.faces.values_mut() {
            face.flip();
        }
    }

    /// Rebuilds the position lookup from the current vertex positions.
    ///
    /// When several vertices ended up at the same position, the one inserted
    /// first keeps the lookup entry.
    pub fn rebuild_index(&mut self) {
        let mut lookup = HashMap::with_capacity(self.vertices.len());
        for (id, vertex) in self.ordered_vertices() {
            let key = PositionKey::new(&vertex.position);
            if lookup.contains_key(&key) {
                warn!(serial = vertex.serial, position = ?vertex.position, "vertices share a position");
                continue;
            }
            lookup.insert(key, id);
        }
        self.lookup = lookup;
    }
}

impl Mesh for IndexedMesh {
    fn indexed(&self) -> &IndexedMesh {
        self
    }

    fn insert_face(&mut self, input: FaceInput) -> Option<FaceId> {
        IndexedMesh::insert_face(self, input)
    }

    fn clear(&mut self) {
        IndexedMesh::clear(self);
    }

    fn compute_face_normals(&mut self) {
        IndexedMesh::compute_face_normals(self);
    }

    fn compute_vertex_normals(&mut self) {
        IndexedMesh::compute_vertex_normals(self);
    }

    fn transform(&mut self, matrix: &Matrix4, update_face_normals: bool) {
        IndexedMesh::transform(self, matrix, update_face_normals);
    }

    fn set_vertex_position(&mut self, vertex: VertexId, position: Point3) -> Result<()> {
        IndexedMesh::set_vertex_position(self, vertex, position)
    }

    fn flip_vertex_order(&mut self) {
        IndexedMesh::flip_vertex_order(self);
    }

    fn rebuild_index(&mut self) {
        IndexedMesh::rebuild_index(self);
    }
}
