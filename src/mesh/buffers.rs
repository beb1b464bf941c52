//! Flat `f32` buffers for uploading a mesh to a GPU or writing it out.
//!
//! Every array has a `stride`: the number of slots per entry. The first
//! three slots hold `x`, `y`, `z`; any extra slots are zero-filled padding.

use slotmap::SecondaryMap;

use crate::error::{OperationError, Result};
use crate::math::{Point3, Vector3};
use crate::topology::VertexId;

use super::IndexedMesh;

/// Dense `0..vertex_count` indices in serial (insertion) order.
///
/// Exporters use this to number vertices when vertex removal has left gaps
/// in the serials.
#[must_use]
pub fn emission_order(mesh: &IndexedMesh) -> SecondaryMap<VertexId, u32> {
    let mut order = SecondaryMap::with_capacity(mesh.vertex_count());
    for (index, (id, _)) in (0_u32..).zip(mesh.ordered_vertices()) {
        order.insert(id, index);
    }
    order
}

fn check_stride(stride: usize) -> Result<()> {
    if stride < 3 {
        return Err(OperationError::InvalidInput(format!("stride {stride} is smaller than 3")).into());
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
fn push_xyz(out: &mut Vec<f32>, x: f64, y: f64, z: f64, stride: usize) {
    out.extend_from_slice(&[x as f32, y as f32, z as f32]);
    out.resize(out.len() + stride - 3, 0.0);
}

impl IndexedMesh {
    /// Corner positions of every face, three entries per face.
    ///
    /// # Errors
    ///
    /// Returns an error if `stride < 3`.
    pub fn unrolled_positions(&self, stride: usize) -> Result<Vec<f32>> {
        check_stride(stride)?;
        let mut out = Vec::with_capacity(self.face_count() * 3 * stride);
        for (id, _) in self.faces() {
            for p in self.face_positions(id)? {
                push_xyz(&mut out, p.x, p.y, p.z, stride);
            }
        }
        Ok(out)
    }

    /// The face normal repeated for each corner, three entries per face.
    ///
    /// # Errors
    ///
    /// Returns an error if `stride < 3`.
    pub fn unrolled_face_normals(&self, stride: usize) -> Result<Vec<f32>> {
        check_stride(stride)?;
        let mut out = Vec::with_capacity(self.face_count() * 3 * stride);
        for (_, face) in self.faces() {
            let n = face.normal;
            for _ in 0..3 {
                push_xyz(&mut out, n.x, n.y, n.z, stride);
            }
        }
        Ok(out)
    }

    /// The vertex normal of each corner, three entries per face.
    ///
    /// # Errors
    ///
    /// Returns an error if `stride < 3`.
    pub fn unrolled_vertex_normals(&self, stride: usize) -> Result<Vec<f32>> {
        check_stride(stride)?;
        let mut out = Vec::with_capacity(self.face_count() * 3 * stride);
        for (_, face) in self.faces() {
            for id in face.vertices {
                let n: Vector3 = self.vertex(id)?.normal;
                push_xyz(&mut out, n.x, n.y, n.z, stride);
            }
        }
        Ok(out)
    }

    /// One entry per vertex in serial order.
    ///
    /// # Errors
    ///
    /// Returns an error if `stride < 3`.
    pub fn unique_positions(&self, stride: usize) -> Result<Vec<f32>> {
        check_stride(stride)?;
        let mut out = Vec::with_capacity(self.vertex_count() * stride);
        for (_, vertex) in self.ordered_vertices() {
            let p: Point3 = vertex.position;
            push_xyz(&mut out, p.x, p.y, p.z, stride);
        }
        Ok(out)
    }

    /// Face corner indices into [`unique_positions`](Self::unique_positions).
    #[must_use]
    pub fn indices(&self) -> Vec<u32> {
        let order = emission_order(self);
        self.faces()
            .flat_map(|(_, face)| face.vertices)
            .filter_map(|id| order.get(id).copied())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn triangle() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        mesh.add_face(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        mesh
    }

    #[test]
    fn stride_pads_with_zeros() {
        let data = triangle().unrolled_positions(4).unwrap();
        assert_eq!(data.len(), 12);
        assert_eq!(&data[4..8], &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn stride_below_three_is_rejected() {
        assert!(triangle().unrolled_positions(2).is_err());
    }

    #[test]
    fn face_normals_repeat_per_corner() {
        let data = triangle().unrolled_face_normals(3).unwrap();
        assert_eq!(data, vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn indices_reference_unique_positions() {
        let mut mesh = triangle();
        mesh.add_face(
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let positions = mesh.unique_positions(3).unwrap();
        assert_eq!(positions.len(), 12);
        let indices = mesh.indices();
        assert_eq!(indices.len(), 6);
        assert!(indices.iter().all(|&i| i < 4));
        assert!(indices.contains(&3));
    }
}
