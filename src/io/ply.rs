//! Binary little-endian PLY.
//!
//! Vertices are written in serial order with `y` and `z` exchanged; normals
//! additionally have their (new) `z` negated. Faces reference vertices by
//! their position in that order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{IoError, Result, TopologyError};
use crate::mesh::{emission_order, IndexedMesh};

use super::write_f32s;

/// Options for [`write_ply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlyOptions {
    /// Also write `nx ny nz` per vertex.
    pub with_normals: bool,
    /// Optional `comment` line in the header. Must not contain newlines.
    pub comment: Option<String>,
}

fn header(vertices: usize, faces: usize, options: &PlyOptions) -> String {
    let mut header = String::from("ply\nformat binary_little_endian 1.0\n");
    if let Some(comment) = &options.comment {
        header.push_str(&format!("comment {comment}\n"));
    }
    header.push_str(&format!("element vertex {vertices}\n"));
    for axis in ["x", "y", "z"] {
        header.push_str(&format!("property float {axis}\n"));
    }
    if options.with_normals {
        for axis in ["nx", "ny", "nz"] {
            header.push_str(&format!("property float {axis}\n"));
        }
    }
    header.push_str(&format!("element face {faces}\n"));
    header.push_str("property list uchar uint vertex_indices\n");
    header.push_str("end_header\n");
    header
}

/// Writes `mesh` as binary little-endian PLY.
///
/// # Errors
///
/// Returns an error if the writer fails, the comment contains a newline, or
/// a face references a vertex that is not in the mesh.
pub fn write_ply<W: Write>(mesh: &IndexedMesh, mut writer: W, options: &PlyOptions) -> Result<()> {
    if options
        .comment
        .as_deref()
        .is_some_and(|c| c.contains(['\n', '\r']))
    {
        return Err(IoError::InvalidContent("PLY comment contains a line break".into()).into());
    }

    writer.write_all(header(mesh.vertex_count(), mesh.face_count(), options).as_bytes())?;

    for (_, vertex) in mesh.ordered_vertices() {
        let p = vertex.position;
        write_f32s(&mut writer, [p.x, p.z, p.y])?;
        if options.with_normals {
            let n = vertex.normal;
            write_f32s(&mut writer, [n.x, n.z, -n.y])?;
        }
    }

    let order = emission_order(mesh);
    for (_, face) in mesh.faces() {
        writer.write_all(&[3_u8])?;
        for id in face.vertices {
            let index = order
                .get(id)
                .ok_or_else(|| TopologyError::EntityNotFound("face vertex".into()))?;
            writer.write_all(&index.to_le_bytes())?;
        }
    }

    debug!(
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        name = mesh.name(),
        "wrote binary PLY"
    );
    Ok(())
}

/// Writes `mesh` to a binary PLY file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_ply<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, options: &PlyOptions) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_ply(mesh, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn triangle() -> IndexedMesh {
        let mut mesh = IndexedMesh::new();
        mesh.add_face(p(1.0, 2.0, 3.0), p(4.0, 5.0, 6.0), p(1.0, 5.0, 0.0));
        mesh
    }

    fn to_bytes(mesh: &IndexedMesh, options: &PlyOptions) -> Vec<u8> {
        let mut out = Vec::new();
        write_ply(mesh, &mut out, options).unwrap();
        out
    }

    fn split_header(bytes: &[u8]) -> (String, &[u8]) {
        let marker = b"end_header\n";
        let end = bytes
            .windows(marker.len())
            .position(|w| w == marker)
            .unwrap()
            + marker.len();
        (String::from_utf8(bytes[..end].to_vec()).unwrap(), &bytes[end..])
    }

    fn f32_at(bytes: &[u8], offset: usize) -> f32 {
        f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn header_lines() {
        let options = PlyOptions {
            with_normals: false,
            comment: Some("test mesh".into()),
        };
        let bytes = to_bytes(&triangle(), &options);
        let (header, _) = split_header(&bytes);
        assert_eq!(
            header,
            "ply\nformat binary_little_endian 1.0\ncomment test mesh\nelement vertex 3\n\
             property float x\nproperty float y\nproperty float z\nelement face 1\n\
             property list uchar uint vertex_indices\nend_header\n"
        );
    }

    #[test]
    fn body_size_and_axis_swap() {
        let bytes = to_bytes(&triangle(), &PlyOptions::default());
        let (_, body) = split_header(&bytes);
        assert_eq!(body.len(), 3 * 12 + 13);
        assert_eq!(f32_at(body, 0), 1.0);
        assert_eq!(f32_at(body, 4), 3.0);
        assert_eq!(f32_at(body, 8), 2.0);

        let faces = &body[36..];
        assert_eq!(faces[0], 3);
        let indices: Vec<u32> = faces[1..]
            .chunks(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn normals_are_swapped_and_negated() {
        let mut mesh = IndexedMesh::new();
        mesh.add_face(p(0.0, 0.0, 0.0), p(0.0, 0.0, 1.0), p(1.0, 0.0, 0.0));
        mesh.compute_vertex_normals();
        let options = PlyOptions {
            with_normals: true,
            comment: None,
        };
        let bytes = to_bytes(&mesh, &options);
        let (header, body) = split_header(&bytes);
        assert!(header.contains("property float nx\nproperty float ny\nproperty float nz\n"));
        assert_eq!(body.len(), 3 * 24 + 13);
        // Vertex normal is +y, written as (0, 0, -1).
        assert_eq!(f32_at(body, 12), 0.0);
        assert_eq!(f32_at(body, 16), 0.0);
        assert_eq!(f32_at(body, 20), -1.0);
    }

    #[test]
    fn indices_skip_removed_serials() {
        let mut mesh = crate::topology::TopologyMesh::new();
        let first = mesh
            .add_face(p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0))
            .unwrap();
        mesh.add_face(p(5.0, 0.0, 0.0), p(6.0, 0.0, 0.0), p(5.0, 1.0, 0.0));
        mesh.remove_face(first).unwrap();

        let bytes = to_bytes(mesh.as_indexed(), &PlyOptions::default());
        let (header, body) = split_header(&bytes);
        assert!(header.contains("element vertex 3\n"));
        let indices: Vec<u32> = body[37..]
            .chunks(4)
            .map(|c| u32::from_le_bytes(c.try_into().unwrap()))
            .collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn multiline_comment_is_rejected() {
        let options = PlyOptions {
            with_normals: false,
            comment: Some("a\nb".into()),
        };
        let mut out = Vec::new();
        assert!(write_ply(&triangle(), &mut out, &options).is_err());
        assert!(out.is_empty());
    }
}
