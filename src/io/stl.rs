//! Binary STL.
//!
//! ```text
//! UINT8[80]    – Header
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute (colour)
//! end
//! ```
//!
//! Triangles are written in stored winding order with the stored face
//! normal, so reading a file back reproduces the winding.
//!
//! The reader keeps the three corners in file order. Face normals follow
//! the right-hand rule `(b - a) × (c - a)`, which is the usual STL
//! convention: a facet listed counter-clockwise seen from outside gets an
//! outward normal. Readers that swap the last two corners and use the
//! opposite normal formula end up with the same orientation; files meant
//! for such a reader are therefore read with identical winding here.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use crate::error::{IoError, Result};
use crate::math::Point3;
use crate::mesh::{IndexedMesh, Mesh};
use crate::topology::{Face, FaceId};

use super::{read_full, write_f32s};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Attribute of a face without colour information.
const NO_COLOR: u16 = 0x8000;

const DEFAULT_HEADER: &str = "binary STL written by wingmesh";

/// An 8-bit-per-channel colour, packed to 5 bits per channel on export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StlColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl StlColor {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn channels5(self) -> (u16, u16, u16) {
        (
            u16::from(self.r >> 3),
            u16::from(self.g >> 3),
            u16::from(self.b >> 3),
        )
    }
}

/// How colours are encoded in the header and attribute field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StlColorModel {
    /// Every attribute is `0x8000`.
    #[default]
    None,
    /// Materialise Magics: the header starts with `COLOR=` followed by the
    /// base colour as R, G, B, A bytes. Facet colours are `R | G<<5 | B<<10`
    /// with bit 15 clear; bit 15 set means "use the base colour".
    Materialise {
        base: StlColor,
        use_facet_colors: bool,
    },
    /// VisCAM/SolidView: `B | G<<5 | R<<10` with bit 15 marking a valid
    /// colour. Faces without a colour get `0`.
    VisCam,
}

impl StlColorModel {
    fn attribute(self, color: Option<StlColor>) -> u16 {
        match (self, color) {
            (Self::None, _) => NO_COLOR,
            (
                Self::Materialise {
                    use_facet_colors: true,
                    ..
                },
                Some(c),
            ) => {
                let (r, g, b) = c.channels5();
                r | g << 5 | b << 10
            }
            (Self::Materialise { .. }, _) => NO_COLOR,
            (Self::VisCam, Some(c)) => {
                let (r, g, b) = c.channels5();
                b | g << 5 | r << 10 | 0x8000
            }
            (Self::VisCam, None) => 0,
        }
    }
}

/// Options for [`write_stl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StlOptions {
    /// Free-form header text, truncated to fit the 80-byte header. Without
    /// a Materialise colour prefix it must not start with `solid`, which
    /// readers take for ASCII STL; [`write_stl`] rejects such headers.
    pub header: String,
    pub color_model: StlColorModel,
}

impl Default for StlOptions {
    fn default() -> Self {
        Self {
            header: DEFAULT_HEADER.to_owned(),
            color_model: StlColorModel::None,
        }
    }
}

impl StlOptions {
    fn check_header(&self) -> Result<()> {
        if matches!(self.color_model, StlColorModel::Materialise { .. }) {
            return Ok(());
        }
        let text = self.header.trim_start().as_bytes();
        if text.len() >= 5 && text[..5].eq_ignore_ascii_case(b"solid") {
            return Err(IoError::InvalidContent(
                "binary STL header must not start with \"solid\"".into(),
            )
            .into());
        }
        Ok(())
    }

    fn header_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut header = [b' '; HEADER_SIZE];
        let start = match self.color_model {
            StlColorModel::Materialise { base, .. } => {
                header[..6].copy_from_slice(b"COLOR=");
                header[6..10].copy_from_slice(&[base.r, base.g, base.b, 0xFF]);
                10
            }
            _ => 0,
        };
        let text = self.header.as_bytes();
        let len = text.len().min(HEADER_SIZE - start);
        header[start..start + len].copy_from_slice(&text[..len]);
        header
    }
}

/// Writes `mesh` as binary STL without per-face colours.
///
/// # Errors
///
/// Returns an error if the writer fails or the header text starts with
/// `solid`.
pub fn write_stl<W: Write>(mesh: &IndexedMesh, writer: W, options: &StlOptions) -> Result<()> {
    write_stl_with_colors(mesh, writer, options, |_, _| None)
}

/// Writes `mesh` as binary STL, asking `face_color` for each face's colour.
///
/// Colours are ignored by [`StlColorModel::None`].
///
/// # Errors
///
/// Returns an error if the writer fails, the header text starts with
/// `solid`, or the mesh has more than `u32::MAX` faces.
pub fn write_stl_with_colors<W, F>(
    mesh: &IndexedMesh,
    mut writer: W,
    options: &StlOptions,
    mut face_color: F,
) -> Result<()>
where
    W: Write,
    F: FnMut(FaceId, &Face) -> Option<StlColor>,
{
    options.check_header()?;
    let count = u32::try_from(mesh.face_count())
        .map_err(|_| IoError::InvalidContent("too many faces for STL".into()))?;

    writer.write_all(&options.header_bytes())?;
    writer.write_all(&count.to_le_bytes())?;

    for (id, face) in mesh.faces() {
        let n = face.normal;
        write_f32s(&mut writer, [n.x, n.y, n.z])?;
        for p in mesh.face_positions(id)? {
            write_f32s(&mut writer, [p.x, p.y, p.z])?;
        }
        let attribute = options.color_model.attribute(face_color(id, face));
        writer.write_all(&attribute.to_le_bytes())?;
    }

    debug!(faces = count, name = mesh.name(), "wrote binary STL");
    Ok(())
}

/// Writes `mesh` to a binary STL file.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn save_stl<P: AsRef<Path>>(mesh: &IndexedMesh, path: P, options: &StlOptions) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_stl(mesh, &mut writer, options)?;
    writer.flush()?;
    Ok(())
}

/// Reads binary STL triangles into an existing mesh.
///
/// Stored normals and attributes are skipped; face normals come from the
/// winding and vertex normals are recomputed at the end. Corners are
/// deduplicated by position like any other [`Mesh::add_face`]. Returns the
/// number of faces added, which is lower than the stored count when the file
/// contains degenerate triangles.
///
/// # Errors
///
/// Returns [`IoError::InvalidHeader`] if the stream ends inside the header
/// and [`IoError::UnexpectedEof`] if it ends inside a triangle. Triangles
/// read before the error stay in `mesh`.
pub fn read_stl_into<M, R>(mesh: &mut M, mut reader: R) -> Result<usize>
where
    M: Mesh + ?Sized,
    R: Read,
{
    let mut header = [0_u8; HEADER_SIZE + 4];
    let got = read_full(&mut reader, &mut header)?;
    if got < header.len() {
        return Err(IoError::InvalidHeader {
            expected: header.len(),
            got,
        }
        .into());
    }
    let count = u32::from_le_bytes([
        header[HEADER_SIZE],
        header[HEADER_SIZE + 1],
        header[HEADER_SIZE + 2],
        header[HEADER_SIZE + 3],
    ]);

    let faces_before = mesh.face_count();
    let mut position = (HEADER_SIZE + 4) as u64;
    let mut buf = [0_u8; TRIANGLE_SIZE];
    for _ in 0..count {
        let got = read_full(&mut reader, &mut buf)?;
        if got < TRIANGLE_SIZE {
            mesh.compute_vertex_normals();
            return Err(IoError::UnexpectedEof {
                position: position + got as u64,
            }
            .into());
        }
        position += TRIANGLE_SIZE as u64;

        // Skip the normal (12 bytes) and the attribute (last 2 bytes).
        let a = point_at(&buf, 12);
        let b = point_at(&buf, 24);
        let c = point_at(&buf, 36);
        mesh.add_face(a, b, c);
    }

    mesh.compute_vertex_normals();
    let added = mesh.face_count() - faces_before;
    debug!(stored = count, added, "read binary STL");
    Ok(added)
}

/// Reads a binary STL stream into a new [`IndexedMesh`].
///
/// # Errors
///
/// See [`read_stl_into`].
pub fn read_stl<R: Read>(reader: R) -> Result<IndexedMesh> {
    let mut mesh = IndexedMesh::new();
    read_stl_into(&mut mesh, reader)?;
    Ok(mesh)
}

/// Loads a binary STL file. The mesh is named after the file stem.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not valid binary STL.
pub fn load_stl<P: AsRef<Path>>(path: P) -> Result<IndexedMesh> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let mut mesh = read_stl(reader)?;
    if let Some(stem) = path.file_stem() {
        mesh.set_name(stem.to_string_lossy());
    }
    Ok(mesh)
}

fn point_at(buf: &[u8; TRIANGLE_SIZE], offset: usize) -> Point3 {
    let f = |i: usize| {
        let start = offset + i * 4;
        let mut bytes = [0_u8; 4];
        bytes.copy_from_slice(&buf[start..start + 4]);
        f64::from(f32::from_le_bytes(bytes))
    };
    Point3::new(f(0), f(1), f(2))
}
