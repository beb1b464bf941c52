//! Binary mesh files.
//!
//! Writers take any [`std::io::Write`] and readers any [`std::io::Read`];
//! the `save_*`/`load_*` helpers wrap files in buffered streams. All
//! multi-byte values are little-endian.

mod ply;
mod stl;

pub use ply::{save_ply, write_ply, PlyOptions};
pub use stl::{
    load_stl, read_stl, read_stl_into, save_stl, write_stl, write_stl_with_colors, StlColor,
    StlColorModel, StlOptions,
};

use std::io::{self, Read};

/// Reads until `buf` is full or the stream ends. Returns the bytes read.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[allow(clippy::cast_possible_truncation)]
fn write_f32s<W: io::Write + ?Sized>(writer: &mut W, values: [f64; 3]) -> io::Result<()> {
    for v in values {
        writer.write_all(&(v as f32).to_le_bytes())?;
    }
    Ok(())
}
