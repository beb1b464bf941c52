//! An indexed triangle mesh kernel.
//!
//! [`IndexedMesh`] deduplicates vertices by exact position.
//! [`TopologyMesh`] adds winged-edge adjacency on top of it, which the
//! [subdivision](operations::subdivide) and
//! [smoothing](operations::smooth) operations build on. Meshes are written
//! to binary STL and PLY through [`io`].

pub mod error;
pub mod io;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod topology;

pub use error::{MeshError, Result};
pub use mesh::{FaceInput, IndexedMesh, Mesh};
pub use topology::{EdgeId, FaceId, TopologyMesh, VertexId, VertexSelection};
