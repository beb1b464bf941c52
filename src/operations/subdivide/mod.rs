mod strategy;

pub use strategy::{
    Dual, DualDisplacement, EdgeOrder, Midpoint, MidpointDisplacement, NormalDisplacement,
    SubdivisionStrategy, Tri,
};

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::topology::{EdgeId, TopologyMesh};

/// Parameters controlling a subdivision run.
#[derive(Debug, Clone, Copy)]
pub struct SubdivisionParams {
    /// Edges with a squared length below this value are left alone.
    /// `0.0` splits every edge present at the start of a pass.
    pub min_length_sq: f64,
    /// Number of passes. Each pass snapshots the edges present when it starts.
    pub passes: usize,
}

impl Default for SubdivisionParams {
    fn default() -> Self {
        Self {
            min_length_sq: 0.0,
            passes: 1,
        }
    }
}

/// Summary of a subdivision run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubdivisionReport {
    pub edges_split: usize,
    pub faces_before: usize,
    pub faces_after: usize,
    pub vertices_after: usize,
}

/// Refines a topology mesh by splitting edges with a [`SubdivisionStrategy`].
pub struct Subdivide<'a, S: SubdivisionStrategy + ?Sized> {
    strategy: &'a S,
    params: SubdivisionParams,
}

impl<'a, S: SubdivisionStrategy + ?Sized> Subdivide<'a, S> {
    /// Creates a new `Subdivide` operation.
    #[must_use]
    pub fn new(strategy: &'a S, params: SubdivisionParams) -> Self {
        Self { strategy, params }
    }

    /// Executes the subdivision, modifying the mesh in place.
    ///
    /// Each pass sorts a snapshot of the current edges by the strategy's
    /// order, then splits every snapshot edge that still exists and is at
    /// least `min_length_sq` long. Edges created during the pass are not
    /// visited until the next one.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge tables are inconsistent, e.g. after a
    /// bulk transform without [`TopologyMesh::rebuild_index`].
    pub fn execute(&self, mesh: &mut TopologyMesh) -> Result<SubdivisionReport> {
        let faces_before = mesh.face_count();
        let mut edges_split = 0;

        for pass in 0..self.params.passes {
            let mut snapshot: Vec<EdgeId> = mesh.edges().map(|(id, _)| id).collect();
            snapshot.sort_by(|&a, &b| self.strategy.edge_order(mesh, a, b));

            let mut split_this_pass = 0;
            for edge in snapshot {
                if !mesh.contains_edge(edge) {
                    continue;
                }
                if mesh.edge_length_squared(edge)? < self.params.min_length_sq {
                    continue;
                }
                split_edge(mesh, edge, self.strategy)?;
                split_this_pass += 1;
            }

            debug!(
                pass,
                edges_split = split_this_pass,
                faces = mesh.face_count(),
                vertices = mesh.vertex_count(),
                "subdivision pass finished"
            );
            edges_split += split_this_pass;
            if split_this_pass == 0 {
                break;
            }
        }

        Ok(SubdivisionReport {
            edges_split,
            faces_before,
            faces_after: mesh.face_count(),
            vertices_after: mesh.vertex_count(),
        })
    }
}

/// Runs a single subdivision pass with the given length threshold.
///
/// # Errors
///
/// See [`Subdivide::execute`].
pub fn subdivide<S: SubdivisionStrategy + ?Sized>(
    mesh: &mut TopologyMesh,
    strategy: &S,
    min_length_sq: f64,
) -> Result<SubdivisionReport> {
    let params = SubdivisionParams {
        min_length_sq,
        passes: 1,
    };
    Subdivide::new(strategy, params).execute(mesh)
}

/// Splits one edge at the strategy's split points.
///
/// Every face on the edge is replaced by a fan from its opposite corner over
/// the edge's endpoints and the split points, `n + 1` faces for `n` points.
/// The new faces take the old face normal as their orientation hint, so the
/// winding is preserved. Finally the edge and its old faces are removed.
///
/// The fans reuse the existing corner vertices by id; only the split points
/// are resolved by position. A stale position lookup therefore cannot tear
/// the mesh apart.
///
/// Returns the number of faces created. A strategy returning no points
/// leaves the mesh untouched.
///
/// # Errors
///
/// Returns an error if the edge is unknown or one of its faces does not
/// contain both endpoints.
pub fn split_edge<S: SubdivisionStrategy + ?Sized>(
    mesh: &mut TopologyMesh,
    edge: EdgeId,
    strategy: &S,
) -> Result<usize> {
    let points = strategy.split_points(mesh, edge)?;
    if points.is_empty() {
        return Ok(0);
    }

    let e = mesh.edge(edge)?;
    let (a, b) = (e.a, e.b);
    let mut fans = Vec::with_capacity(e.faces.len());
    for &face_id in &e.faces {
        let face = mesh.face(face_id)?;
        let apex = face.opposite(a, b).ok_or_else(|| {
            TopologyError::InvalidTopology("face listed on an edge it does not contain".into())
        })?;
        fans.push((apex, face.normal));
    }

    let mut chain = Vec::with_capacity(points.len() + 2);
    chain.push(a);
    for point in points {
        chain.push(mesh.resolve_vertex(point));
    }
    chain.push(b);

    let mut created = 0;
    for (apex, normal) in fans {
        for pair in chain.windows(2) {
            if mesh
                .insert_face_with_ids([apex, pair[0], pair[1]], Some(normal))
                .is_some()
            {
                created += 1;
            }
        }
    }

    mesh.remove_edge(edge)?;
    Ok(created)
}
