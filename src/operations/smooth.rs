//! Laplacian mesh smoothing.
//!
//! Each selected vertex moves toward the unweighted centroid of its edge
//! neighbours:
//!
//! ```text
//! v_new = v + lambda * (centroid(N(v)) - v)
//! ```
//!
//! With `lambda = 1.0` (the default) a vertex jumps straight onto the
//! centroid. All new positions of an iteration are computed from the
//! positions at the start of that iteration and written back together.

use tracing::debug;

use crate::error::{Result, TopologyError};
use crate::math::{Point3, Vector3};
use crate::mesh::Mesh;
use crate::topology::{TopologyMesh, VertexId, VertexSelection};

/// Statistics of a smoothing run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SmoothingReport {
    pub iterations: usize,
    /// Number of vertices moved in the last iteration.
    pub vertices_moved: usize,
    /// Largest single-vertex displacement over all iterations.
    pub max_displacement: f64,
}

/// Laplacian relaxation of a vertex selection.
#[derive(Debug, Clone, Copy)]
pub struct LaplacianSmooth {
    pub iterations: usize,
    /// Fraction of the way to the neighbour centroid moved per iteration.
    pub lambda: f64,
}

impl Default for LaplacianSmooth {
    fn default() -> Self {
        Self {
            iterations: 1,
            lambda: 1.0,
        }
    }
}

impl LaplacianSmooth {
    /// Creates a new `LaplacianSmooth` operation with `lambda = 1.0`.
    #[must_use]
    pub fn new(iterations: usize) -> Self {
        Self {
            iterations,
            ..Self::default()
        }
    }

    /// Sets the per-iteration step factor.
    #[must_use]
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Executes the smoothing, modifying the mesh in place.
    ///
    /// After every iteration the lookup tables are rebuilt and face and
    /// vertex normals recomputed. Selected vertices without neighbours keep
    /// their position; ids not in the mesh are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::MissingTopology`] if `mesh` has no edge
    /// adjacency (a plain [`IndexedMesh`](crate::mesh::IndexedMesh)).
    pub fn execute<M: Mesh + ?Sized>(
        &self,
        mesh: &mut M,
        selection: &VertexSelection,
    ) -> Result<SmoothingReport> {
        let mesh = mesh.topology_mut().ok_or(TopologyError::MissingTopology)?;

        let mut report = SmoothingReport {
            iterations: self.iterations,
            ..SmoothingReport::default()
        };
        for iteration in 0..self.iterations {
            let updates = self.relaxed_positions(mesh, selection);

            let mut max_step = 0.0_f64;
            for &(id, position) in &updates {
                let old = mesh.position(id)?;
                max_step = max_step.max(nalgebra::distance(&old, &position));
                mesh.set_vertex_position(id, position)?;
            }
            mesh.rebuild_index();
            mesh.compute_face_normals();
            mesh.compute_vertex_normals();

            debug!(iteration, moved = updates.len(), max_step, "laplacian iteration");
            report.vertices_moved = updates.len();
            report.max_displacement = report.max_displacement.max(max_step);
        }
        Ok(report)
    }

    fn relaxed_positions(
        &self,
        mesh: &TopologyMesh,
        selection: &VertexSelection,
    ) -> Vec<(VertexId, Point3)> {
        selection
            .iter()
            .filter_map(|id| {
                let position = mesh.position(id).ok()?;
                let neighbors = mesh.neighbors(id);
                if neighbors.is_empty() {
                    return None;
                }
                let sum = neighbors
                    .iter()
                    .filter_map(|&n| mesh.position(n).ok())
                    .fold(Vector3::zeros(), |acc, p| acc + p.coords);
                #[allow(clippy::cast_precision_loss)]
                let centroid = Point3::from(sum / neighbors.len() as f64);
                Some((id, position + (centroid - position) * self.lambda))
            })
            .collect()
    }
}
