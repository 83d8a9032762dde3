//! Laplacian mesh smoothing.
//!
//! Each iteration moves every vertex toward the centroid of its
//! edge-connected neighbours. New positions are computed from a snapshot of
//! the previous iteration, so the result does not depend on vertex order and
//! the parallel path matches the sequential one exactly.
//!
//! # Example
//!
//! ```
//! use tessellate::algo::smooth::{laplacian_smooth, SmoothOptions};
//! use tessellate::mesh::fixtures;
//!
//! let mut mesh = fixtures::unit_cube();
//! let options = SmoothOptions::default()
//!     .with_iterations(5)
//!     .with_rate(0.3);
//! laplacian_smooth(&mut mesh, &options).unwrap();
//! assert_eq!(mesh.num_triangles(), 12);
//! ```

use log::debug;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

use crate::error::Result;
use crate::mesh::{Mesh, MeshAdjacency};

/// Options for Laplacian smoothing.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of smoothing iterations.
    pub iterations: usize,

    /// Fraction of the way each vertex moves toward its neighbour centroid
    /// per iteration (0.0 to 1.0).
    pub rate: f64,

    /// Whether to evaluate vertices in parallel (default: false).
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            rate: 0.5,
            parallel: false,
        }
    }
}

impl SmoothOptions {
    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the rate, clamped to `[0, 1]`.
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Smooth `mesh` in place and re-derive its normals.
///
/// Topology is untouched. Vertices with no neighbours stay where they are.
/// A zero rate or zero iterations leaves the mesh unchanged.
///
/// # Errors
///
/// Returns the first normal-derivation defect of the smoothed mesh
/// (positions are updated regardless).
pub fn laplacian_smooth(mesh: &mut Mesh, options: &SmoothOptions) -> Result<()> {
    let rate = options.rate.clamp(0.0, 1.0);
    if options.iterations == 0 || rate == 0.0 {
        return Ok(());
    }

    let adjacency = MeshAdjacency::build(mesh.num_vertices(), mesh.triangles());
    let num_vertices = mesh.num_vertices();

    for _ in 0..options.iterations {
        let snapshot = mesh.vertices();
        let new_positions: Vec<Point3<f64>> = if options.parallel {
            (0..num_vertices)
                .into_par_iter()
                .map(|i| laplacian_step(snapshot, adjacency.neighbours(i), i, rate))
                .collect()
        } else {
            (0..num_vertices)
                .map(|i| laplacian_step(snapshot, adjacency.neighbours(i), i, rate))
                .collect()
        };
        mesh.verts = new_positions;
    }
    mesh.geometry_changed();
    debug!(
        "smoothed {} vertices, {} iterations at rate {}",
        num_vertices, options.iterations, rate
    );

    mesh.derive_normals()
}

fn laplacian_step(positions: &[Point3<f64>], neighbours: &[usize], i: usize, rate: f64) -> Point3<f64> {
    let p = positions[i];
    if neighbours.is_empty() {
        return p;
    }
    let sum = neighbours
        .iter()
        .fold(Vector3::zeros(), |acc, &j| acc + positions[j].coords);
    let centroid = Point3::from(sum / neighbours.len() as f64);
    p + (centroid - p) * rate
}
