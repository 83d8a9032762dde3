//! # Tessellate
//!
//! Triangle mesh construction, repair, validation and deformation.
//!
//! Tessellate turns voxel volumes into welded, validated triangle meshes and
//! provides the operations needed around that: normal derivation, Laplacian
//! smoothing, free-form deformation, point containment and binary STL I/O.
//!
//! ## Features
//!
//! - **Indexed triangle mesh** with per-vertex normals, transform and colour
//! - **Vertex welding** through a spatial hash with an explicit tolerance
//! - **Validity checks**: basic, two-manifold and connectivity
//! - **Surface extraction**: marching cubes and exposed voxel faces
//! - **Point containment** by ray parity, optionally bounding-sphere accelerated
//! - **File formats**: binary STL, voxel grid text
//!
//! ## Quick Start
//!
//! ```
//! use tessellate::prelude::*;
//!
//! let mut grid = VoxelGrid::new(4, 4, 4).unwrap();
//! for x in 1..3 {
//!     grid.set(x, 1, 1, true).unwrap();
//! }
//!
//! let mut mesh = marching_cubes(&grid, &MarchOptions::default()).unwrap();
//! assert!(mesh.basic_validity());
//! assert!(mesh.manifold_validity());
//!
//! laplacian_smooth(&mut mesh, &SmoothOptions::default().with_iterations(2)).unwrap();
//! assert!(mesh.connection_validity());
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use tessellate::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(0.0, 0.0, 1.0),
//! ];
//! let faces = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];
//!
//! let mesh = Mesh::from_triangles(vertices, &faces).unwrap();
//! assert!(mesh.point_containment(&Point3::new(0.1, 0.1, 0.1)));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod geom;
pub mod io;
pub mod mesh;
pub mod render;
pub mod shape;
pub mod voxel;

/// Prelude module for convenient imports.
///
/// ```
/// use tessellate::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::ffd::{apply_ffd, Deformer};
    pub use crate::algo::march::{marching_cubes, Extraction, MarchOptions};
    pub use crate::algo::smooth::{laplacian_smooth, SmoothOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::geom::BoundBox;
    pub use crate::mesh::{Mesh, MeshConfig, Transform, Triangle, Violation, WeldOptions, WeldReport};
    pub use crate::render::{RenderVertex, ShapeGeometry};
    pub use crate::shape::{Cube, Cylinder, Shape, Sphere};
    pub use crate::voxel::{VoxelGrid, VoxelVolume};
}

// Re-export nalgebra types for convenience
pub use nalgebra;
