//! Core mesh data structures.
//!
//! The primary type is [`Mesh`], an indexed triangle mesh: a flat vertex
//! array, triangles referencing it by index, per-vertex normals, a model
//! transform and colour. Welding, normal derivation and validity checks are
//! methods on `Mesh`, split across the submodules here.
//!
//! # Construction
//!
//! ```
//! use tessellate::mesh::Mesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = Mesh::from_triangles(vertices, &[[0, 1, 2]]).unwrap();
//! assert!(mesh.basic_validity());
//! assert!(!mesh.manifold_validity()); // open: three boundary edges
//! ```

mod adjacency;
pub mod fixtures;
mod normals;
mod triangle;
mod trimesh;
mod validity;
mod weld;

pub use adjacency::MeshAdjacency;
pub use normals::{face_normal, NormalPool};
pub use triangle::{same_edge, Edge, EdgeMatch, Triangle};
pub use trimesh::{Mesh, MeshConfig, Transform};
pub use validity::Violation;
pub use weld::{WeldOptions, WeldReport};
