//! Mesh processing algorithms.
//!
//! - **March**: surface extraction from voxel volumes (marching cubes and
//!   exposed voxel faces)
//! - **Smoothing**: Laplacian smoothing
//! - **FFD**: applying an external free-form deformation
//! - **Accel**: bounding-sphere acceleration and point containment

pub mod accel;
pub mod ffd;
pub mod march;
pub mod smooth;
