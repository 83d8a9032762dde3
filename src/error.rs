//! Error types for tessellate.
//!
//! Operations that can fail outright (file I/O, parameter checks, normal
//! derivation over defective geometry) return [`MeshError`]. Structural
//! validity checks report a [`Violation`](crate::mesh::Violation) instead,
//! since a failed check leaves the mesh fully usable.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A triangle references a vertex outside the vertex list.
    #[error("triangle {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A vertex is referenced by no triangle, so it has no normal.
    #[error("vertex {vertex} is dangling (no incident triangles)")]
    DanglingVertex {
        /// The vertex index.
        vertex: usize,
    },

    /// A triangle has zero area, so its normal is undefined.
    #[error("triangle {face} has a zero-length normal")]
    DegenerateNormal {
        /// The triangle index.
        face: usize,
    },

    /// The incident face normals of a vertex cancel out.
    #[error("vertex {vertex} has a zero-length averaged normal")]
    ZeroVertexNormal {
        /// The vertex index.
        vertex: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading a mesh or grid from file.
    #[error("failed to load {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving a mesh or grid to file.
    #[error("failed to save {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Malformed voxel grid text.
    #[error("invalid voxel grid at line {line}: {message}")]
    InvalidGrid {
        /// 1-based line number where parsing failed.
        line: usize,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MeshError::LoadError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn save(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        MeshError::SaveError {
            path: path.into(),
            message: message.into(),
        }
    }
}
