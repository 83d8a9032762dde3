//! Mesh and voxel-grid file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | STL | `.stl` | ✓ | ✓ | Binary only |
//! | Voxel grid | `.grid`, `.txt` | ✓ | ✗ | Loaded through marching cubes |
//!
//! # Usage
//!
//! ```no_run
//! use tessellate::io::{load, save};
//!
//! // A voxel grid is surfaced with default marching-cubes options.
//! let mesh = load("part.grid").unwrap();
//! save(&mesh, "part.stl").unwrap();
//! ```

pub mod grid;
pub mod stl;

use std::path::Path;

use crate::algo::march::{marching_cubes, MarchOptions};
use crate::error::{MeshError, Result};
use crate::mesh::Mesh;

/// Supported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Binary STL.
    Stl,
    /// Voxel grid text.
    Grid,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            "grid" | "txt" => Some(Format::Grid),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::load(path),
        Format::Grid => {
            let grid = grid::read_grid(path)?;
            marching_cubes(&grid, &MarchOptions::default())
        }
    }
}

/// Save a mesh with automatic format detection.
pub fn save<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::save(mesh, path),
        Format::Grid => Err(MeshError::save(path, "meshes cannot be written as voxel grids")),
    }
}
