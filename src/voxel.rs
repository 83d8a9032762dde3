//! Voxel occupancy volumes.
//!
//! [`VoxelVolume`] is the read-only view the surface extractors consume;
//! [`VoxelGrid`] is a dense implementation backed by a bit per voxel.

use nalgebra::Point3;

use crate::error::{MeshError, Result};

/// A regular grid of occupied/empty voxels.
pub trait VoxelVolume {
    /// Voxel counts along x, y and z.
    fn dimensions(&self) -> [usize; 3];

    /// Whether voxel `(x, y, z)` is filled. Out-of-range voxels are empty.
    fn occupied(&self, x: usize, y: usize, z: usize) -> bool;

    /// Edge length of one voxel.
    fn cell_size(&self) -> f64;

    /// Position of the grid's minimum corner.
    fn origin(&self) -> Point3<f64>;

    /// Centre of voxel `(x, y, z)`, also valid for indices just outside the grid.
    fn voxel_center(&self, x: i64, y: i64, z: i64) -> Point3<f64> {
        let s = self.cell_size();
        self.origin() + nalgebra::Vector3::new(x as f64 + 0.5, y as f64 + 0.5, z as f64 + 0.5) * s
    }

    /// Occupancy with signed indices; anything outside the grid is empty.
    fn occupied_signed(&self, x: i64, y: i64, z: i64) -> bool {
        let [nx, ny, nz] = self.dimensions();
        if x < 0 || y < 0 || z < 0 {
            return false;
        }
        let (x, y, z) = (x as usize, y as usize, z as usize);
        x < nx && y < ny && z < nz && self.occupied(x, y, z)
    }
}

/// Dense voxel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    dims: [usize; 3],
    cells: Vec<bool>,
    cell_size: f64,
    origin: Point3<f64>,
}

impl VoxelGrid {
    /// Empty grid with unit cells at the origin.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] if a dimension is zero or the
    /// voxel count cannot be allocated.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Result<Self> {
        let dims = || format!("{}x{}x{}", nx, ny, nz);
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(MeshError::invalid_param(
                "dimensions",
                dims(),
                "every dimension must be positive",
            ));
        }
        let count = nx
            .checked_mul(ny)
            .and_then(|n| n.checked_mul(nz))
            .ok_or_else(|| MeshError::invalid_param("dimensions", dims(), "voxel count overflows"))?;
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(count)
            .map_err(|_| MeshError::invalid_param("dimensions", dims(), "too many voxels"))?;
        cells.resize(count, false);
        Ok(Self {
            dims: [nx, ny, nz],
            cells,
            cell_size: 1.0,
            origin: Point3::origin(),
        })
    }

    /// Set the voxel edge length.
    pub fn with_cell_size(mut self, cell_size: f64) -> Result<Self> {
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(MeshError::invalid_param("cell_size", cell_size, "must be positive"));
        }
        self.cell_size = cell_size;
        Ok(self)
    }

    /// Set the grid origin.
    pub fn with_origin(mut self, origin: Point3<f64>) -> Self {
        self.origin = origin;
        self
    }

    fn index(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        let [nx, ny, nz] = self.dims;
        (x < nx && y < ny && z < nz).then(|| (z * ny + y) * nx + x)
    }

    /// Fill or clear voxel `(x, y, z)`.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] for an out-of-range voxel.
    pub fn set(&mut self, x: usize, y: usize, z: usize, filled: bool) -> Result<()> {
        let i = self
            .index(x, y, z)
            .ok_or_else(|| MeshError::invalid_param("voxel", format!("({}, {}, {})", x, y, z), "out of range"))?;
        self.cells[i] = filled;
        Ok(())
    }

    /// Number of filled voxels.
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

impl VoxelVolume for VoxelGrid {
    fn dimensions(&self) -> [usize; 3] {
        self.dims
    }

    fn occupied(&self, x: usize, y: usize, z: usize) -> bool {
        self.index(x, y, z).is_some_and(|i| self.cells[i])
    }

    fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn origin(&self) -> Point3<f64> {
        self.origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_query() {
        let mut grid = VoxelGrid::new(3, 2, 2).unwrap();
        grid.set(2, 1, 0, true).unwrap();
        assert!(grid.occupied(2, 1, 0));
        assert!(!grid.occupied(0, 0, 0));
        assert!(!grid.occupied(3, 0, 0));
        assert!(!grid.occupied_signed(-1, 0, 0));
        assert_eq!(grid.filled_count(), 1);
        assert!(grid.set(0, 2, 0, true).is_err());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(VoxelGrid::new(0, 1, 1).is_err());
        assert!(VoxelGrid::new(1, 1, 1).unwrap().with_cell_size(-1.0).is_err());
    }

    #[test]
    fn test_rejects_overflowing_dimensions() {
        let err = VoxelGrid::new(usize::MAX, 2, 1).unwrap_err();
        assert!(matches!(err, MeshError::InvalidParameter { name: "dimensions", .. }));
        assert!(VoxelGrid::new(1 << 32, 1 << 32, 2).is_err());
    }

    #[test]
    fn test_voxel_center() {
        let grid = VoxelGrid::new(2, 2, 2)
            .unwrap()
            .with_cell_size(0.5)
            .unwrap()
            .with_origin(Point3::new(1.0, 0.0, 0.0));
        assert_eq!(grid.voxel_center(0, 0, 0), Point3::new(1.25, 0.25, 0.25));
        assert_eq!(grid.voxel_center(-1, 0, 0), Point3::new(0.75, 0.25, 0.25));
    }
}
