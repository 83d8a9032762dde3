//! Surface extraction from voxel volumes.
//!
//! Two extractors are provided:
//!
//! - [`Extraction::MarchingCubes`]: classic marching cubes over samples at
//!   voxel centres. Each cell of 2×2×2 samples is classified into one of 256
//!   corner configurations and triangulated from lookup tables; vertices sit
//!   at edge midpoints. Cells extend one sample past the grid on every side,
//!   so the surface closes where occupied voxels touch the grid boundary.
//! - [`Extraction::VoxelFaces`]: one quad (two triangles) per voxel face
//!   that separates an occupied voxel from an empty one.
//!
//! Both emit a triangle soup that [`marching_cubes`] then welds.
//!
//! # Example
//!
//! ```
//! use tessellate::algo::march::{marching_cubes, MarchOptions};
//! use tessellate::voxel::VoxelGrid;
//!
//! let mut grid = VoxelGrid::new(3, 3, 3).unwrap();
//! grid.set(1, 1, 1, true).unwrap();
//!
//! let mesh = marching_cubes(&grid, &MarchOptions::default()).unwrap();
//! assert_eq!(mesh.num_triangles(), 8);
//! assert_eq!(mesh.num_vertices(), 6);
//! ```

mod tables;

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::error::Result;
use crate::geom::DEFAULT_TOLERANCE;
use crate::mesh::{Mesh, WeldOptions};
use crate::voxel::VoxelVolume;

use tables::{CORNER_OFFSETS, EDGE_CONNECTIONS, EDGE_TABLE, TRI_TABLE};

/// Surface extraction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Extraction {
    /// Marching cubes over voxel-centre samples.
    #[default]
    MarchingCubes,
    /// Exposed voxel faces.
    ///
    /// Two filled voxels that meet only along an edge leave that edge shared
    /// by four triangles, so such output fails the manifold check.
    VoxelFaces,
}

/// Options for surface extraction.
#[derive(Debug, Clone)]
pub struct MarchOptions {
    /// Extraction method.
    pub extraction: Extraction,

    /// Tolerance for welding the emitted soup.
    pub weld_tolerance: f64,
}

impl Default for MarchOptions {
    fn default() -> Self {
        Self {
            extraction: Extraction::MarchingCubes,
            weld_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl MarchOptions {
    /// Set the extraction method.
    pub fn with_extraction(mut self, extraction: Extraction) -> Self {
        self.extraction = extraction;
        self
    }

    /// Set the weld tolerance.
    pub fn with_weld_tolerance(mut self, tolerance: f64) -> Self {
        self.weld_tolerance = tolerance.max(0.0);
        self
    }
}

/// Extract, weld and derive normals.
///
/// # Errors
///
/// Propagates weld failures; normal defects in the output are logged.
pub fn marching_cubes<V: VoxelVolume + ?Sized>(volume: &V, options: &MarchOptions) -> Result<Mesh> {
    let mut mesh = extract_raw(volume, options);
    let weld = WeldOptions::default().with_tolerance(options.weld_tolerance);
    mesh.merge_verts(&weld)?;
    debug!(
        "{:?}: {} vertices, {} triangles",
        options.extraction,
        mesh.num_vertices(),
        mesh.num_triangles()
    );
    Ok(mesh)
}

/// Extract an unwelded triangle soup (three fresh vertices per triangle,
/// zero normals).
pub fn extract_raw<V: VoxelVolume + ?Sized>(volume: &V, options: &MarchOptions) -> Mesh {
    let mut soup = Soup::default();
    match options.extraction {
        Extraction::MarchingCubes => march_cells(volume, &mut soup),
        Extraction::VoxelFaces => voxel_faces(volume, &mut soup),
    }
    debug!("extracted {} raw triangles", soup.faces.len());
    Mesh::from_raw(soup.verts, &soup.faces)
}

#[derive(Default)]
struct Soup {
    verts: Vec<Point3<f64>>,
    faces: Vec<[usize; 3]>,
}

impl Soup {
    fn push(&mut self, a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) {
        let i = self.verts.len();
        self.verts.extend([a, b, c]);
        self.faces.push([i, i + 1, i + 2]);
    }
}

fn march_cells<V: VoxelVolume + ?Sized>(volume: &V, soup: &mut Soup) {
    let [nx, ny, nz] = volume.dimensions().map(|d| d as i64);

    for z in -1..nz {
        for y in -1..ny {
            for x in -1..nx {
                let corner = |i: usize| {
                    let [dx, dy, dz] = CORNER_OFFSETS[i].map(|d| d as i64);
                    (x + dx, y + dy, z + dz)
                };

                let mut config = 0usize;
                for i in 0..8 {
                    let (cx, cy, cz) = corner(i);
                    if volume.occupied_signed(cx, cy, cz) {
                        config |= 1 << i;
                    }
                }
                if EDGE_TABLE[config] == 0 {
                    continue;
                }

                // Midpoint of two sample centres. Depends only on the two
                // samples, so every cell sharing an edge gets the same point.
                let edge_point = |e: usize| {
                    let [c0, c1] = EDGE_CONNECTIONS[e];
                    let (ax, ay, az) = corner(c0);
                    let (bx, by, bz) = corner(c1);
                    nalgebra::center(&volume.voxel_center(ax, ay, az), &volume.voxel_center(bx, by, bz))
                };

                for tri in TRI_TABLE[config].chunks(3) {
                    if tri[0] < 0 {
                        break;
                    }
                    let [a, b, c] = [tri[0], tri[1], tri[2]].map(|e| edge_point(e as usize));
                    // Table winding faces inward.
                    soup.push(a, c, b);
                }
            }
        }
    }
}

fn voxel_faces<V: VoxelVolume + ?Sized>(volume: &V, soup: &mut Soup) {
    let [nx, ny, nz] = volume.dimensions();
    let origin = volume.origin();
    let size = volume.cell_size();

    for z in 0..nz {
        for y in 0..ny {
            for x in 0..nx {
                if !volume.occupied(x, y, z) {
                    continue;
                }
                let cell = [x as i64, y as i64, z as i64];
                for axis in 0..3 {
                    for sign in [1i64, -1] {
                        let mut n = cell;
                        n[axis] += sign;
                        if volume.occupied_signed(n[0], n[1], n[2]) {
                            continue;
                        }

                        let mut u = Vector3::ith((axis + 1) % 3, 1.0);
                        let mut v = Vector3::ith((axis + 2) % 3, 1.0);
                        let mut base = Vector3::new(x as f64, y as f64, z as f64);
                        if sign > 0 {
                            base[axis] += 1.0;
                        } else {
                            std::mem::swap(&mut u, &mut v);
                        }
                        let corner = |offset: Vector3<f64>| origin + (base + offset) * size;
                        let p0 = corner(Vector3::zeros());
                        let p1 = corner(u);
                        let p2 = corner(u + v);
                        let p3 = corner(v);
                        soup.push(p0, p1, p2);
                        soup.push(p0, p2, p3);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxel::VoxelGrid;
    use approx::assert_relative_eq;

    fn single_voxel() -> VoxelGrid {
        let mut grid = VoxelGrid::new(1, 1, 1).unwrap();
        grid.set(0, 0, 0, true).unwrap();
        grid
    }

    fn assert_outward(mesh: &Mesh, center: Point3<f64>) {
        for (f, t) in mesh.triangles().iter().enumerate() {
            let [a, b, c] = mesh.triangle_positions(f).unwrap();
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            assert!(t.n.dot(&(centroid - center)) > 0.0, "face {} points inward", f);
        }
    }

    #[test]
    fn test_single_voxel_octahedron() {
        let mesh = marching_cubes(&single_voxel(), &MarchOptions::default()).unwrap();
        assert_eq!(mesh.num_triangles(), 8);
        assert_eq!(mesh.num_vertices(), 6);
        assert!(mesh.basic_validity());
        assert!(mesh.manifold_validity());
        assert!(mesh.connection_validity());
        assert_outward(&mesh, Point3::new(0.5, 0.5, 0.5));

        let bbox = mesh.bounding_box().unwrap();
        assert_relative_eq!(bbox.min, Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(bbox.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_single_voxel_faces_cube() {
        let options = MarchOptions::default().with_extraction(Extraction::VoxelFaces);
        let mesh = marching_cubes(&single_voxel(), &options).unwrap();
        assert_eq!(mesh.num_triangles(), 12);
        assert_eq!(mesh.num_vertices(), 8);
        assert!(mesh.basic_validity());
        assert!(mesh.manifold_validity());
        assert_outward(&mesh, Point3::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn test_raw_output_is_unwelded() {
        let raw = extract_raw(&single_voxel(), &MarchOptions::default());
        assert_eq!(raw.num_triangles(), 8);
        assert_eq!(raw.num_vertices(), 24);
    }

    #[test]
    fn test_empty_volume() {
        let grid = VoxelGrid::new(4, 4, 4).unwrap();
        let mesh = marching_cubes(&grid, &MarchOptions::default()).unwrap();
        assert!(mesh.is_empty());
        assert_eq!(mesh.num_vertices(), 0);
    }

    #[test]
    fn test_block_is_closed_manifold() {
        let mut grid = VoxelGrid::new(4, 4, 4).unwrap().with_cell_size(0.5).unwrap();
        for z in 1..3 {
            for y in 1..3 {
                for x in 1..3 {
                    grid.set(x, y, z, true).unwrap();
                }
            }
        }
        for extraction in [Extraction::MarchingCubes, Extraction::VoxelFaces] {
            let options = MarchOptions::default().with_extraction(extraction);
            let mesh = marching_cubes(&grid, &options).unwrap();
            assert!(mesh.basic_validity(), "{:?}", extraction);
            assert!(mesh.manifold_validity(), "{:?}", extraction);
            assert!(mesh.connection_validity(), "{:?}", extraction);
            // Sphere topology: V - E + F = 2 with E = 3F / 2.
            let v = mesh.num_vertices() as i64;
            let f = mesh.num_triangles() as i64;
            assert_eq!(v - 3 * f / 2 + f, 2, "{:?}", extraction);
            assert_outward(&mesh, Point3::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn test_voxel_faces_edge_contact_is_non_manifold() {
        let mut grid = VoxelGrid::new(2, 2, 1).unwrap();
        grid.set(0, 0, 0, true).unwrap();
        grid.set(1, 1, 0, true).unwrap();
        let options = MarchOptions::default().with_extraction(Extraction::VoxelFaces);
        let mesh = marching_cubes(&grid, &options).unwrap();
        assert_eq!(mesh.num_triangles(), 24);
        assert!(matches!(
            mesh.check_manifold(),
            Err(crate::mesh::Violation::NonManifoldEdge { faces: 4, .. })
        ));
    }

    #[test]
    fn test_voxel_on_grid_boundary_closes() {
        let mut grid = VoxelGrid::new(2, 1, 1).unwrap();
        grid.set(0, 0, 0, true).unwrap();
        grid.set(1, 0, 0, true).unwrap();
        let mesh = marching_cubes(&grid, &MarchOptions::default()).unwrap();
        assert!(mesh.manifold_validity());
    }
}
