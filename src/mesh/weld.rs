//! Vertex welding through a spatial hash.
//!
//! Welding merges vertices closer than a tolerance, rewrites triangle
//! indices to the merged set and compacts away vertices that no triangle
//! references. Marching-cubes output and STL files both produce one vertex
//! per triangle corner, so every mesh built from them passes through here.
//!
//! # Example
//!
//! ```
//! use tessellate::mesh::{Mesh, WeldOptions};
//! use nalgebra::Point3;
//!
//! // Two triangles sharing an edge, stored as triangle soup.
//! let soup = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh = Mesh::from_raw(soup, &[[0, 1, 2], [3, 4, 5]]);
//! let report = mesh.merge_verts(&WeldOptions::default()).unwrap();
//! assert_eq!(report.vertices_after, 4);
//! ```

use std::collections::HashMap;

use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use crate::error::Result;
use crate::geom::{BoundBox, DEFAULT_TOLERANCE};

use super::trimesh::Mesh;

/// Options for vertex welding.
#[derive(Debug, Clone)]
pub struct WeldOptions {
    /// Vertices at distance `<= tolerance` are merged.
    pub tolerance: f64,
}

impl Default for WeldOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl WeldOptions {
    /// Set the merge tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.max(0.0);
        self
    }
}

/// Summary of a weld.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeldReport {
    /// Vertex count before welding.
    pub vertices_before: usize,
    /// Vertex count after welding.
    pub vertices_after: usize,
    /// Vertices folded into an earlier coincident vertex.
    pub merged: usize,
    /// Unreferenced vertices removed.
    pub dangling_removed: usize,
    /// Triangles left with fewer than three distinct corners.
    pub degenerate_faces: Vec<usize>,
}

type CellKey = (i64, i64, i64);

/// Uniform-grid bucketing of vertex indices by position.
///
/// Cells are at least `tolerance` wide, so any point within tolerance of a
/// query lies in the query's cell or one of its 26 neighbours.
pub(crate) struct SpatialHash {
    origin: Point3<f64>,
    cell: f64,
    buckets: HashMap<CellKey, Vec<usize>>,
}

impl SpatialHash {
    /// Hash grid over `bbox` sized for roughly one point per cell.
    pub(crate) fn new(bbox: &BoundBox, tolerance: f64, count: usize) -> Self {
        let per_axis = (count.max(1) as f64).cbrt().ceil();
        let mut cell = (bbox.diagonal() / per_axis).max(tolerance);
        if !(cell.is_finite() && cell > 0.0) {
            cell = 1.0;
        }
        Self {
            origin: bbox.min,
            cell,
            buckets: HashMap::with_capacity(count),
        }
    }

    fn key(&self, p: &Point3<f64>) -> CellKey {
        let q: Vector3<f64> = (p - self.origin) / self.cell;
        (q.x.floor() as i64, q.y.floor() as i64, q.z.floor() as i64)
    }

    pub(crate) fn insert(&mut self, p: &Point3<f64>, index: usize) {
        let key = self.key(p);
        self.buckets.entry(key).or_default().push(index);
    }

    /// Lowest inserted index within `tolerance` of `p`.
    pub(crate) fn find(&self, p: &Point3<f64>, tolerance: f64, positions: &[Point3<f64>]) -> Option<usize> {
        let (kx, ky, kz) = self.key(p);
        let mut best: Option<usize> = None;
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = self.buckets.get(&(kx + dx, ky + dy, kz + dz)) else {
                        continue;
                    };
                    for &j in bucket {
                        if (positions[j] - p).norm() <= tolerance && best.map_or(true, |b| j < b) {
                            best = Some(j);
                        }
                    }
                }
            }
        }
        best
    }
}

impl Mesh {
    /// Merge near-duplicate vertices and drop unreferenced ones.
    ///
    /// Vertices are visited in index order; the first of a coincident group
    /// is kept. Triangle count and winding are unchanged. Triangles that
    /// collapse are listed in [`WeldReport::degenerate_faces`] but kept.
    /// Normals are re-derived afterwards; defects found there are logged.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidVertexIndex`](crate::error::MeshError::InvalidVertexIndex)
    /// if a triangle references a missing vertex. The mesh is unchanged in
    /// that case.
    pub fn merge_verts(&mut self, options: &WeldOptions) -> Result<WeldReport> {
        self.check_indices()?;

        let before = self.verts.len();
        let Some(bbox) = self.bounding_box() else {
            return Ok(WeldReport::default());
        };

        let mut hash = SpatialHash::new(&bbox, options.tolerance, before);
        let mut remap = vec![0usize; before];
        let mut kept: Vec<usize> = Vec::with_capacity(before);
        for i in 0..before {
            let p = &self.verts[i];
            match hash.find(p, options.tolerance, &self.verts) {
                Some(canonical) => remap[i] = remap[canonical],
                None => {
                    hash.insert(p, i);
                    remap[i] = kept.len();
                    kept.push(i);
                }
            }
        }
        let merged = before - kept.len();

        let mut referenced = vec![false; kept.len()];
        for t in &mut self.tris {
            t.v = t.v.map(|i| remap[i]);
            for &i in &t.v {
                referenced[i] = true;
            }
        }

        // Compact in first-occurrence order.
        let mut compact = vec![usize::MAX; kept.len()];
        let mut verts = Vec::with_capacity(kept.len());
        for (new, &old) in kept.iter().enumerate() {
            if referenced[new] {
                compact[new] = verts.len();
                verts.push(self.verts[old]);
            }
        }
        let dangling_removed = kept.len() - verts.len();
        for t in &mut self.tris {
            t.v = t.v.map(|i| compact[i]);
        }

        let degenerate_faces: Vec<usize> = self
            .tris
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_degenerate())
            .map(|(f, _)| f)
            .collect();
        if !degenerate_faces.is_empty() {
            warn!("weld left {} degenerate triangles", degenerate_faces.len());
        }

        self.verts = verts;
        self.norms = vec![Vector3::zeros(); self.verts.len()];
        self.geometry_changed();
        if let Err(e) = self.derive_normals() {
            warn!("normals after weld: {}", e);
        }

        let report = WeldReport {
            vertices_before: before,
            vertices_after: self.verts.len(),
            merged,
            dangling_removed,
            degenerate_faces,
        };
        debug!(
            "weld: {} -> {} vertices ({} merged, {} dangling)",
            report.vertices_before, report.vertices_after, report.merged, report.dangling_removed
        );
        Ok(report)
    }

    /// Weld with the tolerance from the mesh configuration.
    pub fn weld(&mut self) -> Result<WeldReport> {
        let options = WeldOptions::default().with_tolerance(self.config().weld_tolerance);
        self.merge_verts(&options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MeshError;
    use crate::mesh::fixtures;

    fn soup_quad() -> Mesh {
        let verts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0 + 1e-9, 0.0),
        ];
        Mesh::from_raw(verts, &[[0, 1, 2], [3, 4, 5]])
    }

    #[test]
    fn test_weld_merges_shared_edge() {
        let mut mesh = soup_quad();
        let report = mesh.weld().unwrap();
        assert_eq!(report.vertices_before, 6);
        assert_eq!(report.vertices_after, 4);
        assert_eq!(report.merged, 2);
        assert_eq!(mesh.triangles()[0].v, [0, 1, 2]);
        assert_eq!(mesh.triangles()[1].v, [1, 3, 2]);
        // First occurrence keeps its position.
        assert_eq!(mesh.vertices()[2], Point3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_weld_is_idempotent() {
        let mut mesh = soup_quad();
        mesh.weld().unwrap();
        let verts = mesh.vertices().to_vec();
        let tris: Vec<_> = mesh.triangles().iter().map(|t| t.v).collect();

        let report = mesh.weld().unwrap();
        assert_eq!(report.merged, 0);
        assert_eq!(report.dangling_removed, 0);
        assert_eq!(mesh.vertices(), &verts[..]);
        let again: Vec<_> = mesh.triangles().iter().map(|t| t.v).collect();
        assert_eq!(again, tris);
    }

    #[test]
    fn test_weld_removes_dangling() {
        let mut mesh = fixtures::duplicate_dangling();
        let before = mesh.num_vertices();
        let report = mesh.weld().unwrap();
        assert!(report.vertices_after < before);
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_triangles(), 4);
    }

    #[test]
    fn test_weld_reports_collapsed_triangle() {
        let verts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0 + 1e-8, 0.0, 0.0),
        ];
        let mut mesh = Mesh::from_raw(verts, &[[0, 1, 2]]);
        let report = mesh.weld().unwrap();
        assert_eq!(report.degenerate_faces, vec![0]);
        assert_eq!(mesh.num_triangles(), 1);
    }

    #[test]
    fn test_weld_rejects_bad_index_and_leaves_mesh() {
        let mut mesh = fixtures::basic_break();
        let verts = mesh.vertices().to_vec();
        let err = mesh.weld().unwrap_err();
        assert!(matches!(err, MeshError::InvalidVertexIndex { .. }));
        assert_eq!(mesh.vertices(), &verts[..]);
    }

    #[test]
    fn test_zero_tolerance_merges_exact_copies_only() {
        let mut mesh = soup_quad();
        let report = mesh.merge_verts(&WeldOptions::default().with_tolerance(0.0)).unwrap();
        assert_eq!(report.vertices_after, 5);
    }

    #[test]
    fn test_spatial_hash_neighbour_cells() {
        let pts = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0)];
        let bbox = BoundBox::from_points(&pts).unwrap();
        let mut hash = SpatialHash::new(&bbox, 0.5, pts.len());
        hash.insert(&pts[0], 0);
        hash.insert(&pts[1], 1);
        let query = Point3::new(9.8, 10.0, 10.1);
        assert_eq!(hash.find(&query, 0.5, &pts), Some(1));
        assert_eq!(hash.find(&Point3::new(5.0, 5.0, 5.0), 0.5, &pts), None);
    }
}
