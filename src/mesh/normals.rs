//! Face and vertex normal derivation.

use log::debug;
use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::geom::{triangle_normal, vectors_equal};

use super::trimesh::Mesh;

/// Outward unit normal of a counter-clockwise triangle, `None` if degenerate.
///
/// `n = (p2 - p1) × (p3 - p1)`, normalised. Invariant under cyclic rotation
/// of the corners; flips under reversal.
pub fn face_normal(p1: &Point3<f64>, p2: &Point3<f64>, p3: &Point3<f64>) -> Option<Vector3<f64>> {
    triangle_normal(p1, p2, p3)
}

/// A set of unit normals, deduplicated within a tolerance.
#[derive(Debug, Clone, Default)]
pub struct NormalPool {
    normals: Vec<Vector3<f64>>,
    tolerance: f64,
}

impl NormalPool {
    /// Empty pool.
    pub fn new(tolerance: f64) -> Self {
        Self {
            normals: Vec::new(),
            tolerance,
        }
    }

    /// Add `n` unless an equal normal is present; returns its slot.
    pub fn insert(&mut self, n: Vector3<f64>) -> usize {
        if let Some(i) = self.find(&n) {
            return i;
        }
        self.normals.push(n);
        self.normals.len() - 1
    }

    /// Slot of a normal equal to `n`.
    pub fn find(&self, n: &Vector3<f64>) -> Option<usize> {
        self.normals
            .iter()
            .position(|m| vectors_equal(m, n, self.tolerance))
    }

    /// Number of distinct normals.
    pub fn len(&self) -> usize {
        self.normals.len()
    }

    /// True if the pool is empty.
    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }

    /// The distinct normals in insertion order.
    pub fn as_slice(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Set equality, ignoring insertion order.
    pub fn same_set(&self, other: &NormalPool) -> bool {
        self.len() == other.len() && self.normals.iter().all(|n| other.find(n).is_some())
    }
}

impl Mesh {
    /// Recompute every triangle's cached normal from current positions.
    ///
    /// All triangles are processed; a degenerate one gets a zero normal.
    ///
    /// # Errors
    ///
    /// The first defect found: [`MeshError::InvalidVertexIndex`] or
    /// [`MeshError::DegenerateNormal`].
    pub fn derive_face_norms(&mut self) -> Result<()> {
        let mut first: Option<MeshError> = None;
        for face in 0..self.tris.len() {
            let v = self.tris[face].v;
            let corners = (self.verts.get(v[0]), self.verts.get(v[1]), self.verts.get(v[2]));
            let n = match corners {
                (Some(a), Some(b), Some(c)) => match face_normal(a, b, c) {
                    Some(n) => n,
                    None => {
                        first.get_or_insert(MeshError::DegenerateNormal { face });
                        Vector3::zeros()
                    }
                },
                _ => {
                    let vertex = v.into_iter().find(|&i| i >= self.verts.len()).unwrap_or(v[0]);
                    first.get_or_insert(MeshError::InvalidVertexIndex { face, vertex });
                    Vector3::zeros()
                }
            };
            self.tris[face].n = n;
        }
        match first {
            Some(e) => {
                debug!("face normals: {}", e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Set each vertex normal to the normalised average of its incident face
    /// normals. Uses the cached face normals.
    ///
    /// # Errors
    ///
    /// [`MeshError::DanglingVertex`] for a vertex with no incident triangle,
    /// [`MeshError::ZeroVertexNormal`] when incident normals cancel. Every
    /// vertex is still assigned (zero for defective ones).
    pub fn derive_vert_norms(&mut self) -> Result<()> {
        let n = self.verts.len();
        let mut sum = vec![Vector3::zeros(); n];
        let mut count = vec![0usize; n];
        for t in &self.tris {
            for &i in &t.v {
                if i < n {
                    sum[i] += t.n;
                    count[i] += 1;
                }
            }
        }

        let mut first: Option<MeshError> = None;
        self.norms = sum
            .into_iter()
            .zip(count)
            .enumerate()
            .map(|(vertex, (s, c))| {
                if c == 0 {
                    first.get_or_insert(MeshError::DanglingVertex { vertex });
                    return Vector3::zeros();
                }
                let avg = s / c as f64;
                match avg.try_normalize(f64::EPSILON) {
                    Some(u) => u,
                    None => {
                        first.get_or_insert(MeshError::ZeroVertexNormal { vertex });
                        Vector3::zeros()
                    }
                }
            })
            .collect();

        match first {
            Some(e) => {
                debug!("vertex normals: {}", e);
                Err(e)
            }
            None => Ok(()),
        }
    }

    /// Derive face normals, then vertex normals.
    ///
    /// Both passes always run; the first error is returned.
    pub fn derive_normals(&mut self) -> Result<()> {
        let faces = self.derive_face_norms();
        let verts = self.derive_vert_norms();
        faces.and(verts)
    }

    /// The distinct face normals of the mesh.
    pub fn distinct_face_normals(&self, tolerance: f64) -> NormalPool {
        let mut pool = NormalPool::new(tolerance);
        for t in &self.tris {
            pool.insert(t.n);
        }
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures;
    use approx::assert_relative_eq;

    #[test]
    fn test_face_normal_rotation_and_reversal() {
        let a = Point3::new(0.3, -1.0, 2.0);
        let b = Point3::new(1.5, 0.2, 0.1);
        let c = Point3::new(-0.4, 0.9, 1.1);
        let n = face_normal(&a, &b, &c).unwrap();
        assert_relative_eq!(face_normal(&b, &c, &a).unwrap(), n, epsilon = 1e-12);
        assert_relative_eq!(face_normal(&c, &a, &b).unwrap(), n, epsilon = 1e-12);
        assert_relative_eq!(face_normal(&a, &c, &b).unwrap(), -n, epsilon = 1e-12);
        assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tet_normals_point_outward() {
        let mesh = fixtures::valid_tet();
        let centroid = mesh
            .vertices()
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords)
            / mesh.num_vertices() as f64;
        for (f, t) in mesh.triangles().iter().enumerate() {
            let [a, _, _] = mesh.triangle_positions(f).unwrap();
            assert!(t.n.dot(&(a.coords - centroid)) > 0.0, "face {} points inward", f);
        }
        for (v, n) in mesh.normals().iter().enumerate() {
            assert!(n.dot(&(mesh.vertices()[v].coords - centroid)) > 0.0);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_degenerate_face_reported() {
        let verts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mut mesh = Mesh::from_raw(verts, &[[0, 1, 2]]);
        let err = mesh.derive_face_norms().unwrap_err();
        assert!(matches!(err, MeshError::DegenerateNormal { face: 0 }));
        assert_eq!(mesh.triangles()[0].n, Vector3::zeros());
    }

    #[test]
    fn test_dangling_vertex_reported() {
        let mut mesh = fixtures::valid_tet();
        mesh.add_vertex(Point3::new(5.0, 5.0, 5.0));
        let err = mesh.derive_normals().unwrap_err();
        assert!(matches!(err, MeshError::DanglingVertex { vertex: 4 }));
        assert_eq!(mesh.normals()[4], Vector3::zeros());
    }

    #[test]
    fn test_cancelling_normals_reported() {
        // Two copies of one triangle with opposite winding.
        let verts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut mesh = Mesh::from_raw(verts, &[[0, 1, 2], [0, 2, 1]]);
        mesh.derive_face_norms().unwrap();
        let err = mesh.derive_vert_norms().unwrap_err();
        assert!(matches!(err, MeshError::ZeroVertexNormal { vertex: 0 }));
    }

    #[test]
    fn test_normal_pool_order_independent() {
        let mesh = fixtures::unit_cube();
        let pool = mesh.distinct_face_normals(1e-9);
        assert_eq!(pool.len(), 6);

        let mut reordered = NormalPool::new(1e-9);
        for t in mesh.triangles().iter().rev() {
            reordered.insert(t.n);
        }
        assert!(pool.same_set(&reordered));
    }
}
