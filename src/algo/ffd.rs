//! Free-form deformation.
//!
//! The control lattice lives outside this crate; all the mesh needs from it
//! is a point-to-point mapping, expressed by [`Deformer`]. Closures
//! implement it directly.
//!
//! The first deformation captures the undeformed vertex positions as the
//! mesh's base. Later deformations map the base rather than the current
//! positions, so editing the lattice and re-applying it never compounds.
//!
//! # Example
//!
//! ```
//! use tessellate::algo::ffd::apply_ffd;
//! use tessellate::mesh::fixtures;
//! use nalgebra::Point3;
//!
//! let mut mesh = fixtures::unit_cube();
//! let stretch = |p: &Point3<f64>| Point3::new(p.x * 2.0, p.y, p.z);
//! apply_ffd(&mut mesh, &stretch).unwrap();
//! apply_ffd(&mut mesh, &stretch).unwrap(); // still 2x, not 4x
//! assert_eq!(mesh.bounding_box().unwrap().max.x, 2.0);
//!
//! mesh.reset_deformation().unwrap();
//! assert_eq!(mesh.bounding_box().unwrap().max.x, 1.0);
//! ```

use log::debug;
use nalgebra::Point3;

use crate::error::Result;
use crate::mesh::Mesh;

/// A spatial deformation.
pub trait Deformer {
    /// Where `p` moves to.
    fn displace(&self, p: &Point3<f64>) -> Point3<f64>;
}

impl<F> Deformer for F
where
    F: Fn(&Point3<f64>) -> Point3<f64>,
{
    fn displace(&self, p: &Point3<f64>) -> Point3<f64> {
        self(p)
    }
}

/// Deform every vertex and re-derive face and vertex normals.
///
/// # Errors
///
/// Returns the first normal defect of the deformed mesh (for example a
/// deformation that flattens a triangle). Positions are updated regardless.
pub fn apply_ffd<D: Deformer + ?Sized>(mesh: &mut Mesh, deformer: &D) -> Result<()> {
    let base = mesh.base.get_or_insert_with(|| mesh.verts.clone());
    let deformed: Vec<Point3<f64>> = base.iter().map(|p| deformer.displace(p)).collect();
    mesh.replace_positions(deformed);
    debug!("deformed {} vertices", mesh.num_vertices());
    mesh.derive_normals()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    struct Shift(Vector3<f64>);

    impl Deformer for Shift {
        fn displace(&self, p: &Point3<f64>) -> Point3<f64> {
            p + self.0
        }
    }

    #[test]
    fn test_deformation_uses_base() {
        let mut mesh = fixtures::valid_tet();
        let original = mesh.vertices().to_vec();

        apply_ffd(&mut mesh, &Shift(Vector3::new(1.0, 0.0, 0.0))).unwrap();
        apply_ffd(&mut mesh, &Shift(Vector3::new(0.0, 2.0, 0.0))).unwrap();

        assert_eq!(mesh.base().unwrap(), &original[..]);
        for (p, q) in mesh.vertices().iter().zip(&original) {
            assert_relative_eq!(*p, q + Vector3::new(0.0, 2.0, 0.0));
        }
    }

    #[test]
    fn test_normals_follow_deformation() {
        let mut mesh = fixtures::unit_cube();
        let stretch = |p: &Point3<f64>| Point3::new(p.x, p.y, p.z * 3.0);
        apply_ffd(&mut mesh, &stretch).unwrap();
        let top = mesh
            .triangles()
            .iter()
            .find(|t| t.v == [4, 5, 6])
            .unwrap();
        assert_relative_eq!(top.n, Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_flattening_reports_degenerate() {
        let mut mesh = fixtures::valid_tet();
        let flatten = |p: &Point3<f64>| Point3::new(p.x, p.y, 0.0);
        assert!(apply_ffd(&mut mesh, &flatten).is_err());
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn test_other_mutation_drops_base() {
        let mut mesh = fixtures::valid_tet();
        apply_ffd(&mut mesh, &Shift(Vector3::new(1.0, 0.0, 0.0))).unwrap();
        assert!(mesh.base().is_some());
        mesh.box_fit(1.0).unwrap();
        assert!(mesh.base().is_none());
        assert!(!mesh.reset_deformation().unwrap());
    }
}
