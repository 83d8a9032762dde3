//! Property-based tests for vertex welding.
//!
//! Positions are drawn from a coarse integer lattice so that coincident
//! vertices are common.
//!
//! Run with: cargo test --test weld_props

use nalgebra::Point3;
use proptest::prelude::*;
use tessellate::mesh::{Mesh, WeldOptions};

// =============================================================================
// Strategies
// =============================================================================

fn arb_lattice_point() -> impl Strategy<Value = Point3<f64>> {
    prop::array::uniform3(0..4i32).prop_map(|[x, y, z]| Point3::new(x as f64, y as f64, z as f64))
}

/// A triangle soup whose indices are always in range.
fn arb_soup(max_vertices: usize, max_faces: usize) -> impl Strategy<Value = Mesh> {
    (3..=max_vertices).prop_flat_map(move |n| {
        let verts = prop::collection::vec(arb_lattice_point(), n);
        let faces = prop::collection::vec(prop::array::uniform3(0..n), 1..=max_faces);
        (verts, faces).prop_map(|(verts, faces)| Mesh::from_raw(verts, &faces))
    })
}

fn positions_of_faces(mesh: &Mesh) -> Vec<[Point3<f64>; 3]> {
    mesh.triangles()
        .iter()
        .map(|t| t.v.map(|i| mesh.vertices()[i]))
        .collect()
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn proptest_weld_keeps_triangle_count(mut mesh in arb_soup(40, 30)) {
        let before = mesh.num_triangles();
        mesh.merge_verts(&WeldOptions::default()).unwrap();
        prop_assert_eq!(mesh.num_triangles(), before);
    }

    #[test]
    fn proptest_weld_never_adds_vertices(mut mesh in arb_soup(40, 30)) {
        let before = mesh.num_vertices();
        let report = mesh.merge_verts(&WeldOptions::default()).unwrap();
        prop_assert!(mesh.num_vertices() <= before);
        prop_assert_eq!(report.vertices_before, before);
        prop_assert_eq!(report.vertices_after, mesh.num_vertices());
        prop_assert_eq!(before - report.merged - report.dangling_removed, mesh.num_vertices());
    }

    #[test]
    fn proptest_weld_indices_in_range(mut mesh in arb_soup(40, 30)) {
        mesh.merge_verts(&WeldOptions::default()).unwrap();
        let n = mesh.num_vertices();
        for t in mesh.triangles() {
            prop_assert!(t.v.iter().all(|&i| i < n));
        }
        prop_assert_eq!(mesh.normals().len(), n);
    }

    #[test]
    fn proptest_weld_preserves_corner_positions(mut mesh in arb_soup(40, 30)) {
        let before = positions_of_faces(&mesh);
        mesh.merge_verts(&WeldOptions::default()).unwrap();
        prop_assert_eq!(positions_of_faces(&mesh), before);
    }

    #[test]
    fn proptest_weld_is_idempotent(mut mesh in arb_soup(40, 30)) {
        mesh.merge_verts(&WeldOptions::default()).unwrap();
        let verts = mesh.vertices().to_vec();
        let tris = mesh.triangles().to_vec();

        let report = mesh.merge_verts(&WeldOptions::default()).unwrap();
        prop_assert_eq!(report.merged, 0);
        prop_assert_eq!(report.dangling_removed, 0);
        prop_assert_eq!(mesh.vertices(), &verts[..]);
        prop_assert_eq!(mesh.triangles(), &tris[..]);
    }

    #[test]
    fn proptest_welded_vertices_are_distinct(mut mesh in arb_soup(40, 30)) {
        mesh.merge_verts(&WeldOptions::default()).unwrap();
        let verts = mesh.vertices();
        for i in 0..verts.len() {
            for j in (i + 1)..verts.len() {
                prop_assert!(verts[i] != verts[j]);
            }
        }
    }
}
