//! Small diagnostic meshes, valid and deliberately broken.
//!
//! Used by the tests and by `tessellate validate --fixture <name>`.

use log::debug;
use nalgebra::Point3;

use super::trimesh::Mesh;

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &[
    "valid_tet",
    "basic_break",
    "duplicate_dangling",
    "touch_tets",
    "open_tet",
    "overlap_tet",
    "unit_cube",
];

/// Look up a fixture by name.
pub fn by_name(name: &str) -> Option<Mesh> {
    let mesh = match name {
        "valid_tet" => valid_tet(),
        "basic_break" => basic_break(),
        "duplicate_dangling" => duplicate_dangling(),
        "touch_tets" => touch_tets(),
        "open_tet" => open_tet(),
        "overlap_tet" => overlap_tet(),
        "unit_cube" => unit_cube(),
        _ => return None,
    };
    Some(mesh)
}

fn build(verts: Vec<Point3<f64>>, faces: &[[usize; 3]]) -> Mesh {
    let mut mesh = Mesh::from_raw(verts, faces);
    if let Err(e) = mesh.derive_normals() {
        debug!("fixture normals: {}", e);
    }
    mesh
}

fn tet_vertices() -> Vec<Point3<f64>> {
    vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
    ]
}

const TET_FACES: [[usize; 3]; 4] = [[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]];

/// A closed, outward-wound tetrahedron.
pub fn valid_tet() -> Mesh {
    build(tet_vertices(), &TET_FACES)
}

/// A tetrahedron with a duplicated vertex, a dangling vertex and an
/// out-of-range index.
pub fn basic_break() -> Mesh {
    let mut verts = tet_vertices();
    verts.push(Point3::new(1.0, 0.0, 0.0));
    verts.push(Point3::new(4.0, 4.0, 4.0));
    build(verts, &[[0, 2, 1], [0, 1, 3], [0, 3, 2], [4, 2, 3], [0, 1, 9]])
}

/// A tetrahedron with one corner stored twice and an unreferenced vertex.
/// Welding turns it into [`valid_tet`].
pub fn duplicate_dangling() -> Mesh {
    let mut verts = tet_vertices();
    verts.push(Point3::new(0.0, 0.0, 0.0));
    verts.push(Point3::new(2.0, 2.0, 2.0));
    build(verts, &[[0, 2, 1], [0, 1, 3], [4, 3, 2], [1, 2, 3]])
}

/// Two tetrahedra touching at vertex 0 only.
pub fn touch_tets() -> Mesh {
    let mut verts = tet_vertices();
    verts.extend([
        Point3::new(-1.0, 0.0, 0.0),
        Point3::new(0.0, -1.0, 0.0),
        Point3::new(0.0, 0.0, -1.0),
    ]);
    let mut faces = TET_FACES.to_vec();
    faces.extend([[0, 4, 5], [0, 6, 4], [0, 5, 6], [4, 6, 5]]);
    build(verts, &faces)
}

/// A tetrahedron missing its slanted face.
pub fn open_tet() -> Mesh {
    build(tet_vertices(), &TET_FACES[..3])
}

/// A tetrahedron whose faces are all listed twice.
pub fn overlap_tet() -> Mesh {
    let mut faces = TET_FACES.to_vec();
    faces.extend(TET_FACES);
    build(tet_vertices(), &faces)
}

/// Axis-aligned unit cube with corners at 0 and 1; vertex `i` sits at
/// `(i & 1, (i >> 1) & 1, (i >> 2) & 1)`.
pub fn unit_cube() -> Mesh {
    let verts = (0..8)
        .map(|i| Point3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64))
        .collect();
    let faces = [
        [0, 2, 1],
        [1, 2, 3],
        [4, 5, 6],
        [5, 7, 6],
        [0, 1, 5],
        [0, 5, 4],
        [2, 6, 7],
        [2, 7, 3],
        [0, 4, 6],
        [0, 6, 2],
        [1, 3, 7],
        [1, 7, 5],
    ];
    build(verts, &faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        for name in NAMES {
            assert!(by_name(name).is_some(), "{}", name);
        }
        assert!(by_name("nope").is_none());
    }

    #[test]
    fn test_fixture_counts() {
        assert_eq!(valid_tet().num_triangles(), 4);
        assert_eq!(touch_tets().num_vertices(), 7);
        assert_eq!(open_tet().num_triangles(), 3);
        assert_eq!(overlap_tet().num_triangles(), 8);
        assert_eq!(unit_cube().num_triangles(), 12);
    }
}
