//! Bounding-sphere acceleration and ray-parity point containment.
//!
//! A point is inside a closed mesh when a ray from it crosses the surface
//! an odd number of times. Rays that pass through an edge or vertex, or run
//! inside a triangle's plane, make the count unreliable; the query then
//! retries along the next of a fixed set of directions.
//!
//! With [`MeshConfig::sphere_accel`](crate::mesh::MeshConfig::sphere_accel)
//! enabled, triangles are binned into a few bounding spheres and only the
//! triangles of spheres the ray meets are tested.

use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use crate::geom::{ray_meets_sphere, ray_triangle, BoundBox, RayHit};
use crate::mesh::Mesh;
use crate::shape::Sphere;

/// Ray directions tried in order; none is parallel to a coordinate axis or
/// plane.
const DIRECTIONS: [[f64; 3]; 6] = [
    [0.267, 0.535, 0.802],
    [-0.612, 0.354, 0.707],
    [0.129, -0.943, 0.306],
    [0.880, 0.141, -0.453],
    [-0.372, -0.499, -0.783],
    [0.931, -0.305, 0.201],
];

/// Bin triangles by centroid along the longest bounding-box axis into
/// `max_spheres` slabs and wrap each non-empty slab in a sphere.
pub fn build_sphere_accel(mesh: &Mesh, max_spheres: usize) -> Vec<Sphere> {
    let Some(bbox) = mesh.bounding_box() else {
        return Vec::new();
    };
    let bins = max_spheres.max(1);
    let axis = bbox.longest_axis();
    let lo = bbox.min[axis];
    let extent = bbox.extent()[axis];

    let mut slabs: Vec<Vec<usize>> = vec![Vec::new(); bins];
    for face in 0..mesh.num_triangles() {
        let Some([a, b, c]) = mesh.triangle_positions(face) else {
            continue;
        };
        let centroid = (a[axis] + b[axis] + c[axis]) / 3.0;
        let bin = if extent > 0.0 {
            (((centroid - lo) / extent) * bins as f64).floor() as usize
        } else {
            0
        };
        slabs[bin.min(bins - 1)].push(face);
    }

    let spheres: Vec<Sphere> = slabs
        .into_iter()
        .filter(|tris| !tris.is_empty())
        .filter_map(|tris| {
            let corners: Vec<&Point3<f64>> = tris
                .iter()
                .filter_map(|&f| mesh.triangle_positions(f))
                .flatten()
                .collect();
            let bounds = BoundBox::from_points(corners.iter().copied())?;
            let center = bounds.center();
            let radius = corners
                .iter()
                .map(|p| (*p - center).norm())
                .fold(0.0, f64::max);
            Some(Sphere {
                center,
                radius,
                tris,
            })
        })
        .collect();
    debug!("built {} acceleration spheres", spheres.len());
    spheres
}

/// Whether `p` (model space) lies inside the closed surface of `mesh`.
///
/// Points on the surface count as inside.
pub fn point_containment(mesh: &Mesh, p: &Point3<f64>) -> bool {
    if mesh.is_empty() {
        return false;
    }
    if let Some(bbox) = mesh.bounding_box() {
        if !bbox.contains(p) {
            return false;
        }
    }

    let mut parity = false;
    for d in DIRECTIONS {
        let dir = Vector3::from(d).normalize();
        match cast(mesh, p, &dir) {
            Crossings::Count(n) => return n % 2 == 1,
            Crossings::OnSurface => return true,
            Crossings::Ambiguous(n) => parity = n % 2 == 1,
        }
    }
    warn!("containment of {:?} ambiguous along every ray", p);
    parity
}

enum Crossings {
    Count(usize),
    OnSurface,
    Ambiguous(usize),
}

fn cast(mesh: &Mesh, origin: &Point3<f64>, dir: &Vector3<f64>) -> Crossings {
    let mut count = 0;
    let mut ambiguous = false;
    let mut test = |face: usize| -> bool {
        let Some(tri) = mesh.triangle_positions(face) else {
            return true;
        };
        match ray_triangle(origin, dir, tri) {
            RayHit::Miss => {}
            RayHit::Hit(_) => count += 1,
            RayHit::Ambiguous => {
                count += 1;
                ambiguous = true;
            }
            RayHit::OnSurface => return false,
        }
        true
    };

    let finished = if mesh.config().sphere_accel {
        mesh.sphere_accel()
            .iter()
            .filter(|s| ray_meets_sphere(origin, dir, &s.center, s.radius))
            .all(|s| s.tris.iter().all(|&f| test(f)))
    } else {
        (0..mesh.num_triangles()).all(&mut test)
    };

    if !finished {
        Crossings::OnSurface
    } else if ambiguous {
        Crossings::Ambiguous(count)
    } else {
        Crossings::Count(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::march::{marching_cubes, MarchOptions};
    use crate::mesh::{fixtures, MeshConfig};
    use crate::shape::Shape;
    use crate::voxel::VoxelGrid;

    fn ball(n: usize) -> Mesh {
        let mut grid = VoxelGrid::new(n, n, n).unwrap();
        let c = (n as f64 - 1.0) / 2.0;
        let r = n as f64 / 3.0;
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    let d = Vector3::new(x as f64 - c, y as f64 - c, z as f64 - c);
                    if d.norm() <= r {
                        grid.set(x, y, z, true).unwrap();
                    }
                }
            }
        }
        marching_cubes(&grid, &MarchOptions::default()).unwrap()
    }

    #[test]
    fn test_cube_containment() {
        let mesh = fixtures::unit_cube();
        assert!(mesh.point_containment(&Point3::new(0.5, 0.5, 0.5)));
        assert!(mesh.point_containment(&Point3::new(0.1, 0.9, 0.2)));
        assert!(!mesh.point_containment(&Point3::new(1.5, 0.5, 0.5)));
        assert!(!mesh.point_containment(&Point3::new(0.5, -0.01, 0.5)));
    }

    #[test]
    fn test_surface_point_inside() {
        let mesh = fixtures::unit_cube();
        assert!(mesh.point_containment(&Point3::new(0.3, 0.4, 1.0)));
    }

    #[test]
    fn test_spheres_cover_all_triangles() {
        let mesh = ball(10);
        let spheres = build_sphere_accel(&mesh, 5);
        assert!(!spheres.is_empty() && spheres.len() <= 5);
        let total: usize = spheres.iter().map(|s| s.tris.len()).sum();
        assert_eq!(total, mesh.num_triangles());
        for s in &spheres {
            for &f in &s.tris {
                for p in mesh.triangle_positions(f).unwrap() {
                    assert!((p - s.center).norm() <= s.radius + 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_accel_matches_brute_force() {
        let plain = ball(10);
        let mut fast = plain.clone();
        fast.set_config(MeshConfig::default().with_sphere_accel(true));

        for i in 0..8 {
            for j in 0..8 {
                let p = Point3::new(1.0 + i as f64, 1.0 + j as f64, 4.5);
                assert_eq!(plain.point_containment(&p), fast.point_containment(&p), "{:?}", p);
            }
        }
        assert!(fast.has_sphere_accel());
        assert!(fast.point_containment(&Point3::new(4.5, 4.5, 4.5)));
    }

    #[test]
    fn test_accel_dropped_on_mutation() {
        let mut mesh = fixtures::unit_cube();
        mesh.set_config(MeshConfig::default().with_sphere_accel(true));
        assert!(mesh.point_containment(&Point3::new(0.5, 0.5, 0.5)));
        assert!(mesh.has_sphere_accel());
        mesh.set_position(7, Point3::new(2.0, 2.0, 2.0)).unwrap();
        assert!(!mesh.has_sphere_accel());
        assert!(mesh.point_containment(&Point3::new(1.2, 1.2, 1.2)));
    }
}
