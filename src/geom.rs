//! Geometric primitives shared by the mesh, shape and algorithm modules.
//!
//! Points and vectors are nalgebra's [`Point3<f64>`] and [`Vector3<f64>`];
//! this module adds the axis-aligned [`BoundBox`], tolerance-based vector
//! equality, and the ray queries used by point containment.

use nalgebra::{Point3, Vector3};

/// Default tolerance for treating two positions or directions as equal.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl BoundBox {
    /// Create a box from two corners (component-wise ordered).
    pub fn new(a: Point3<f64>, b: Point3<f64>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    /// Smallest box enclosing all points, or `None` for an empty set.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bbox.include(p);
        }
        Some(bbox)
    }

    /// Grow the box to include `p`.
    pub fn include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// Side lengths along x, y and z.
    pub fn extent(&self) -> Vector3<f64> {
        self.max - self.min
    }

    /// Length of the main diagonal.
    pub fn diagonal(&self) -> f64 {
        self.extent().norm()
    }

    /// Centre of the box.
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Index (0 = x, 1 = y, 2 = z) of the longest side.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Whether `p` lies inside or on the box.
    pub fn contains(&self, p: &Point3<f64>) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }
}

/// Tolerance-based vector equality (Euclidean distance).
#[inline]
pub fn vectors_equal(a: &Vector3<f64>, b: &Vector3<f64>, tolerance: f64) -> bool {
    (a - b).norm() <= tolerance
}

/// Outward unit normal of the counter-clockwise triangle `(a, b, c)`.
///
/// Returns `None` for a zero-area triangle.
pub fn triangle_normal(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Option<Vector3<f64>> {
    let e1 = b - a;
    let e2 = c - a;
    let n = e1.cross(&e2);
    let len = n.norm();
    let scale = e1.norm_squared().max(e2.norm_squared());
    if len > f64::EPSILON * scale {
        Some(n / len)
    } else {
        None
    }
}

/// Outcome of casting a ray against a triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RayHit {
    /// The ray misses the triangle.
    Miss,
    /// The ray crosses the triangle interior at parameter `t`.
    Hit(f64),
    /// The ray origin lies on the triangle.
    OnSurface,
    /// The ray passes too close to an edge or vertex, or grazes the plane;
    /// the crossing count along this ray cannot be trusted.
    Ambiguous,
}

/// Barycentric slack used to detect rays through edges and vertices.
const BARY_EPS: f64 = 1e-9;

/// Cast a ray from `origin` along unit direction `dir` against triangle `tri`
/// (Möller–Trumbore).
pub fn ray_triangle(origin: &Point3<f64>, dir: &Vector3<f64>, tri: [&Point3<f64>; 3]) -> RayHit {
    let [a, b, c] = tri;
    let e1 = b - a;
    let e2 = c - a;
    let size = e1.norm().max(e2.norm());
    if size == 0.0 {
        return RayHit::Miss;
    }

    let normal = e1.cross(&e2);
    let area2 = normal.norm();
    if area2 <= f64::EPSILON * size * size {
        return RayHit::Miss;
    }

    let pvec = dir.cross(&e2);
    let det = e1.dot(&pvec);
    let offset = origin - a;

    if det.abs() <= BARY_EPS * size * size {
        // Ray parallel to the plane: only a problem if it runs inside it.
        let plane_dist = offset.dot(&normal) / area2;
        return if plane_dist.abs() <= BARY_EPS * size {
            RayHit::Ambiguous
        } else {
            RayHit::Miss
        };
    }

    let inv = 1.0 / det;
    let u = offset.dot(&pvec) * inv;
    if u < -BARY_EPS || u > 1.0 + BARY_EPS {
        return RayHit::Miss;
    }
    let qvec = offset.cross(&e1);
    let v = dir.dot(&qvec) * inv;
    if v < -BARY_EPS || u + v > 1.0 + BARY_EPS {
        return RayHit::Miss;
    }

    let t = e2.dot(&qvec) * inv;
    let t_eps = BARY_EPS * size;
    if t < -t_eps {
        return RayHit::Miss;
    }
    if t <= t_eps {
        return RayHit::OnSurface;
    }
    if u < BARY_EPS || v < BARY_EPS || u + v > 1.0 - BARY_EPS {
        return RayHit::Ambiguous;
    }
    RayHit::Hit(t)
}

/// Whether a ray from `origin` along unit `dir` meets the sphere.
pub fn ray_meets_sphere(origin: &Point3<f64>, dir: &Vector3<f64>, center: &Point3<f64>, radius: f64) -> bool {
    // Slack keeps triangles grazing the sphere surface in the candidate set.
    let r = radius * (1.0 + 1e-9) + 1e-12;
    let to_center = center - origin;
    let dist2 = to_center.norm_squared();
    if dist2 <= r * r {
        return true;
    }
    let along = to_center.dot(dir);
    if along < 0.0 {
        return false;
    }
    dist2 - along * along <= r * r
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bound_box_from_points() {
        let pts = [
            Point3::new(1.0, -2.0, 0.5),
            Point3::new(-1.0, 4.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
        ];
        let bbox = BoundBox::from_points(&pts).unwrap();
        assert_eq!(bbox.min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(bbox.max, Point3::new(1.0, 4.0, 3.0));
        assert_eq!(bbox.longest_axis(), 1);
        assert_eq!(bbox.center(), Point3::new(0.0, 1.0, 1.5));
        assert!(bbox.contains(&Point3::new(0.0, 0.0, 0.0)));
        assert!(!bbox.contains(&Point3::new(0.0, 5.0, 0.0)));
    }

    #[test]
    fn test_bound_box_empty() {
        let pts: Vec<Point3<f64>> = Vec::new();
        assert!(BoundBox::from_points(&pts).is_none());
    }

    #[test]
    fn test_triangle_normal_ccw() {
        let n = triangle_normal(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert_relative_eq!(n, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn test_triangle_normal_degenerate() {
        let p = Point3::new(1.0, 1.0, 1.0);
        assert!(triangle_normal(&p, &p, &Point3::new(2.0, 2.0, 2.0)).is_none());
    }

    #[test]
    fn test_ray_triangle_cases() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        let up = Vector3::new(0.0, 0.0, 1.0);

        let hit = ray_triangle(&Point3::new(0.2, 0.2, -1.0), &up, [&a, &b, &c]);
        assert!(matches!(hit, RayHit::Hit(t) if (t - 1.0).abs() < 1e-12));

        let behind = ray_triangle(&Point3::new(0.2, 0.2, 1.0), &up, [&a, &b, &c]);
        assert_eq!(behind, RayHit::Miss);

        let through_edge = ray_triangle(&Point3::new(0.5, 0.0, -1.0), &up, [&a, &b, &c]);
        assert_eq!(through_edge, RayHit::Ambiguous);

        let on_surface = ray_triangle(&Point3::new(0.2, 0.2, 0.0), &up, [&a, &b, &c]);
        assert_eq!(on_surface, RayHit::OnSurface);

        let in_plane = ray_triangle(&Point3::new(-1.0, 0.2, 0.0), &Vector3::x(), [&a, &b, &c]);
        assert_eq!(in_plane, RayHit::Ambiguous);
    }

    #[test]
    fn test_ray_meets_sphere() {
        let center = Point3::new(5.0, 0.0, 0.0);
        let o = Point3::origin();
        assert!(ray_meets_sphere(&o, &Vector3::x(), &center, 1.0));
        assert!(!ray_meets_sphere(&o, &-Vector3::x(), &center, 1.0));
        assert!(!ray_meets_sphere(&o, &Vector3::y(), &center, 1.0));
        assert!(ray_meets_sphere(&Point3::new(5.5, 0.0, 0.0), &Vector3::y(), &center, 1.0));
    }
}
