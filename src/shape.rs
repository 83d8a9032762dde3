//! Shapes that can be drawn and queried for point containment.
//!
//! [`Sphere`], [`Cylinder`], [`Cube`] and [`Mesh`] all implement [`Shape`].
//! Spheres also serve as the bounding volumes of the mesh containment
//! acceleration, in which case `tris` lists the triangles they enclose.

use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};

use crate::mesh::Mesh;
use crate::render::ShapeGeometry;

/// Tessellation used by the analytic shapes.
const SEGMENTS: usize = 24;
const STACKS: usize = 12;

/// Something that can render itself and answer inside/outside queries.
pub trait Shape {
    /// Append renderable triangles to `geometry`.
    fn gen_geometry(&self, geometry: &mut ShapeGeometry);

    /// Whether `p` is inside (or on) the shape.
    fn point_containment(&self, p: &Point3<f64>) -> bool;
}

/// A sphere, optionally bounding a set of mesh triangles.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    /// Centre.
    pub center: Point3<f64>,
    /// Radius.
    pub radius: f64,
    /// Enclosed triangle indices (empty for a standalone sphere).
    pub tris: Vec<usize>,
}

impl Sphere {
    /// Standalone sphere.
    pub fn new(center: Point3<f64>, radius: f64) -> Self {
        Self {
            center,
            radius,
            tris: Vec::new(),
        }
    }
}

impl Shape for Sphere {
    fn gen_geometry(&self, geometry: &mut ShapeGeometry) {
        let first = geometry.vertices.len() as u32;
        for i in 0..=STACKS {
            let theta = PI * i as f64 / STACKS as f64;
            for j in 0..=SEGMENTS {
                let phi = 2.0 * PI * j as f64 / SEGMENTS as f64;
                let n = Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
                geometry.push_vertex(&(self.center + n * self.radius), &n);
            }
        }
        let row = (SEGMENTS + 1) as u32;
        for i in 0..STACKS as u32 {
            for j in 0..SEGMENTS as u32 {
                let a = first + i * row + j;
                let b = a + row;
                geometry.push_triangle(a, b, a + 1);
                geometry.push_triangle(a + 1, b, b + 1);
            }
        }
    }

    fn point_containment(&self, p: &Point3<f64>) -> bool {
        (p - self.center).norm() <= self.radius
    }
}

/// A capped cylinder around the segment `start`–`end`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    /// Centre of the first cap.
    pub start: Point3<f64>,
    /// Centre of the second cap.
    pub end: Point3<f64>,
    /// Radius.
    pub radius: f64,
}

impl Cylinder {
    /// Create a cylinder.
    pub fn new(start: Point3<f64>, end: Point3<f64>, radius: f64) -> Self {
        Self { start, end, radius }
    }

    /// Unit axis and two unit radial directions `(u, w)` with `u × w = axis`.
    fn frame(&self) -> Option<(Vector3<f64>, Vector3<f64>, Vector3<f64>)> {
        let axis = (self.end - self.start).try_normalize(f64::EPSILON)?;
        let helper = if axis.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
        let u = axis.cross(&helper).normalize();
        let w = axis.cross(&u);
        Some((axis, u, w))
    }
}

impl Shape for Cylinder {
    fn gen_geometry(&self, geometry: &mut ShapeGeometry) {
        let Some((axis, u, w)) = self.frame() else {
            return;
        };
        let radial = |j: usize| {
            let phi = 2.0 * PI * j as f64 / SEGMENTS as f64;
            u * phi.cos() + w * phi.sin()
        };

        // Side: bottom ring then top ring, shared seam vertex at j = SEGMENTS.
        let side = geometry.vertices.len() as u32;
        for end in [&self.start, &self.end] {
            for j in 0..=SEGMENTS {
                let r = radial(j);
                geometry.push_vertex(&(end + r * self.radius), &r);
            }
        }
        let row = (SEGMENTS + 1) as u32;
        for j in 0..SEGMENTS as u32 {
            let b = side + j;
            let t = b + row;
            geometry.push_triangle(b, b + 1, t + 1);
            geometry.push_triangle(b, t + 1, t);
        }

        // Caps with flat normals.
        for (center, n, flip) in [(&self.start, -axis, true), (&self.end, axis, false)] {
            let c = geometry.push_vertex(center, &n);
            let ring = geometry.vertices.len() as u32;
            for j in 0..=SEGMENTS {
                geometry.push_vertex(&(center + radial(j) * self.radius), &n);
            }
            for j in 0..SEGMENTS as u32 {
                if flip {
                    geometry.push_triangle(c, ring + j + 1, ring + j);
                } else {
                    geometry.push_triangle(c, ring + j, ring + j + 1);
                }
            }
        }
    }

    fn point_containment(&self, p: &Point3<f64>) -> bool {
        let d = self.end - self.start;
        let len2 = d.norm_squared();
        if len2 == 0.0 {
            return false;
        }
        let t = (p - self.start).dot(&d) / len2;
        if !(0.0..=1.0).contains(&t) {
            return false;
        }
        let foot = self.start + d * t;
        (p - foot).norm() <= self.radius
    }
}

/// An axis-aligned cube.
#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    /// Centre.
    pub center: Point3<f64>,
    /// Side length.
    pub length: f64,
}

impl Cube {
    /// Create a cube.
    pub fn new(center: Point3<f64>, length: f64) -> Self {
        Self { center, length }
    }
}

impl Shape for Cube {
    fn gen_geometry(&self, geometry: &mut ShapeGeometry) {
        let h = self.length * 0.5;
        for axis in 0..3 {
            for sign in [1.0, -1.0] {
                let n = Vector3::ith(axis, sign);
                let mut u = Vector3::ith((axis + 1) % 3, 1.0);
                let mut v = Vector3::ith((axis + 2) % 3, 1.0);
                if sign < 0.0 {
                    std::mem::swap(&mut u, &mut v);
                }
                let face = self.center + n * h;
                let a = geometry.push_vertex(&(face - u * h - v * h), &n);
                let b = geometry.push_vertex(&(face + u * h - v * h), &n);
                let c = geometry.push_vertex(&(face + u * h + v * h), &n);
                let d = geometry.push_vertex(&(face - u * h + v * h), &n);
                geometry.push_triangle(a, b, c);
                geometry.push_triangle(a, c, d);
            }
        }
    }

    fn point_containment(&self, p: &Point3<f64>) -> bool {
        let h = self.length * 0.5;
        (p - self.center).iter().all(|c| c.abs() <= h)
    }
}

impl Shape for Mesh {
    /// Vertices mapped through the mesh transform, smooth vertex normals.
    fn gen_geometry(&self, geometry: &mut ShapeGeometry) {
        let transform = self.transform();
        let first = geometry.vertices.len() as u32;
        for (p, n) in self.vertices().iter().zip(self.normals()) {
            geometry.push_vertex(&transform.apply(p), &transform.apply_normal(n));
        }
        for t in self.triangles() {
            let [a, b, c] = t.v.map(|i| first + i as u32);
            geometry.push_triangle(a, b, c);
        }
        geometry.colour = self.colour();
    }

    /// Ray-parity containment in model space.
    fn point_containment(&self, p: &Point3<f64>) -> bool {
        crate::algo::accel::point_containment(self, p)
    }
}
