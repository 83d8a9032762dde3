//! The indexed triangle mesh.

use std::cell::OnceCell;

use log::debug;
use nalgebra::{Matrix4, Point3, Rotation3, Vector3};

use crate::error::{MeshError, Result};
use crate::geom::{BoundBox, DEFAULT_TOLERANCE};
use crate::shape::Sphere;

use super::triangle::Triangle;

/// Per-mesh configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshConfig {
    /// Distance below which two vertices are the same point.
    pub weld_tolerance: f64,

    /// Whether point containment uses the bounding-sphere acceleration.
    pub sphere_accel: bool,

    /// Number of acceleration spheres along the longest axis.
    pub spheres_per_axis: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            weld_tolerance: DEFAULT_TOLERANCE,
            sphere_accel: false,
            spheres_per_axis: 5,
        }
    }
}

impl MeshConfig {
    /// Set the weld tolerance.
    pub fn with_weld_tolerance(mut self, tolerance: f64) -> Self {
        self.weld_tolerance = tolerance.max(0.0);
        self
    }

    /// Enable or disable sphere acceleration.
    pub fn with_sphere_accel(mut self, enabled: bool) -> Self {
        self.sphere_accel = enabled;
        self
    }

    /// Set the number of acceleration spheres (at least one).
    pub fn with_spheres_per_axis(mut self, count: usize) -> Self {
        self.spheres_per_axis = count.max(1);
        self
    }
}

/// Model transform: uniform scale, then rotation about x, y and z
/// (degrees), then translation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Uniform scale factor.
    pub scale: f64,
    /// Rotation angles about x, y, z in degrees.
    pub rotation: Vector3<f64>,
    /// Translation.
    pub translation: Vector3<f64>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            rotation: Vector3::zeros(),
            translation: Vector3::zeros(),
        }
    }
}

impl Transform {
    /// The rotation `Rz · Ry · Rx`.
    pub fn rotation_matrix(&self) -> Rotation3<f64> {
        Rotation3::from_euler_angles(
            self.rotation.x.to_radians(),
            self.rotation.y.to_radians(),
            self.rotation.z.to_radians(),
        )
    }

    /// The homogeneous matrix `T · Rz · Ry · Rx · S`.
    pub fn matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&self.translation)
            * self.rotation_matrix().to_homogeneous()
            * Matrix4::new_scaling(self.scale)
    }

    /// Map a model-space point to world space.
    pub fn apply(&self, p: &Point3<f64>) -> Point3<f64> {
        self.rotation_matrix() * (p * self.scale) + self.translation
    }

    /// Map a model-space direction (normal) to world space.
    pub fn apply_normal(&self, n: &Vector3<f64>) -> Vector3<f64> {
        self.rotation_matrix() * n
    }
}

/// An indexed triangle mesh.
///
/// Vertices and triangles are stored in flat arrays; triangles refer to
/// vertices by index. Per-vertex normals are index-aligned with the
/// vertices. Geometry mutation drops the bounding-sphere acceleration and
/// the undeformed `base` snapshot.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub(crate) verts: Vec<Point3<f64>>,
    pub(crate) base: Option<Vec<Point3<f64>>>,
    pub(crate) norms: Vec<Vector3<f64>>,
    pub(crate) tris: Vec<Triangle>,
    colour: [f32; 4],
    transform: Transform,
    config: MeshConfig,
    accel: OnceCell<Vec<Sphere>>,
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Mesh {
    /// Create an empty mesh with the default configuration.
    pub fn new() -> Self {
        Self::with_config(MeshConfig::default())
    }

    /// Create an empty mesh with the given configuration.
    pub fn with_config(config: MeshConfig) -> Self {
        Self {
            verts: Vec::new(),
            base: None,
            norms: Vec::new(),
            tris: Vec::new(),
            colour: [0.7, 0.7, 0.7, 1.0],
            transform: Transform::default(),
            config,
            accel: OnceCell::new(),
        }
    }

    /// Build a mesh from positions and index triples without any checks.
    ///
    /// Normals are left zero. Use this for raw marching-cubes output or
    /// deliberately broken test geometry.
    pub fn from_raw(vertices: Vec<Point3<f64>>, faces: &[[usize; 3]]) -> Self {
        let mut mesh = Self::new();
        mesh.norms = vec![Vector3::zeros(); vertices.len()];
        mesh.verts = vertices;
        mesh.tris = faces.iter().map(|&f| Triangle::new(f)).collect();
        mesh
    }

    /// Build a mesh from positions and index triples and derive its normals.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidVertexIndex`] for an out-of-range index
    /// and propagates normal-derivation defects.
    ///
    /// # Example
    ///
    /// ```
    /// use tessellate::mesh::Mesh;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    ///     Point3::new(0.0, 0.0, 1.0),
    /// ];
    /// let faces = [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]];
    /// let mesh = Mesh::from_triangles(vertices, &faces).unwrap();
    /// assert_eq!(mesh.num_triangles(), 4);
    /// ```
    pub fn from_triangles(vertices: Vec<Point3<f64>>, faces: &[[usize; 3]]) -> Result<Self> {
        let mut mesh = Self::from_raw(vertices, faces);
        mesh.check_indices()?;
        mesh.derive_normals()?;
        Ok(mesh)
    }

    /// Reset to an empty mesh, keeping transform, colour and configuration.
    pub fn clear(&mut self) {
        self.verts.clear();
        self.norms.clear();
        self.tris.clear();
        self.geometry_changed();
    }

    /// True if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.tris.is_empty()
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.verts.len()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.tris.len()
    }

    /// Vertex positions.
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.verts
    }

    /// Triangles.
    pub fn triangles(&self) -> &[Triangle] {
        &self.tris
    }

    /// Per-vertex normals.
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.norms
    }

    /// Position of vertex `i`.
    pub fn position(&self, i: usize) -> Option<&Point3<f64>> {
        self.verts.get(i)
    }

    /// Corner positions of triangle `face`, if all its indices are valid.
    pub fn triangle_positions(&self, face: usize) -> Option<[&Point3<f64>; 3]> {
        let t = self.tris.get(face)?;
        Some([
            self.verts.get(t.v[0])?,
            self.verts.get(t.v[1])?,
            self.verts.get(t.v[2])?,
        ])
    }

    /// Undeformed positions captured at the first deformation, if any.
    pub fn base(&self) -> Option<&[Point3<f64>]> {
        self.base.as_deref()
    }

    /// Append a vertex and return its index.
    pub fn add_vertex(&mut self, p: Point3<f64>) -> usize {
        self.verts.push(p);
        self.norms.push(Vector3::zeros());
        self.geometry_changed();
        self.verts.len() - 1
    }

    /// Append a triangle and return its index. Indices are not checked.
    pub fn add_triangle(&mut self, v: [usize; 3]) -> usize {
        self.tris.push(Triangle::new(v));
        self.geometry_changed();
        self.tris.len() - 1
    }

    /// Move vertex `i`. Normals are not updated.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] if `i` is out of range.
    pub fn set_position(&mut self, i: usize, p: Point3<f64>) -> Result<()> {
        let slot = self
            .verts
            .get_mut(i)
            .ok_or_else(|| MeshError::invalid_param("vertex", i, "out of range"))?;
        *slot = p;
        self.geometry_changed();
        Ok(())
    }

    /// Mesh colour (RGBA).
    pub fn colour(&self) -> [f32; 4] {
        self.colour
    }

    /// Set the mesh colour (RGBA).
    pub fn set_colour(&mut self, colour: [f32; 4]) {
        self.colour = colour;
    }

    /// Model transform.
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Set the model transform.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    /// Configuration.
    pub fn config(&self) -> &MeshConfig {
        &self.config
    }

    /// Replace the configuration. Drops the acceleration structure.
    pub fn set_config(&mut self, config: MeshConfig) {
        self.config = config;
        self.accel.take();
    }

    /// Bounding box of the vertices, `None` if there are none.
    pub fn bounding_box(&self) -> Option<BoundBox> {
        BoundBox::from_points(&self.verts)
    }

    /// Append another mesh's geometry, offsetting its indices.
    ///
    /// With `weld`, near-coincident vertices of the two meshes are merged
    /// afterwards.
    ///
    /// # Errors
    ///
    /// With `weld`, returns [`MeshError::InvalidVertexIndex`] if either mesh
    /// has a broken triangle. Nothing is merged in that case.
    pub fn merge_mesh(&mut self, other: &Mesh, weld: bool) -> Result<()> {
        if weld {
            self.check_indices()?;
            other.check_indices()?;
        }
        let offset = self.verts.len();
        self.verts.extend_from_slice(&other.verts);
        self.norms.extend_from_slice(&other.norms);
        self.norms.resize(self.verts.len(), Vector3::zeros());
        self.tris.extend(other.tris.iter().map(|t| Triangle {
            v: t.v.map(|i| i + offset),
            n: t.n,
        }));
        self.geometry_changed();
        debug!(
            "merged mesh: {} vertices, {} triangles",
            self.verts.len(),
            self.tris.len()
        );
        if weld {
            self.weld()?;
        }
        Ok(())
    }

    /// Scale and translate the vertices so the longest side of the bounding
    /// box equals `side_length` and the box is centred on the origin.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] for a non-positive length and
    /// [`MeshError::EmptyMesh`] for a mesh without vertices.
    pub fn box_fit(&mut self, side_length: f64) -> Result<()> {
        if !(side_length.is_finite() && side_length > 0.0) {
            return Err(MeshError::invalid_param(
                "side_length",
                side_length,
                "must be positive",
            ));
        }
        let bbox = self.bounding_box().ok_or(MeshError::EmptyMesh)?;
        let extent = bbox.extent();
        let longest = extent.x.max(extent.y).max(extent.z);
        let factor = if longest > 0.0 { side_length / longest } else { 1.0 };
        let center = bbox.center();
        for p in &mut self.verts {
            *p = Point3::from((*p - center) * factor);
        }
        self.geometry_changed();
        Ok(())
    }

    /// Restore the undeformed positions captured by the first deformation.
    ///
    /// Returns `Ok(false)` if the mesh was not deformed.
    pub fn reset_deformation(&mut self) -> Result<bool> {
        match self.base.take() {
            Some(base) => {
                self.verts = base;
                self.accel.take();
                self.derive_normals()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Check every triangle index against the vertex count.
    pub(crate) fn check_indices(&self) -> Result<()> {
        let n = self.verts.len();
        for (face, t) in self.tris.iter().enumerate() {
            if let Some(&vertex) = t.v.iter().find(|&&i| i >= n) {
                return Err(MeshError::InvalidVertexIndex { face, vertex });
            }
        }
        Ok(())
    }

    /// The bounding-sphere acceleration, built on first use.
    pub(crate) fn sphere_accel(&self) -> &[Sphere] {
        self.accel
            .get_or_init(|| crate::algo::accel::build_sphere_accel(self, self.config.spheres_per_axis))
    }

    /// Whether the acceleration structure is currently built.
    pub fn has_sphere_accel(&self) -> bool {
        self.accel.get().is_some()
    }

    /// Adopt the geometry of `other`, keeping this mesh's transform, colour
    /// and configuration.
    pub(crate) fn replace_geometry(&mut self, other: Mesh) {
        self.verts = other.verts;
        self.norms = other.norms;
        self.tris = other.tris;
        self.geometry_changed();
    }

    /// Replace positions while keeping the deformation base.
    pub(crate) fn replace_positions(&mut self, positions: Vec<Point3<f64>>) {
        self.verts = positions;
        self.accel.take();
    }

    pub(crate) fn geometry_changed(&mut self) {
        self.accel.take();
        self.base = None;
    }
}
