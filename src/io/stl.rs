//! Binary STL support.
//!
//! Layout: an 80-byte header, a little-endian `u32` triangle count, then 50
//! bytes per triangle (normal and three corners as little-endian `f32`, and
//! a `u16` attribute). Files are checked against this layout before
//! parsing, so truncated or padded files are rejected.

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use log::info;
use nalgebra::{Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{face_normal, Mesh};

/// Header size in bytes.
pub const HEADER_SIZE: usize = 80;

/// Size of one triangle record in bytes.
pub const TRIANGLE_SIZE: usize = 50;

/// Load a mesh from a binary STL file with the default configuration.
///
/// # Example
///
/// ```no_run
/// use tessellate::io::stl;
///
/// let mesh = stl::load("model.stl").unwrap();
/// println!("{} triangles", mesh.num_triangles());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let mut mesh = Mesh::new();
    read_stl(&mut mesh, path)?;
    Ok(mesh)
}

/// Replace the geometry of `mesh` with the contents of a binary STL file.
///
/// Corners are welded with the mesh's weld tolerance and normals derived.
/// Transform, colour and configuration are kept. On any error the mesh is
/// left unchanged.
pub fn read_stl<P: AsRef<Path>>(mesh: &mut Mesh, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut bytes = std::fs::read(path)?;
    check_layout(&bytes).map_err(|message| MeshError::load(path, message))?;
    // A binary header may begin with "solid"; blank it so the parser cannot
    // mistake the file for ASCII STL.
    bytes[..HEADER_SIZE].fill(0);

    let stl = stl_io::read_stl(&mut Cursor::new(&bytes)).map_err(|e| MeshError::load(path, e.to_string()))?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();
    let faces: Vec<[usize; 3]> = stl.faces.iter().map(|f| f.vertices).collect();

    let mut loaded = Mesh::from_raw(vertices, &faces);
    loaded.set_config(mesh.config().clone());
    let report = loaded.weld().map_err(|e| MeshError::load(path, e.to_string()))?;

    info!(
        "loaded {}: {} triangles, {} vertices",
        path.display(),
        loaded.num_triangles(),
        report.vertices_after
    );
    mesh.replace_geometry(loaded);
    Ok(())
}

fn check_layout(bytes: &[u8]) -> std::result::Result<(), String> {
    if bytes.len() < HEADER_SIZE + 4 {
        return Err(format!(
            "file is {} bytes, shorter than the {}-byte binary header",
            bytes.len(),
            HEADER_SIZE + 4
        ));
    }
    let mut count = [0u8; 4];
    count.copy_from_slice(&bytes[HEADER_SIZE..HEADER_SIZE + 4]);
    let count = u32::from_le_bytes(count) as u64;
    let expected = (HEADER_SIZE + 4) as u64 + TRIANGLE_SIZE as u64 * count;
    if bytes.len() as u64 != expected {
        return Err(format!(
            "header declares {} triangles ({} bytes) but file has {} bytes",
            count,
            expected,
            bytes.len()
        ));
    }
    Ok(())
}

/// Write `mesh` as binary STL.
///
/// Face normals are recomputed from the current positions (zero for a
/// degenerate triangle); the header and attributes are zero.
///
/// # Errors
///
/// [`MeshError::InvalidVertexIndex`] for a broken triangle, otherwise I/O
/// and encoding failures.
pub fn write_stl<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    let path = path.as_ref();

    let mut triangles: Vec<stl_io::Triangle> = Vec::with_capacity(mesh.num_triangles());
    for face in 0..mesh.num_triangles() {
        let [p0, p1, p2] = mesh.triangle_positions(face).ok_or_else(|| {
            let t = mesh.triangles()[face];
            let vertex = t
                .v
                .into_iter()
                .find(|&i| i >= mesh.num_vertices())
                .unwrap_or(t.v[0]);
            MeshError::InvalidVertexIndex { face, vertex }
        })?;
        let n = face_normal(p0, p1, p2).unwrap_or_else(Vector3::zeros);
        triangles.push(stl_io::Triangle {
            normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
            vertices: [p0, p1, p2].map(|p| stl_io::Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
        });
    }

    let file = File::create(path).map_err(|e| MeshError::save(path, e.to_string()))?;
    let mut writer = BufWriter::new(file);
    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::save(path, e.to_string()))?;

    info!("saved {}: {} triangles", path.display(), triangles.len());
    Ok(())
}

/// Alias for [`write_stl`].
pub fn save<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    write_stl(mesh, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{fixtures, Transform};
    use approx::assert_relative_eq;

    #[test]
    fn test_round_trip_cube() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.stl");
        let cube = fixtures::unit_cube();
        write_stl(&cube, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + 4 + 12 * TRIANGLE_SIZE);
        assert!(bytes[..HEADER_SIZE].iter().all(|&b| b == 0));

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.num_vertices(), 8);
        assert_eq!(loaded.num_triangles(), 12);
        assert!(loaded.manifold_validity());
        for (a, b) in cube.triangles().iter().zip(loaded.triangles()) {
            assert_relative_eq!(a.n, b.n, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_truncated_file_leaves_mesh() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.stl");
        write_stl(&fixtures::unit_cube(), &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

        let mut mesh = fixtures::valid_tet();
        let err = read_stl(&mut mesh, &path).unwrap_err();
        assert!(matches!(err, MeshError::LoadError { .. }));
        assert_eq!(mesh.num_triangles(), 4);
    }

    #[test]
    fn test_solid_header_read_as_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solid.stl");
        write_stl(&fixtures::unit_cube(), &path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let header = b"solid part\nexported by a CAD tool";
        bytes[..header.len()].copy_from_slice(header);
        std::fs::write(&path, &bytes).unwrap();

        let mesh = load(&path).unwrap();
        assert_eq!(mesh.num_triangles(), 12);
        assert_eq!(mesh.num_vertices(), 8);
        assert!(mesh.manifold_validity());
    }

    #[test]
    fn test_header_only_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.stl");
        std::fs::write(&path, [0u8; 84]).unwrap();
        let mesh = load(&path).unwrap();
        assert!(mesh.is_empty());

        std::fs::write(&path, [0u8; 40]).unwrap();
        assert!(matches!(load(&path), Err(MeshError::LoadError { .. })));
    }

    #[test]
    fn test_read_keeps_transform_and_colour() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tet.stl");
        write_stl(&fixtures::valid_tet(), &path).unwrap();

        let mut mesh = Mesh::new();
        mesh.set_colour([1.0, 0.0, 0.0, 1.0]);
        let t = Transform {
            scale: 3.0,
            ..Transform::default()
        };
        mesh.set_transform(t);
        read_stl(&mut mesh, &path).unwrap();
        assert_eq!(mesh.num_triangles(), 4);
        assert_eq!(mesh.colour(), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(mesh.transform().scale, 3.0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(dir.path().join("absent.stl")).unwrap_err();
        assert!(matches!(err, MeshError::Io(_)));
    }

    #[test]
    fn test_write_rejects_bad_index() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_stl(&fixtures::basic_break(), dir.path().join("bad.stl")).unwrap_err();
        assert!(matches!(err, MeshError::InvalidVertexIndex { face: 4, vertex: 9 }));
    }
}
