//! Structural validity checks.
//!
//! Three levels, each reporting the first [`Violation`] found:
//!
//! - **basic**: indices in range, no collapsed triangles, no duplicate or
//!   dangling vertices;
//! - **manifold**: every edge shared by exactly two oppositely wound
//!   triangles, every vertex surrounded by a single fan;
//! - **connection**: every vertex reachable from vertex 0 along edges.
//!
//! Checks never modify the mesh. Contact through a single shared vertex
//! counts as connected.

use std::collections::VecDeque;

use log::debug;
use thiserror::Error;

use crate::geom::BoundBox;

use super::adjacency::MeshAdjacency;
use super::triangle::{same_edge, EdgeMatch};
use super::trimesh::Mesh;
use super::weld::SpatialHash;

/// The first defect found by a validity check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A triangle references a missing vertex.
    #[error("triangle {face} references out-of-range vertex {vertex}")]
    IndexOutOfBounds {
        /// Triangle index.
        face: usize,
        /// Offending vertex index.
        vertex: usize,
    },

    /// A triangle repeats a vertex index.
    #[error("triangle {face} repeats a vertex")]
    DegenerateTriangle {
        /// Triangle index.
        face: usize,
    },

    /// Two vertices occupy the same position.
    #[error("vertices {first} and {second} coincide")]
    DuplicateVertex {
        /// Earlier vertex.
        first: usize,
        /// Later vertex.
        second: usize,
    },

    /// A vertex is referenced by no triangle.
    #[error("vertex {vertex} is dangling")]
    DanglingVertex {
        /// Vertex index.
        vertex: usize,
    },

    /// An edge borders a single triangle.
    #[error("edge {a}-{b} is a boundary edge")]
    BoundaryEdge {
        /// Lower endpoint.
        a: usize,
        /// Higher endpoint.
        b: usize,
    },

    /// An edge borders three or more triangles.
    #[error("edge {a}-{b} is shared by {faces} triangles")]
    NonManifoldEdge {
        /// Lower endpoint.
        a: usize,
        /// Higher endpoint.
        b: usize,
        /// Number of incident triangles.
        faces: usize,
    },

    /// Both triangles on an edge traverse it in the same direction.
    #[error("edge {a}-{b} is traversed in the same direction by both triangles")]
    InconsistentWinding {
        /// Lower endpoint.
        a: usize,
        /// Higher endpoint.
        b: usize,
    },

    /// The triangles around a vertex form more than one fan.
    #[error("triangles around vertex {vertex} form more than one fan")]
    VertexFanSplit {
        /// Vertex index.
        vertex: usize,
    },

    /// A vertex cannot be reached from vertex 0.
    #[error("vertex {vertex} is not connected to vertex 0")]
    Disconnected {
        /// First unreachable vertex.
        vertex: usize,
    },
}

impl Mesh {
    fn check_bounds(&self) -> Result<(), Violation> {
        let n = self.verts.len();
        for (face, t) in self.tris.iter().enumerate() {
            if let Some(&vertex) = t.v.iter().find(|&&i| i >= n) {
                return Err(Violation::IndexOutOfBounds { face, vertex });
            }
        }
        Ok(())
    }

    fn check_degenerate(&self) -> Result<(), Violation> {
        match self.tris.iter().position(|t| t.is_degenerate()) {
            Some(face) => Err(Violation::DegenerateTriangle { face }),
            None => Ok(()),
        }
    }

    /// Indices in range, no collapsed triangle, no duplicate position within
    /// the weld tolerance, no dangling vertex.
    pub fn check_basic(&self) -> Result<(), Violation> {
        self.check_bounds()?;
        self.check_degenerate()?;

        if let Some(bbox) = BoundBox::from_points(&self.verts) {
            let tolerance = self.config().weld_tolerance;
            let mut hash = SpatialHash::new(&bbox, tolerance, self.verts.len());
            for (i, p) in self.verts.iter().enumerate() {
                if let Some(first) = hash.find(p, tolerance, &self.verts) {
                    return Err(Violation::DuplicateVertex { first, second: i });
                }
                hash.insert(p, i);
            }
        }

        let mut used = vec![false; self.verts.len()];
        for t in &self.tris {
            for &i in &t.v {
                used[i] = true;
            }
        }
        match used.iter().position(|&u| !u) {
            Some(vertex) => Err(Violation::DanglingVertex { vertex }),
            None => Ok(()),
        }
    }

    /// Two-manifold with consistent winding.
    pub fn check_manifold(&self) -> Result<(), Violation> {
        self.check_bounds()?;
        self.check_degenerate()?;
        let adj = MeshAdjacency::build(self.verts.len(), &self.tris);

        for ((a, b), incidences) in adj.edges() {
            match incidences {
                [_] => return Err(Violation::BoundaryEdge { a, b }),
                [(_, e1), (_, e2)] => {
                    if same_edge(e1, e2) != EdgeMatch::Opposite {
                        return Err(Violation::InconsistentWinding { a, b });
                    }
                }
                _ => {
                    return Err(Violation::NonManifoldEdge {
                        a,
                        b,
                        faces: incidences.len(),
                    })
                }
            }
        }

        for vertex in 0..self.verts.len() {
            if !self.single_fan(vertex, adj.faces_for_vertex(vertex)) {
                return Err(Violation::VertexFanSplit { vertex });
            }
        }
        Ok(())
    }

    /// Whether `faces` around `vertex` are connected through edges at `vertex`.
    fn single_fan(&self, vertex: usize, faces: &[usize]) -> bool {
        if faces.len() <= 1 {
            return true;
        }
        let rim = |f: usize| {
            let t = &self.tris[f];
            t.v.into_iter().filter(move |&w| w != vertex)
        };
        let mut reached = vec![false; faces.len()];
        let mut queue = VecDeque::from([0usize]);
        reached[0] = true;
        while let Some(k) = queue.pop_front() {
            for w in rim(faces[k]) {
                for (j, &g) in faces.iter().enumerate() {
                    if !reached[j] && self.tris[g].contains(w) {
                        reached[j] = true;
                        queue.push_back(j);
                    }
                }
            }
        }
        reached.into_iter().all(|r| r)
    }

    /// Every vertex reachable from vertex 0 along triangle edges.
    pub fn check_connection(&self) -> Result<(), Violation> {
        self.check_bounds()?;
        let n = self.verts.len();
        if n == 0 {
            return Ok(());
        }
        let adj = MeshAdjacency::build(n, &self.tris);
        let mut seen = vec![false; n];
        let mut queue = VecDeque::from([0usize]);
        seen[0] = true;
        while let Some(v) = queue.pop_front() {
            for &w in adj.neighbours(v) {
                if !seen[w] {
                    seen[w] = true;
                    queue.push_back(w);
                }
            }
        }
        match seen.iter().position(|&s| !s) {
            Some(vertex) => Err(Violation::Disconnected { vertex }),
            None => Ok(()),
        }
    }

    /// [`check_basic`](Self::check_basic) as a predicate.
    pub fn basic_validity(&self) -> bool {
        report("basic", self.check_basic())
    }

    /// [`check_manifold`](Self::check_manifold) as a predicate.
    pub fn manifold_validity(&self) -> bool {
        report("manifold", self.check_manifold())
    }

    /// [`check_connection`](Self::check_connection) as a predicate.
    pub fn connection_validity(&self) -> bool {
        report("connection", self.check_connection())
    }
}

fn report(check: &str, result: Result<(), Violation>) -> bool {
    match result {
        Ok(()) => true,
        Err(v) => {
            debug!("{} validity failed: {}", check, v);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::fixtures;

    #[test]
    fn test_valid_tet_passes_all() {
        let mesh = fixtures::valid_tet();
        assert_eq!(mesh.check_basic(), Ok(()));
        assert_eq!(mesh.check_manifold(), Ok(()));
        assert_eq!(mesh.check_connection(), Ok(()));
    }

    #[test]
    fn test_unit_cube_passes_all() {
        let mesh = fixtures::unit_cube();
        assert!(mesh.basic_validity());
        assert!(mesh.manifold_validity());
        assert!(mesh.connection_validity());
    }

    #[test]
    fn test_basic_break() {
        let mesh = fixtures::basic_break();
        assert!(matches!(mesh.check_basic(), Err(Violation::IndexOutOfBounds { .. })));
        assert!(!mesh.manifold_validity());
        assert!(!mesh.connection_validity());
    }

    #[test]
    fn test_duplicate_dangling_fixed_by_weld() {
        let mut mesh = fixtures::duplicate_dangling();
        assert_eq!(
            mesh.check_basic(),
            Err(Violation::DuplicateVertex { first: 0, second: 4 })
        );
        mesh.weld().unwrap();
        assert_eq!(mesh.check_basic(), Ok(()));
        assert_eq!(mesh.check_manifold(), Ok(()));
    }

    #[test]
    fn test_unreferenced_duplicate_fixed_by_weld() {
        let mut mesh = fixtures::valid_tet();
        let copy = mesh.vertices()[0];
        mesh.add_vertex(copy);
        assert_eq!(
            mesh.check_basic(),
            Err(Violation::DuplicateVertex { first: 0, second: 4 })
        );
        let report = mesh.weld().unwrap();
        assert_eq!(report.vertices_after, 4);
        assert_eq!(mesh.check_basic(), Ok(()));
        assert_eq!(mesh.check_manifold(), Ok(()));
    }

    #[test]
    fn test_dangling_detected() {
        let mut mesh = fixtures::valid_tet();
        mesh.add_vertex(nalgebra::Point3::new(3.0, 3.0, 3.0));
        assert_eq!(mesh.check_basic(), Err(Violation::DanglingVertex { vertex: 4 }));
        assert_eq!(mesh.check_connection(), Err(Violation::Disconnected { vertex: 4 }));
    }

    #[test]
    fn test_touching_tets() {
        let mesh = fixtures::touch_tets();
        assert!(mesh.basic_validity());
        assert!(mesh.connection_validity());
        assert_eq!(mesh.check_manifold(), Err(Violation::VertexFanSplit { vertex: 0 }));
    }

    #[test]
    fn test_open_tet() {
        let mesh = fixtures::open_tet();
        assert!(matches!(mesh.check_manifold(), Err(Violation::BoundaryEdge { .. })));
        assert!(mesh.connection_validity());
        assert!(mesh.basic_validity());
    }

    #[test]
    fn test_overlap_tet() {
        let mesh = fixtures::overlap_tet();
        assert!(mesh.basic_validity());
        assert!(matches!(
            mesh.check_manifold(),
            Err(Violation::NonManifoldEdge { faces: 4, .. })
        ));
    }

    #[test]
    fn test_flipped_face_breaks_winding() {
        let mut mesh = fixtures::valid_tet();
        mesh.tris[0] = mesh.tris[0].reversed();
        assert!(matches!(
            mesh.check_manifold(),
            Err(Violation::InconsistentWinding { .. })
        ));
    }

    #[test]
    fn test_separate_tets_disconnected() {
        let mut mesh = fixtures::valid_tet();
        let mut other = fixtures::valid_tet();
        other.box_fit(1.0).unwrap();
        for i in 0..other.num_vertices() {
            let p = other.vertices()[i] + nalgebra::Vector3::new(10.0, 0.0, 0.0);
            other.set_position(i, p).unwrap();
        }
        mesh.merge_mesh(&other, false).unwrap();
        assert!(mesh.basic_validity());
        assert!(mesh.manifold_validity());
        assert_eq!(mesh.check_connection(), Err(Violation::Disconnected { vertex: 4 }));
    }

    #[test]
    fn test_empty_mesh() {
        let mesh = Mesh::new();
        assert!(mesh.basic_validity());
        assert!(mesh.manifold_validity());
        assert!(mesh.connection_validity());
    }
}
